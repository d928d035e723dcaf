pub mod feature;
pub mod geojson;
pub mod user_locations;
