use std::{fs, path::Path};

use anyhow::{anyhow, Context};
use geohash::{encode, Coord};
use rayon::prelude::*;

use crate::annotation::{
    controller::Annotation,
    primitives::AttributeValue,
    user_location::{UserLocation, LATITUDE_KEY, LONGITUDE_KEY},
};

use super::feature::Feature;

/// Name of the GeoJSON file a map is exported to, `<map id>_<geohash of center>.geojson`.
pub fn get_filename_for_map(map_id: &str, center: &geo::Point) -> anyhow::Result<String> {
    const GEOHASH_LENGTH: usize = 8;
    let center_coord = Coord {
        x: center.x(),
        y: center.y(),
    };
    let center_geohash = encode(center_coord, GEOHASH_LENGTH)?;
    Ok(format!("{map_id}_{center_geohash}.geojson"))
}

pub fn write_annotations_to_geojson(
    annotations: &[Annotation],
    output_filepath: &Path,
) -> anyhow::Result<()> {
    let features: Vec<Feature> = annotations.par_iter().map(Feature::from).collect();
    let feature_collection: geojson::FeatureCollection = features
        .into_iter()
        .map(geojson::Feature::from)
        .collect();
    let geojson_contents = geojson::GeoJson::from(feature_collection);
    log::info!(
        "Writing {} annotations to {:?}",
        annotations.len(),
        output_filepath
    );
    fs::write(output_filepath, geojson_contents.to_string())
        .with_context(|| format!("Writing GeoJSON to {:?}", output_filepath))
}

/// Read user locations from a GeoJSON FeatureCollection. Point geometries give the coordinates,
/// feature properties the attributes. Features without a point geometry become locations
/// without coordinates.
pub fn read_user_locations_from_geojson(contents: &str) -> anyhow::Result<Vec<UserLocation>> {
    let geojson: geojson::GeoJson = contents.parse()?;
    let collection = match geojson {
        geojson::GeoJson::FeatureCollection(collection) => collection,
        _ => return Err(anyhow!("Expected a GeoJSON FeatureCollection of user locations")),
    };
    Ok(collection
        .features
        .iter()
        .map(feature_to_user_location)
        .collect())
}

fn feature_to_user_location(feature: &geojson::Feature) -> UserLocation {
    let mut location = UserLocation::default();
    if let Some(properties) = &feature.properties {
        for (key, value) in properties {
            location = location.with(key, AttributeValue::from(value));
        }
    }
    match feature.geometry.as_ref().map(|geometry| &geometry.value) {
        Some(geojson::Value::Point(coords)) if coords.len() >= 2 => location
            .with(LONGITUDE_KEY, coords[0].into())
            .with(LATITUDE_KEY, coords[1].into()),
        Some(_) => {
            log::warn!("Ignoring user location geometry that is not a point");
            location
        }
        None => location,
    }
}
