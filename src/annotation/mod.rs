pub mod controller;
pub mod primitives;
pub mod style;
pub mod tooltip;
pub mod user_location;
