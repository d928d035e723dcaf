use std::{fs, path::Path};

use anyhow::{anyhow, Context};

use crate::annotation::user_location::UserLocation;

use super::geojson::read_user_locations_from_geojson;

/// Read user locations from a YAML list of mappings (`.yaml`, `.yml`) or a GeoJSON
/// FeatureCollection (`.geojson`, `.json`).
pub fn read_user_locations(filepath: &Path) -> anyhow::Result<Vec<UserLocation>> {
    let contents = fs::read_to_string(filepath)
        .with_context(|| format!("Reading user locations from {:?}", filepath))?;
    let extension = filepath
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());
    let locations = match extension.as_deref() {
        Some("yaml") | Some("yml") => read_user_locations_from_yaml(&contents)?,
        Some("geojson") | Some("json") => read_user_locations_from_geojson(&contents)?,
        _ => {
            return Err(anyhow!(
                "Cannot read user locations from {:?}, expected a YAML or GeoJSON file",
                filepath
            ))
        }
    };
    log::info!("Read {} user locations from {:?}", locations.len(), filepath);
    Ok(locations)
}

/// Records that are not mappings become empty locations so that they are reported with their
/// position in the batch.
pub fn read_user_locations_from_yaml(contents: &str) -> anyhow::Result<Vec<UserLocation>> {
    let records: Vec<serde_yaml::Value> = serde_yaml::from_str(contents)?;
    Ok(records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            UserLocation::try_from(record).unwrap_or_else(|err| {
                log::warn!("User location {}: {}", index, err);
                UserLocation::default()
            })
        })
        .collect())
}
