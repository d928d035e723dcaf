extern crate log;
pub mod annotation;
pub mod dashboard;
pub mod geofile;
pub mod geometry;
pub mod spatial;
use crate::annotation::primitives::Shape;
use crate::annotation::style::{Color, DrawStyle};
use crate::dashboard::options::MapOptions;
use crate::dashboard::registry::{MapId, MapRegistry, Readiness};
use crate::geofile::geojson::{get_filename_for_map, write_annotations_to_geojson};
use crate::geofile::user_locations::read_user_locations;
use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::{fs::read_to_string, path::Path};

/// Replay map annotations and export them to GeoJSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: String,
}

#[derive(Deserialize, Debug, Clone, Copy)]
struct LatLon {
    latitude: f64,
    longitude: f64,
}

impl From<LatLon> for geo::Point {
    fn from(value: LatLon) -> Self {
        geo::Point::new(value.longitude, value.latitude)
    }
}

/// A step of a draw session, in the order the user performed them.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DrawEvent {
    SetColor { color: Color },
    Marker { position: LatLon },
    Polyline { points: Vec<LatLon> },
    Polygon { points: Vec<LatLon> },
    Rectangle { corners: [LatLon; 2] },
}

impl DrawEvent {
    fn shape(&self) -> Option<Shape> {
        let to_points = |points: &Vec<LatLon>| -> Vec<geo::Point> {
            points.iter().map(|&point| point.into()).collect()
        };
        match self {
            DrawEvent::SetColor { .. } => None,
            DrawEvent::Marker { position } => Some(Shape::Marker((*position).into())),
            DrawEvent::Polyline { points } => {
                Some(Shape::Polyline(to_points(points).into()))
            }
            DrawEvent::Polygon { points } => Some(Shape::polygon(to_points(points))),
            DrawEvent::Rectangle { corners } => {
                Some(Shape::rectangle(corners[0].into(), corners[1].into()))
            }
        }
    }
}

#[derive(Deserialize, Debug)]
struct UserMarkersConfig {
    filepath: PathBuf,
    #[serde(default)]
    property_keys: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct MapConfig {
    title: String,
    center: LatLon,
    #[serde(default)]
    options: MapOptions,
    user_markers: Option<UserMarkersConfig>,
    #[serde(default)]
    events: Vec<DrawEvent>,
}

#[derive(Deserialize, Debug)]
struct Config {
    output_dir: PathBuf,
    /// Fail the map backend instead of creating the output directory.
    #[serde(default)]
    backend_failure: bool,
    maps: Vec<MapConfig>,
}

/// The draw color a user has picked. Owned by the session and handed to every draw.
struct DrawSession {
    style: DrawStyle,
}

fn replay_map(registry: &mut MapRegistry, map_id: &MapId, map_config: &MapConfig) {
    if let Some(user_markers) = &map_config.user_markers {
        match read_user_locations(&user_markers.filepath) {
            Ok(locations) => {
                match registry.add_user_markers(map_id, &locations, &user_markers.property_keys) {
                    Ok(report) if !report.skipped.is_empty() => log::warn!(
                        "Map {}: {} of {} user locations have no valid coordinates",
                        map_id,
                        report.skipped.len(),
                        locations.len()
                    ),
                    Ok(_) => {}
                    // Already logged by the registry.
                    Err(_) => {}
                }
            }
            Err(err) => log::error!("Could not import user markers for map {}: {:#}", map_id, err),
        }
    }

    let mut session = DrawSession {
        style: DrawStyle::new(map_config.options.draw_color),
    };
    for (index, event) in map_config.events.iter().enumerate() {
        if let DrawEvent::SetColor { color } = event {
            log::debug!("Map {} draw color is now {}", map_id, color);
            session.style = DrawStyle::new(*color);
            continue;
        }
        let shape = match event.shape() {
            Some(shape) => shape,
            None => continue,
        };
        match registry.draw(map_id, shape, &session.style) {
            Ok(annotation) => log::info!("Map {}: {}", map_id, annotation.tooltip),
            Err(err) => log::error!("Map {}: draw event {} failed: {:#}", map_id, index, err),
        }
    }
}

fn export_maps(registry: &MapRegistry, output_dir: &Path) -> anyhow::Result<()> {
    for (map_id, entry) in registry.live_maps() {
        let filename = get_filename_for_map(map_id, &entry.center)?;
        write_annotations_to_geojson(entry.controller.annotations(), &output_dir.join(filename))?;
    }
    Ok(())
}

/// Register every configured map and resolve the map backend.
fn register_maps(config: &Config) -> anyhow::Result<MapRegistry> {
    let mut registry = MapRegistry::new();
    for map_config in &config.maps {
        let map_id = registry
            .add_map(
                &map_config.title,
                map_config.center.into(),
                map_config.options.clone(),
            )
            .with_context(|| format!("Registering map '{}'", map_config.title))?;
        log::debug!("Registered map {} '{}'", map_id, map_config.title);
    }
    log::info!("Registered {} maps", registry.map_ids().len());

    // The GeoJSON export directory is the backend every map depends on.
    let backend = if config.backend_failure {
        Err(anyhow!("Map backend disabled by config"))
    } else {
        std::fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("Creating output directory {:?}", config.output_dir))
    };
    registry.resolve_backend(backend)?;
    if let Readiness::Failed(reason) = registry.readiness() {
        log::warn!("No map will be exported, map backend failed: {}", reason);
    }
    Ok(registry)
}

fn try_main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();

    let args = Args::try_parse()?;
    if !Path::new(&args.config_filepath).exists() {
        return Err(anyhow!("Config file {} not found", &args.config_filepath));
    }
    let config_contents = read_to_string(args.config_filepath)?;
    let config: Config = serde_yaml::from_str(&config_contents)?;

    let mut registry = register_maps(&config)?;
    let map_ids = registry.map_ids().to_vec();
    for (map_id, map_config) in map_ids.iter().zip(&config.maps) {
        replay_map(&mut registry, map_id, map_config);
    }
    export_maps(&registry, &config.output_dir)
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
