use anyhow::anyhow;
use serde::Deserialize;

use crate::annotation::style::Color;

/// A base map layer the map backend can display.
#[derive(Debug, PartialEq, Eq)]
pub struct TileSource {
    pub name: &'static str,
    pub url_template: &'static str,
    pub max_zoom: u8,
    pub attribution: &'static str,
}

pub const TILE_SOURCES: [TileSource; 3] = [
    TileSource {
        name: "OpenStreetMap",
        url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        max_zoom: 19,
        attribution: "© OpenStreetMap contributors",
    },
    TileSource {
        name: "Satellite",
        url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
        max_zoom: 17,
        attribution: "© OpenTopoMap contributors",
    },
    TileSource {
        name: "CartoDB Dark",
        url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
        max_zoom: 19,
        attribution: "© CartoDB contributors",
    },
];

pub fn tile_source(name: &str) -> Option<&'static TileSource> {
    TILE_SOURCES.iter().find(|source| source.name == name)
}

fn default_zoom() -> u8 {
    13
}

fn default_base_maps() -> Vec<String> {
    vec!["OpenStreetMap".to_string(), "Satellite".to_string()]
}

/// Per-map options. Missing fields take the dashboard defaults.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MapOptions {
    pub zoom: u8,
    /// Initial draw color of the map's draw sessions.
    pub draw_color: Color,
    /// Base maps offered in the layer switcher. The first one is shown initially.
    pub base_maps: Vec<String>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            draw_color: Color::default(),
            base_maps: default_base_maps(),
        }
    }
}

impl MapOptions {
    /// Tile sources of the configured base maps, in configured order.
    pub fn tile_sources(&self) -> anyhow::Result<Vec<&'static TileSource>> {
        self.base_maps
            .iter()
            .map(|name| tile_source(name).ok_or_else(|| anyhow!("Unknown base map '{}'", name)))
            .collect()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let sources = self.tile_sources()?;
        let active = sources
            .first()
            .ok_or_else(|| anyhow!("At least one base map is required"))?;
        if self.zoom > active.max_zoom {
            return Err(anyhow!(
                "Zoom {} exceeds the maximum zoom {} of base map '{}'",
                self.zoom,
                active.max_zoom,
                active.name
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::annotation::style::Color;

    use super::{tile_source, MapOptions};

    #[test]
    fn test_defaults() {
        let options = MapOptions::default();
        assert_eq!(options.zoom, 13);
        assert_eq!(options.draw_color, Color::new(0xFF, 0, 0));
        let names: Vec<&str> = options
            .tile_sources()
            .unwrap()
            .iter()
            .map(|source| source.name)
            .collect();
        assert_eq!(names, vec!["OpenStreetMap", "Satellite"]);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_takes_defaults() {
        let options: MapOptions = serde_yaml::from_str("draw_color: '#00FF00'").unwrap();
        assert_eq!(options.zoom, 13);
        assert_eq!(options.draw_color, Color::new(0, 0xFF, 0));
        assert_eq!(options.base_maps.len(), 2);
    }

    #[rstest]
    #[case(MapOptions { base_maps: vec!["Mars".to_string()], ..MapOptions::default() })]
    #[case(MapOptions { base_maps: vec![], ..MapOptions::default() })]
    #[case(MapOptions { zoom: 18, base_maps: vec!["Satellite".to_string()], ..MapOptions::default() })]
    fn test_invalid_options(#[case] options: MapOptions) {
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_tile_source_lookup() {
        assert_eq!(tile_source("CartoDB Dark").unwrap().max_zoom, 19);
        assert!(tile_source("openstreetmap").is_none());
    }
}
