use std::collections::HashMap;

use anyhow::anyhow;

use crate::annotation::{
    controller::{AddMarkersReport, Annotation, MapAnnotationController},
    primitives::Shape,
    style::DrawStyle,
    user_location::UserLocation,
};

use super::options::MapOptions;

/// Identifier of a map within a dashboard, `map-0`, `map-1`, ... in registration order.
pub type MapId = String;

/// One-shot readiness of the map backend. Starts pending and is resolved exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

/// A map that is live on the dashboard.
pub struct MapEntry {
    pub title: String,
    pub center: geo::Point,
    pub options: MapOptions,
    pub controller: MapAnnotationController,
}

impl MapEntry {
    fn new(title: String, center: geo::Point, options: MapOptions) -> Self {
        let controller = MapAnnotationController::new(center, options.zoom);
        Self {
            title,
            center,
            options,
            controller,
        }
    }
}

enum MapSlot {
    /// Registered before the backend was ready.
    Pending {
        title: String,
        center: geo::Point,
        options: MapOptions,
    },
    Live(MapEntry),
    /// The backend failed, the map never initialised.
    Unavailable { title: String },
}

/// All maps of a dashboard, keyed by map id.
pub struct MapRegistry {
    readiness: Readiness,
    maps: HashMap<MapId, MapSlot>,
    map_ids: Vec<MapId>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self {
            readiness: Readiness::Pending,
            maps: HashMap::new(),
            map_ids: Vec::new(),
        }
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Register a map. It initialises right away when the backend is ready, otherwise as soon as
    /// the backend readiness resolves.
    pub fn add_map(
        &mut self,
        title: &str,
        center: geo::Point,
        options: MapOptions,
    ) -> anyhow::Result<MapId> {
        options.validate()?;
        let map_id = format!("map-{}", self.map_ids.len());
        let title = title.to_string();
        let slot = match &self.readiness {
            Readiness::Ready => {
                log::info!("Initialising map {} '{}'", map_id, title);
                MapSlot::Live(MapEntry::new(title, center, options))
            }
            Readiness::Pending => {
                log::debug!("Map {} waits for the map backend", map_id);
                MapSlot::Pending {
                    title,
                    center,
                    options,
                }
            }
            Readiness::Failed(reason) => {
                log::error!("Map {} is unavailable, map backend failed: {}", map_id, reason);
                MapSlot::Unavailable { title }
            }
        };
        self.maps.insert(map_id.clone(), slot);
        self.map_ids.push(map_id.clone());
        Ok(map_id)
    }

    /// Resolve the backend readiness. Pending maps initialise on success and become unavailable on
    /// failure. Readiness resolves only once, there is no retry.
    pub fn resolve_backend(&mut self, result: anyhow::Result<()>) -> anyhow::Result<()> {
        if self.readiness != Readiness::Pending {
            return Err(anyhow!(
                "Map backend readiness already resolved to {:?}",
                self.readiness
            ));
        }
        self.readiness = match result {
            Ok(()) => Readiness::Ready,
            Err(err) => {
                log::error!("Map backend failed to load: {:#}", err);
                Readiness::Failed(format!("{:#}", err))
            }
        };

        let ready = self.readiness == Readiness::Ready;
        for map_id in &self.map_ids {
            let slot = match self.maps.remove(map_id) {
                Some(slot) => slot,
                None => continue,
            };
            let slot = match slot {
                MapSlot::Pending {
                    title,
                    center,
                    options,
                } => {
                    if ready {
                        log::info!("Initialising map {} '{}'", map_id, title);
                        MapSlot::Live(MapEntry::new(title, center, options))
                    } else {
                        MapSlot::Unavailable { title }
                    }
                }
                other => other,
            };
            self.maps.insert(map_id.clone(), slot);
        }
        Ok(())
    }

    /// Ids of all registered maps, in registration order.
    pub fn map_ids(&self) -> &[MapId] {
        &self.map_ids
    }

    /// Live maps in registration order.
    pub fn live_maps(&self) -> impl Iterator<Item = (&MapId, &MapEntry)> {
        self.map_ids
            .iter()
            .filter_map(|map_id| match self.maps.get(map_id) {
                Some(MapSlot::Live(entry)) => Some((map_id, entry)),
                _ => None,
            })
    }

    pub fn map(&self, map_id: &str) -> anyhow::Result<&MapEntry> {
        match self.maps.get(map_id) {
            Some(MapSlot::Live(entry)) => Ok(entry),
            Some(MapSlot::Pending { .. }) => {
                Err(anyhow!("Map {} is not initialised yet", map_id))
            }
            Some(MapSlot::Unavailable { title }) => {
                Err(anyhow!("Map {} '{}' is unavailable", map_id, title))
            }
            None => Err(anyhow!("No map found with id '{}'", map_id)),
        }
    }

    pub fn map_mut(&mut self, map_id: &str) -> anyhow::Result<&mut MapEntry> {
        match self.maps.get_mut(map_id) {
            Some(MapSlot::Live(entry)) => Ok(entry),
            Some(MapSlot::Pending { .. }) => {
                Err(anyhow!("Map {} is not initialised yet", map_id))
            }
            Some(MapSlot::Unavailable { title }) => {
                Err(anyhow!("Map {} '{}' is unavailable", map_id, title))
            }
            None => Err(anyhow!("No map found with id '{}'", map_id)),
        }
    }

    fn logged_map_mut(&mut self, map_id: &str) -> anyhow::Result<&mut MapEntry> {
        self.map_mut(map_id).map_err(|err| {
            log::error!("{}", err);
            err
        })
    }

    /// Import user markers into the map `map_id`.
    pub fn add_user_markers(
        &mut self,
        map_id: &str,
        locations: &[UserLocation],
        property_keys: &[String],
    ) -> anyhow::Result<AddMarkersReport> {
        let entry = self.logged_map_mut(map_id)?;
        let report = entry.controller.add_user_markers(locations, property_keys);
        log::info!(
            "Added {} user markers to map {}, skipped {}",
            report.added,
            map_id,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Run a complete draw interaction producing `shape` on the map `map_id`.
    pub fn draw(
        &mut self,
        map_id: &str,
        shape: Shape,
        style: &DrawStyle,
    ) -> anyhow::Result<&Annotation> {
        let entry = self.logged_map_mut(map_id)?;
        entry.controller.start_drawing(shape.kind());
        if let Err(err) = entry.controller.complete_drawing(shape, style) {
            entry.controller.cancel_drawing();
            return Err(err);
        }
        entry
            .controller
            .annotations()
            .last()
            .ok_or_else(|| anyhow!("Map {} has no annotations after drawing", map_id))
    }
}

impl Default for MapRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use crate::{
        annotation::{primitives::Shape, style::DrawStyle, user_location::UserLocation},
        dashboard::options::MapOptions,
    };

    use super::{MapRegistry, Readiness};

    fn paris() -> geo::Point {
        geo::Point::new(2.35, 48.85)
    }

    #[test]
    fn test_map_ids_are_sequential() {
        let mut registry = MapRegistry::new();
        let first = registry.add_map("first", paris(), MapOptions::default()).unwrap();
        let second = registry.add_map("second", paris(), MapOptions::default()).unwrap();
        assert_eq!(first, "map-0");
        assert_eq!(second, "map-1");
        assert_eq!(registry.map_ids(), &["map-0".to_string(), "map-1".to_string()]);
    }

    #[test]
    fn test_maps_wait_for_backend() {
        let mut registry = MapRegistry::new();
        let map_id = registry.add_map("pending", paris(), MapOptions::default()).unwrap();
        assert!(registry.map(&map_id).is_err());
        assert_eq!(registry.live_maps().count(), 0);

        registry.resolve_backend(Ok(())).unwrap();
        assert_eq!(*registry.readiness(), Readiness::Ready);
        assert_eq!(registry.map(&map_id).unwrap().title, "pending");

        let late = registry.add_map("late", paris(), MapOptions::default()).unwrap();
        assert!(registry.map(&late).is_ok());
        assert_eq!(registry.live_maps().count(), 2);
    }

    #[test]
    fn test_backend_failure_makes_maps_unavailable() {
        let mut registry = MapRegistry::new();
        let map_id = registry.add_map("doomed", paris(), MapOptions::default()).unwrap();
        registry
            .resolve_backend(Err(anyhow!("tiles unreachable")))
            .unwrap();
        assert_eq!(
            *registry.readiness(),
            Readiness::Failed("tiles unreachable".to_string())
        );
        assert!(registry.map(&map_id).is_err());
        let late = registry.add_map("late", paris(), MapOptions::default()).unwrap();
        assert!(registry
            .draw(&late, Shape::Marker(paris()), &DrawStyle::default())
            .is_err());
    }

    #[test]
    fn test_backend_resolves_once() {
        let mut registry = MapRegistry::new();
        registry.resolve_backend(Ok(())).unwrap();
        assert!(registry.resolve_backend(Ok(())).is_err());
        assert!(registry.resolve_backend(Err(anyhow!("late failure"))).is_err());
        assert_eq!(*registry.readiness(), Readiness::Ready);
    }

    #[test]
    fn test_unknown_map_id_aborts_only_that_call() {
        let mut registry = MapRegistry::new();
        registry.resolve_backend(Ok(())).unwrap();
        let map_id = registry.add_map("known", paris(), MapOptions::default()).unwrap();

        assert!(registry
            .add_user_markers("map-42", &[UserLocation::new(1.0, 1.0)], &[])
            .is_err());
        let report = registry
            .add_user_markers(&map_id, &[UserLocation::new(1.0, 1.0)], &[])
            .unwrap();
        assert_eq!(report.added, 1);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let mut registry = MapRegistry::new();
        let options = MapOptions {
            base_maps: vec!["Nowhere".to_string()],
            ..MapOptions::default()
        };
        assert!(registry.add_map("bad", paris(), options).is_err());
        assert!(registry.map_ids().is_empty());
    }

    #[test]
    fn test_failed_draw_leaves_map_ready_for_next_draw() {
        let mut registry = MapRegistry::new();
        registry.resolve_backend(Ok(())).unwrap();
        let map_id = registry.add_map("map", paris(), MapOptions::default()).unwrap();

        let degenerate = Shape::Polyline(vec![(0.0, 0.0)].into());
        assert!(registry
            .draw(&map_id, degenerate, &DrawStyle::default())
            .is_err());
        registry
            .draw(&map_id, Shape::Marker(paris()), &DrawStyle::default())
            .unwrap();
        assert_eq!(
            registry.map(&map_id).unwrap().controller.annotations().len(),
            1
        );
    }
}
