use anyhow::anyhow;

use crate::{
    geometry::measure::{geodesic_area, measure, perimeter, polyline_length, Measurement},
    spatial::membership::{MarkerIndex, MembershipQuery},
};

use super::{
    primitives::{AttributeMap, MarkerRecord, Shape, ShapeKind},
    style::{Color, DrawStyle, MarkerIcon},
    tooltip::Tooltip,
    user_location::UserLocation,
};

/// Padding in pixels kept around the markers when the viewport is fitted to them.
pub const FIT_PADDING: [u32; 2] = [20, 20];

/// Draw state of one map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    /// Nothing drawn yet.
    Idle,
    /// A draw interaction for the given kind of shape is in progress.
    Drawing(ShapeKind),
    /// At least one shape has been drawn, ready for the next draw.
    Annotated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Viewport {
    CenterZoom { center: geo::Point, zoom: u8 },
    FitBounds { bounds: geo::Rect, padding: [u32; 2] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationSource {
    Drawn,
    UserMarker,
}

/// A shape on the map together with what is displayed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub shape: Shape,
    pub source: AnnotationSource,
    pub tooltip: Tooltip,
    /// Draw color, `None` for imported markers.
    pub color: Option<Color>,
    /// Icon of hand drawn markers.
    pub icon: Option<MarkerIcon>,
    /// Attributes of imported markers.
    pub attributes: AttributeMap,
}

impl Annotation {
    pub fn measurement(&self) -> Option<Measurement> {
        measure(&self.shape)
    }
}

/// A user location that could not be turned into a marker.
#[derive(Debug)]
pub struct SkippedLocation {
    /// Position of the location in the imported batch.
    pub index: usize,
    pub reason: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct AddMarkersReport {
    pub added: usize,
    pub skipped: Vec<SkippedLocation>,
}

/// Owns the drawn shapes and imported markers of one map.
pub struct MapAnnotationController {
    state: DrawState,
    annotations: Vec<Annotation>,
    markers: MarkerIndex,
    viewport: Viewport,
}

impl MapAnnotationController {
    pub fn new(center: geo::Point, zoom: u8) -> Self {
        Self {
            state: DrawState::Idle,
            annotations: Vec::new(),
            markers: MarkerIndex::new(),
            viewport: Viewport::CenterZoom { center, zoom },
        }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    /// All shapes, in creation order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Imported and hand drawn markers, in creation order.
    pub fn markers(&self) -> &[MarkerRecord] {
        self.markers.markers()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// State to return to when no draw interaction is in progress.
    fn resting_state(&self) -> DrawState {
        if self.annotations.iter().any(|a| a.source == AnnotationSource::Drawn) {
            DrawState::Annotated
        } else {
            DrawState::Idle
        }
    }

    /// Begin drawing a shape. Replaces a draw interaction that is still in progress.
    pub fn start_drawing(&mut self, kind: ShapeKind) {
        if let DrawState::Drawing(pending) = self.state {
            log::debug!("Abandoning {} draw to start a {}", pending, kind);
        }
        self.state = DrawState::Drawing(kind);
    }

    pub fn cancel_drawing(&mut self) {
        self.state = self.resting_state();
    }

    /// Finish the draw interaction in progress with the drawn `shape`.
    ///
    /// The shape gets its tooltip and, for markers, an icon in the color of `style`. Polygons
    /// and rectangles report the imported markers within their bounding box. On error the state
    /// is left unchanged.
    pub fn complete_drawing(
        &mut self,
        shape: Shape,
        style: &DrawStyle,
    ) -> anyhow::Result<&Annotation> {
        let kind = match self.state {
            DrawState::Drawing(kind) => kind,
            _ => return Err(anyhow!("No draw interaction in progress")),
        };
        if shape.kind() != kind {
            return Err(anyhow!("Started drawing a {} but got a {}", kind, shape.kind()));
        }
        shape.validate()?;

        let color = style.color;
        let (tooltip, icon) = match &shape {
            Shape::Marker(position) => (
                Tooltip::for_point(position, color),
                Some(MarkerIcon::for_color(color)),
            ),
            Shape::Polyline(line) => (Tooltip::for_polyline(polyline_length(line), color), None),
            Shape::Polygon(polygon) | Shape::Rectangle(polygon) => {
                let ring = polygon.exterior();
                let markers_inside = self.markers.markers_inside(polygon);
                log::debug!(
                    "{} contains {} user markers",
                    kind,
                    markers_inside.len()
                );
                (
                    Tooltip::for_area(geodesic_area(ring), perimeter(ring), &markers_inside, color),
                    None,
                )
            }
        };
        if let Shape::Marker(position) = &shape {
            self.markers.insert(MarkerRecord::hand_drawn(*position));
        }

        self.annotations.push(Annotation {
            shape,
            source: AnnotationSource::Drawn,
            tooltip,
            color: Some(color),
            icon,
            attributes: AttributeMap::new(),
        });
        self.state = DrawState::Annotated;
        self.annotations
            .last()
            .ok_or_else(|| anyhow!("Annotation was not stored"))
    }

    /// Import markers from external locations.
    ///
    /// Each marker keeps the `property_keys` present on its location, in the requested order, and
    /// lists them in its tooltip. Locations without valid coordinates are skipped and reported,
    /// the rest of the batch is still imported. Afterwards the viewport is fitted to all markers.
    pub fn add_user_markers(
        &mut self,
        locations: &[UserLocation],
        property_keys: &[String],
    ) -> AddMarkersReport {
        let mut report = AddMarkersReport::default();
        for (index, location) in locations.iter().enumerate() {
            let position = match location.position() {
                Ok(position) => position,
                Err(reason) => {
                    log::error!(
                        "Invalid coordinates for user location {}: {}",
                        index,
                        reason
                    );
                    report.skipped.push(SkippedLocation { index, reason });
                    continue;
                }
            };
            let attributes = location.select(property_keys);
            self.annotations.push(Annotation {
                shape: Shape::Marker(position),
                source: AnnotationSource::UserMarker,
                tooltip: Tooltip::for_user_marker(&attributes),
                color: None,
                icon: None,
                attributes: attributes.clone(),
            });
            self.markers
                .insert(MarkerRecord::user_supplied(position, attributes));
            report.added += 1;
        }

        if let Some(bounds) = self.markers.bounds() {
            self.viewport = Viewport::FitBounds {
                bounds,
                padding: FIT_PADDING,
            };
        }
        report
    }
}
