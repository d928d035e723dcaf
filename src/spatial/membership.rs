use geo::BoundingRect;

use crate::annotation::primitives::MarkerRecord;

type IndexedMarker = rstar::primitives::GeomWithData<[f64; 2], usize>;

/// Whether `point` lies within `rect`, boundary included.
fn rect_contains(rect: &geo::Rect, point: &geo::Point) -> bool {
    rect.min().x <= point.x()
        && point.x() <= rect.max().x
        && rect.min().y <= point.y()
        && point.y() <= rect.max().y
}

/// Return the user supplied markers among `candidates` whose position lies within the bounding box
/// of `polygon`.
///
/// Containment is tested against the axis-aligned bounding box, not the polygon itself, so a
/// marker in the corner of a triangle's box counts as inside. Hand drawn markers are never
/// returned. The result keeps the relative order of `candidates`.
pub fn markers_inside<'a>(
    polygon: &geo::Polygon,
    candidates: &'a [MarkerRecord],
) -> Vec<&'a MarkerRecord> {
    let bounds = match polygon.bounding_rect() {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };
    candidates
        .iter()
        .filter(|marker| marker.is_user_supplied() && rect_contains(&bounds, &marker.position))
        .collect()
}

/// A collection of marker records that can answer membership queries.
pub trait MembershipQuery {
    fn from_markers(markers: Vec<MarkerRecord>) -> Self;

    fn insert(&mut self, marker: MarkerRecord);

    /// Markers in insertion order.
    fn markers(&self) -> &[MarkerRecord];

    /// Same contract as [`markers_inside`], over the markers of this collection.
    fn markers_inside(&self, polygon: &geo::Polygon) -> Vec<&MarkerRecord>;
}

/// Answers membership queries by checking every marker.
#[derive(Debug, Default)]
pub struct LinearScan {
    markers: Vec<MarkerRecord>,
}

impl MembershipQuery for LinearScan {
    fn from_markers(markers: Vec<MarkerRecord>) -> Self {
        Self { markers }
    }

    fn insert(&mut self, marker: MarkerRecord) {
        self.markers.push(marker);
    }

    fn markers(&self) -> &[MarkerRecord] {
        &self.markers
    }

    fn markers_inside(&self, polygon: &geo::Polygon) -> Vec<&MarkerRecord> {
        markers_inside(polygon, &self.markers)
    }
}

/// Marker records with an R-tree over their positions. Each tree entry carries the position of
/// its record in `markers`, which restores insertion order after a query.
pub struct MarkerIndex {
    markers: Vec<MarkerRecord>,
    rtree: rstar::RTree<IndexedMarker>,
}

impl MarkerIndex {
    pub fn new() -> Self {
        Self {
            markers: Vec::new(),
            rtree: rstar::RTree::new(),
        }
    }

    /// Bounding box of all marker positions, user supplied and hand drawn alike.
    pub fn bounds(&self) -> Option<geo::Rect> {
        let positions: geo::MultiPoint = self.markers.iter().map(|marker| marker.position).collect();
        positions.bounding_rect()
    }
}

impl Default for MarkerIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipQuery for MarkerIndex {
    fn from_markers(markers: Vec<MarkerRecord>) -> Self {
        let entries: Vec<IndexedMarker> = markers
            .iter()
            .enumerate()
            .map(|(index, marker)| {
                IndexedMarker::new([marker.position.x(), marker.position.y()], index)
            })
            .collect();
        Self {
            markers,
            rtree: rstar::RTree::bulk_load(entries),
        }
    }

    fn insert(&mut self, marker: MarkerRecord) {
        let entry = IndexedMarker::new(
            [marker.position.x(), marker.position.y()],
            self.markers.len(),
        );
        self.rtree.insert(entry);
        self.markers.push(marker);
    }

    fn markers(&self) -> &[MarkerRecord] {
        &self.markers
    }

    fn markers_inside(&self, polygon: &geo::Polygon) -> Vec<&MarkerRecord> {
        let bounds = match polygon.bounding_rect() {
            Some(bounds) => bounds,
            None => return Vec::new(),
        };
        let envelope = rstar::AABB::from_corners(
            [bounds.min().x, bounds.min().y],
            [bounds.max().x, bounds.max().y],
        );
        let mut indices: Vec<usize> = self
            .rtree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .filter(|index| self.markers[*index].is_user_supplied())
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|index| &self.markers[index]).collect()
    }
}


#[cfg(test)]
#[generic_tests::define]
mod tests {
    use crate::annotation::primitives::MarkerRecord;

    use super::{
        fixtures::{names, unit_square, user_marker},
        markers_inside, LinearScan, MarkerIndex, MembershipQuery,
    };

    #[test]
    fn test_single_marker_inside_square<Q: MembershipQuery>() {
        let query = Q::from_markers(vec![user_marker(0.5, 0.5, "center")]);
        let inside = query.markers_inside(&unit_square());
        assert_eq!(inside.len(), 1);
        assert_eq!(*inside[0], user_marker(0.5, 0.5, "center"));
    }

    #[test]
    fn test_result_keeps_input_order<Q: MembershipQuery>() {
        let query = Q::from_markers(vec![
            user_marker(0.9, 0.9, "A"),
            user_marker(5.0, 5.0, "B"),
            user_marker(0.1, 0.1, "C"),
        ]);
        assert_eq!(names(&query.markers_inside(&unit_square())), vec!["A", "C"]);
    }

    #[test]
    fn test_hand_drawn_markers_are_excluded<Q: MembershipQuery>() {
        let mut query = Q::from_markers(vec![MarkerRecord::hand_drawn(geo::Point::new(0.5, 0.5))]);
        query.insert(user_marker(0.25, 0.75, "imported"));
        query.insert(MarkerRecord::hand_drawn(geo::Point::new(0.3, 0.3)));
        let inside = query.markers_inside(&unit_square());
        assert_eq!(names(&inside), vec!["imported"]);
        assert!(inside.iter().all(|marker| marker.is_user_supplied()));
    }

    #[test]
    fn test_boundary_counts_as_inside<Q: MembershipQuery>() {
        let query = Q::from_markers(vec![
            user_marker(0.0, 0.0, "corner"),
            user_marker(1.0, 0.5, "edge"),
            user_marker(1.0000001, 0.5, "outside"),
        ]);
        assert_eq!(
            names(&query.markers_inside(&unit_square())),
            vec!["corner", "edge"]
        );
    }

    #[test]
    fn test_uses_bounding_box_not_exact_polygon<Q: MembershipQuery>() {
        // (0.9, 0.9) is outside the triangle but inside its bounding box.
        let triangle = geo::Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)].into(), vec![]);
        let query = Q::from_markers(vec![user_marker(0.9, 0.9, "corner of box")]);
        assert_eq!(query.markers_inside(&triangle).len(), 1);
    }

    #[test]
    fn test_empty_polygon_contains_nothing<Q: MembershipQuery>() {
        let empty = geo::Polygon::new(geo::LineString::new(vec![]), vec![]);
        let query = Q::from_markers(vec![user_marker(0.0, 0.0, "origin")]);
        assert!(query.markers_inside(&empty).is_empty());
    }

    #[test]
    fn test_agrees_with_free_function<Q: MembershipQuery>() {
        let markers: Vec<MarkerRecord> = (0..50)
            .map(|i| {
                let lon = (i as f64 * 0.37) % 3.0 - 1.0;
                let lat = (i as f64 * 0.61) % 3.0 - 1.0;
                if i % 7 == 0 {
                    MarkerRecord::hand_drawn(geo::Point::new(lon, lat))
                } else {
                    user_marker(lon, lat, &i.to_string())
                }
            })
            .collect();
        let query = Q::from_markers(markers.clone());
        assert_eq!(
            query.markers_inside(&unit_square()),
            markers_inside(&unit_square(), &markers)
        );
    }

    #[instantiate_tests(<LinearScan>)]
    mod linear_scan {}

    #[instantiate_tests(<MarkerIndex>)]
    mod marker_index {}
}
