use std::fmt;

use anyhow::anyhow;
use serde::Deserialize;

/// The kinds of shape the draw tool produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Marker,
    Polyline,
    Polygon,
    Rectangle,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Marker => "marker",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geometry of a drawn shape. Coordinates are WGS84 with x = longitude and y = latitude.
///
/// Polygon and rectangle rings are closed, `geo::Polygon` closes the exterior on construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Marker(geo::Point),
    Polyline(geo::LineString),
    Polygon(geo::Polygon),
    Rectangle(geo::Polygon),
}

impl Shape {
    /// Rectangle spanned by two opposite corners.
    pub fn rectangle(corner_1: geo::Point, corner_2: geo::Point) -> Self {
        Shape::Rectangle(geo::Rect::new(corner_1, corner_2).to_polygon())
    }

    /// Polygon from an implicitly closed ring of points.
    pub fn polygon(ring: Vec<geo::Point>) -> Self {
        Shape::Polygon(geo::Polygon::new(ring.into(), vec![]))
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Marker(_) => ShapeKind::Marker,
            Shape::Polyline(_) => ShapeKind::Polyline,
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
        }
    }

    pub fn to_geometry(&self) -> geo::Geometry {
        match self {
            Shape::Marker(point) => geo::Geometry::Point(*point),
            Shape::Polyline(line) => geo::Geometry::LineString(line.clone()),
            Shape::Polygon(polygon) | Shape::Rectangle(polygon) => {
                geo::Geometry::Polygon(polygon.clone())
            }
        }
    }

    /// Check that the geometry is something the draw tool could have produced.
    pub fn validate(&self) -> anyhow::Result<()> {
        let (coords, min_points): (Vec<geo::Coord>, usize) = match self {
            Shape::Marker(point) => (vec![point.0], 1),
            Shape::Polyline(line) => (line.0.clone(), 2),
            Shape::Polygon(polygon) | Shape::Rectangle(polygon) => {
                // The closing coordinate repeats the first one.
                let ring = &polygon.exterior().0;
                (ring[..ring.len().saturating_sub(1)].to_vec(), 3)
            }
        };
        if coords.len() < min_points {
            return Err(anyhow!(
                "A {} needs at least {} points, got {}",
                self.kind(),
                min_points,
                coords.len()
            ));
        }
        if let Some(coord) = coords
            .iter()
            .find(|coord| !coord.x.is_finite() || !coord.y.is_finite())
        {
            return Err(anyhow!(
                "A {} has a non-finite coordinate {:?}",
                self.kind(),
                coord
            ));
        }
        Ok(())
    }
}

/// Display value of a marker attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl AttributeValue {
    /// Numeric value, parsing text such as `" 45.76 "` as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(number) => Some(*number),
            AttributeValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(text) => f.write_str(text),
            AttributeValue::Number(number) => write!(f, "{}", number),
            AttributeValue::Bool(value) => write!(f, "{}", value),
            AttributeValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<&serde_yaml::Value> for AttributeValue {
    fn from(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(value) => AttributeValue::Bool(*value),
            Value::Number(number) => match number.as_f64() {
                Some(number) => AttributeValue::Number(number),
                None => AttributeValue::Text(number.to_string()),
            },
            Value::String(text) => AttributeValue::Text(text.clone()),
            Value::Tagged(tagged) => AttributeValue::from(&tagged.value),
            Value::Sequence(_) | Value::Mapping(_) => AttributeValue::Text(
                serde_yaml::to_string(value)
                    .map(|text| text.trim_end().to_string())
                    .unwrap_or_default(),
            ),
        }
    }
}

impl From<&geojson::JsonValue> for AttributeValue {
    fn from(value: &geojson::JsonValue) -> Self {
        use geojson::JsonValue;
        match value {
            JsonValue::Null => AttributeValue::Null,
            JsonValue::Bool(value) => AttributeValue::Bool(*value),
            JsonValue::Number(number) => match number.as_f64() {
                Some(number) => AttributeValue::Number(number),
                None => AttributeValue::Text(number.to_string()),
            },
            JsonValue::String(text) => AttributeValue::Text(text.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => AttributeValue::Text(value.to_string()),
        }
    }
}

/// Attributes of a marker, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: &str, value: AttributeValue) {
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttributeValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, AttributeValue)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (key, value) in iter {
            let key: String = key.into();
            map.insert(&key, value);
        }
        map
    }
}

/// Where a marker record came from. Only user supplied markers take part in membership queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOrigin {
    /// Imported in bulk from an external data source.
    UserSupplied,
    /// Placed with the interactive draw tool.
    HandDrawn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub position: geo::Point,
    pub attributes: AttributeMap,
    pub origin: MarkerOrigin,
}

impl MarkerRecord {
    pub fn user_supplied(position: geo::Point, attributes: AttributeMap) -> Self {
        Self {
            position,
            attributes,
            origin: MarkerOrigin::UserSupplied,
        }
    }

    pub fn hand_drawn(position: geo::Point) -> Self {
        Self {
            position,
            attributes: AttributeMap::new(),
            origin: MarkerOrigin::HandDrawn,
        }
    }

    pub fn is_user_supplied(&self) -> bool {
        self.origin == MarkerOrigin::UserSupplied
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{AttributeMap, AttributeValue, Shape, ShapeKind};

    #[test]
    fn test_attribute_map_keeps_insertion_order() {
        let mut attributes = AttributeMap::new();
        attributes.insert("name", "X".into());
        attributes.insert("age", 42.0.into());
        attributes.insert("name", "Y".into());

        let entries: Vec<(&str, String)> = attributes
            .iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![("name", "Y".to_string()), ("age", "42".to_string())]
        );
    }

    #[rstest]
    #[case(AttributeValue::Number(10.0), "10")]
    #[case(AttributeValue::Number(1.5), "1.5")]
    #[case(AttributeValue::Bool(true), "true")]
    #[case(AttributeValue::Null, "null")]
    #[case(AttributeValue::Text("Lyon".to_string()), "Lyon")]
    fn test_attribute_value_display(#[case] value: AttributeValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_attribute_value_from_yaml() {
        let value: serde_yaml::Value = serde_yaml::from_str("[1, 2]").unwrap();
        assert_eq!(
            AttributeValue::from(&value),
            AttributeValue::Text("- 1\n- 2".to_string())
        );
        let value: serde_yaml::Value = serde_yaml::from_str("12").unwrap();
        assert_eq!(AttributeValue::from(&value), AttributeValue::Number(12.0));
    }

    #[test]
    fn test_rectangle_from_corners() {
        let shape = Shape::rectangle(geo::Point::new(1.0, 1.0), geo::Point::new(0.0, 0.0));
        assert_eq!(shape.kind(), ShapeKind::Rectangle);
        match shape {
            Shape::Rectangle(polygon) => {
                // Four corners plus the closing coordinate.
                assert_eq!(polygon.exterior().0.len(), 5);
                assert!(polygon.exterior().is_closed());
            }
            _ => unreachable!(),
        }
    }

    #[rstest]
    #[case(Shape::Polyline(vec![(0.0, 0.0)].into()))]
    #[case(Shape::polygon(vec![geo::Point::new(0.0, 0.0), geo::Point::new(1.0, 1.0)]))]
    #[case(Shape::Marker(geo::Point::new(f64::NAN, 0.0)))]
    #[case(Shape::Polyline(vec![(0.0, 0.0), (f64::INFINITY, 1.0)].into()))]
    fn test_validate_rejects_invalid_geometry(#[case] shape: Shape) {
        assert!(shape.validate().is_err());
    }

    #[rstest]
    #[case(Shape::Marker(geo::Point::new(2.35, 48.85)))]
    #[case(Shape::Polyline(vec![(0.0, 0.0), (1.0, 1.0)].into()))]
    #[case(Shape::polygon(vec![
        geo::Point::new(0.0, 0.0),
        geo::Point::new(1.0, 0.0),
        geo::Point::new(1.0, 1.0),
    ]))]
    fn test_validate_accepts_drawable_geometry(#[case] shape: Shape) {
        assert!(shape.validate().is_ok());
    }
}
