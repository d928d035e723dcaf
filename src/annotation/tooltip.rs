use std::fmt;

use super::{
    primitives::{AttributeMap, MarkerRecord},
    style::Color,
};

/// Text shown when hovering an annotation. Rendered with the draw color as background.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub lines: Vec<String>,
    pub background: Option<Color>,
}

impl Tooltip {
    /// Tooltip of a hand drawn marker.
    pub fn for_point(position: &geo::Point, color: Color) -> Self {
        Self {
            title: "Point".to_string(),
            lines: vec![
                format!("Latitude: {:.6}", position.y()),
                format!("Longitude: {:.6}", position.x()),
            ],
            background: Some(color),
        }
    }

    pub fn for_polyline(length_m: f64, color: Color) -> Self {
        Self {
            title: "Line".to_string(),
            lines: vec![format!("Length: {:.2} m", length_m)],
            background: Some(color),
        }
    }

    /// Tooltip of a polygon or rectangle, with a dump of the attributes of every contained marker.
    pub fn for_area(
        area_m2: f64,
        perimeter_m: f64,
        markers_inside: &[&MarkerRecord],
        color: Color,
    ) -> Self {
        let mut lines = vec![
            format!("Area: {:.2} km²", area_m2 / 1_000_000.0),
            format!("Perimeter: {:.2} m", perimeter_m),
            format!("Markers inside: {}", markers_inside.len()),
        ];
        if !markers_inside.is_empty() {
            lines.push("Marker details:".to_string());
            for (index, marker) in markers_inside.iter().enumerate() {
                lines.push(format!("Marker {}", index + 1));
                lines.extend(attribute_lines(&marker.attributes));
            }
        }
        Self {
            title: "Shape".to_string(),
            lines,
            background: Some(color),
        }
    }

    /// Tooltip of an imported marker, listing its attributes.
    pub fn for_user_marker(attributes: &AttributeMap) -> Self {
        Self {
            title: "Information".to_string(),
            lines: attribute_lines(attributes).collect(),
            background: None,
        }
    }
}

fn attribute_lines(attributes: &AttributeMap) -> impl Iterator<Item = String> + '_ {
    attributes
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
}

impl fmt::Display for Tooltip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        for line in &self.lines {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}
