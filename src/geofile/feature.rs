use geojson::{JsonObject, JsonValue};

use crate::{
    annotation::{
        controller::{Annotation, AnnotationSource},
        primitives::AttributeValue,
    },
    geometry::measure::Measurement,
};

#[derive(Debug)]
pub struct Feature {
    pub geometry: geo::Geometry,
    pub attributes: Option<JsonObject>,
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Text(text) => JsonValue::from(text.as_str()),
        AttributeValue::Number(number) => JsonValue::from(*number),
        AttributeValue::Bool(value) => JsonValue::from(*value),
        AttributeValue::Null => JsonValue::Null,
    }
}

impl From<&Annotation> for Feature {
    fn from(annotation: &Annotation) -> Self {
        let mut attributes = JsonObject::new();
        attributes.insert(
            "kind".to_string(),
            JsonValue::from(annotation.shape.kind().name()),
        );
        let source = match annotation.source {
            AnnotationSource::Drawn => "drawn",
            AnnotationSource::UserMarker => "user_marker",
        };
        attributes.insert("source".to_string(), JsonValue::from(source));
        if let Some(color) = annotation.color {
            attributes.insert("color".to_string(), JsonValue::from(color.to_string()));
        }
        attributes.insert(
            "tooltip".to_string(),
            JsonValue::from(annotation.tooltip.to_string()),
        );
        match annotation.measurement() {
            Some(Measurement::Area {
                area_m2,
                perimeter_m,
            }) => {
                attributes.insert("area_m2".to_string(), JsonValue::from(area_m2));
                attributes.insert("perimeter_m".to_string(), JsonValue::from(perimeter_m));
            }
            Some(Measurement::Length { length_m }) => {
                attributes.insert("length_m".to_string(), JsonValue::from(length_m));
            }
            None => {}
        }
        if !annotation.attributes.is_empty() {
            let marker_attributes: JsonObject = annotation
                .attributes
                .iter()
                .map(|(key, value)| (key.to_string(), attribute_to_json(value)))
                .collect();
            attributes.insert(
                "attributes".to_string(),
                JsonValue::Object(marker_attributes),
            );
        }
        Self {
            geometry: annotation.shape.to_geometry(),
            attributes: Some(attributes),
        }
    }
}

impl From<Feature> for geojson::Feature {
    fn from(feature: Feature) -> Self {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::from(&feature.geometry)),
            id: None,
            properties: feature.attributes,
            foreign_members: None,
        }
    }
}
