use std::collections::HashMap;

use anyhow::anyhow;

use super::primitives::{AttributeMap, AttributeValue};

pub const LATITUDE_KEY: &str = "latitude";
pub const LONGITUDE_KEY: &str = "longitude";

/// A raw record from an external marker source: coordinates plus arbitrary attributes, all
/// addressed by key. Nothing is validated until the record is turned into a marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserLocation {
    pub properties: HashMap<String, AttributeValue>,
}

impl UserLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::default()
            .with(LATITUDE_KEY, latitude.into())
            .with(LONGITUDE_KEY, longitude.into())
    }

    pub fn with(mut self, key: &str, value: AttributeValue) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Marker position, or why the record has none.
    pub fn position(&self) -> anyhow::Result<geo::Point> {
        let latitude = self.coordinate(LATITUDE_KEY)?;
        let longitude = self.coordinate(LONGITUDE_KEY)?;
        Ok(geo::Point::new(longitude, latitude))
    }

    fn coordinate(&self, key: &str) -> anyhow::Result<f64> {
        let value = self
            .get(key)
            .ok_or_else(|| anyhow!("Missing {}", key))?;
        match value.as_f64() {
            Some(number) if number.is_finite() => Ok(number),
            Some(number) => Err(anyhow!("{} {} is not finite", key, number)),
            None => Err(anyhow!("{} '{}' is not a number", key, value)),
        }
    }

    /// The requested attributes present on this record, in requested order.
    pub fn select(&self, keys: &[String]) -> AttributeMap {
        keys.iter()
            .filter_map(|key| {
                self.get(key)
                    .map(|value| (key.as_str(), value.clone()))
            })
            .collect()
    }
}

impl TryFrom<&serde_yaml::Value> for UserLocation {
    type Error = anyhow::Error;

    fn try_from(value: &serde_yaml::Value) -> anyhow::Result<Self> {
        let mapping = value
            .as_mapping()
            .ok_or_else(|| anyhow!("Expected a mapping for a user location, got {:?}", value))?;
        let mut properties = HashMap::new();
        for (key, value) in mapping {
            match key.as_str() {
                Some(key) => {
                    properties.insert(key.to_string(), AttributeValue::from(value));
                }
                None => log::warn!("Ignoring non-string user location key {:?}", key),
            }
        }
        Ok(Self { properties })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::annotation::primitives::AttributeValue;

    use super::UserLocation;

    #[test]
    fn test_position_is_lon_lat() {
        let position = UserLocation::new(10.0, 20.0).position().unwrap();
        assert_eq!(position, geo::Point::new(20.0, 10.0));
    }

    #[test]
    fn test_zero_coordinates_are_valid() {
        assert!(UserLocation::new(0.0, 0.0).position().is_ok());
    }

    #[rstest]
    #[case(UserLocation::default().with("longitude", 5.0.into()))]
    #[case(UserLocation::default().with("latitude", 5.0.into()))]
    #[case(UserLocation::default()
        .with("latitude", AttributeValue::Null)
        .with("longitude", 5.0.into()))]
    #[case(UserLocation::default()
        .with("latitude", "north".into())
        .with("longitude", 5.0.into()))]
    #[case(UserLocation::new(f64::NAN, 5.0))]
    #[case(UserLocation::default()
        .with("latitude", "NaN".into())
        .with("longitude", 5.0.into()))]
    #[case(UserLocation::default()
        .with("latitude", "".into())
        .with("longitude", 5.0.into()))]
    fn test_position_rejects_invalid_coordinates(#[case] location: UserLocation) {
        assert!(location.position().is_err());
    }

    #[rstest]
    #[case(UserLocation::new(45.76, 4.83))]
    #[case(UserLocation::default()
        .with("latitude", "45.76".into())
        .with("longitude", "4.83".into()))]
    #[case(UserLocation::default()
        .with("latitude", " 45.76\n".into())
        .with("longitude", 4.83.into()))]
    fn test_position_accepts_numeric_text(#[case] location: UserLocation) {
        assert_eq!(location.position().unwrap(), geo::Point::new(4.83, 45.76));
    }

    #[test]
    fn test_select_keeps_requested_order_and_skips_missing() {
        let location = UserLocation::new(1.0, 2.0)
            .with("name", "X".into())
            .with("city", "Lyon".into());
        let keys = vec![
            "city".to_string(),
            "missing".to_string(),
            "name".to_string(),
            "city".to_string(),
        ];
        let selected: Vec<(String, String)> = location
            .select(&keys)
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        assert_eq!(
            selected,
            vec![
                ("city".to_string(), "Lyon".to_string()),
                ("name".to_string(), "X".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_yaml_mapping() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("{latitude: 10, longitude: 20.5, name: X, 3: ignored}").unwrap();
        let location = UserLocation::try_from(&value).unwrap();
        assert_eq!(location.properties.len(), 3);
        assert_eq!(location.position().unwrap(), geo::Point::new(20.5, 10.0));
        assert_eq!(location.get("name"), Some(&AttributeValue::Text("X".to_string())));
    }
}
