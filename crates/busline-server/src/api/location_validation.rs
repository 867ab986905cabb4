//! Parsing of `/update_location` bodies.
//!
//! Coordinates may arrive as JSON numbers or numeric strings; both are
//! accepted. Booleans, arrays and objects are not numbers. Any unusable
//! coordinate or accuracy is reported as "invalid lat/lng".

use busline_core::TrackerError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

pub fn parse_location_update(body: &[u8]) -> Result<LocationUpdate, TrackerError> {
    let fields: Map<String, Value> = match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) if !fields.is_empty() => fields,
        _ => return Err(TrackerError::validation("invalid json")),
    };

    let present = |key: &str| fields.get(key).filter(|value| !value.is_null());

    let (Some(lat), Some(lng)) = (present("lat"), present("lng")) else {
        return Err(TrackerError::validation("lat and lng required"));
    };

    let latitude = coerce_number(lat);
    let longitude = coerce_number(lng);
    let accuracy = present("accuracy")
        .map_or(Some(0.0), coerce_number)
        .filter(|accuracy| *accuracy >= 0.0);

    match (latitude, longitude, accuracy) {
        (Some(latitude), Some(longitude), Some(accuracy)) => Ok(LocationUpdate {
            latitude,
            longitude,
            accuracy,
        }),
        _ => Err(TrackerError::validation("invalid lat/lng")),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<LocationUpdate, String> {
        parse_location_update(body.as_bytes()).map_err(|e| e.to_string())
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        assert_eq!(
            parse(r#"{"lat": 15.3173, "lng": "75.7139", "accuracy": " 8 "}"#),
            Ok(LocationUpdate {
                latitude: 15.3173,
                longitude: 75.7139,
                accuracy: 8.0
            })
        );
    }

    #[test]
    fn accuracy_defaults_to_zero() {
        assert_eq!(parse(r#"{"lat": 1, "lng": 2}"#).unwrap().accuracy, 0.0);
        assert_eq!(parse(r#"{"lat": 1, "lng": 2, "accuracy": null}"#).unwrap().accuracy, 0.0);
    }

    #[test]
    fn body_must_be_a_non_empty_object() {
        for body in ["", "not json", "[]", "{}", "42", "null"] {
            assert_eq!(parse(body), Err("invalid json".to_string()), "body {body:?}");
        }
    }

    #[test]
    fn missing_coordinates_are_reported() {
        for body in [r#"{"lat": 1}"#, r#"{"lng": 1}"#, r#"{"lat": null, "lng": 2}"#] {
            assert_eq!(parse(body), Err("lat and lng required".to_string()), "body {body}");
        }
    }

    #[test]
    fn non_numeric_values_are_invalid() {
        for body in [
            r#"{"lat": "north", "lng": 2}"#,
            r#"{"lat": 1, "lng": true}"#,
            r#"{"lat": [1], "lng": 2}"#,
            r#"{"lat": "NaN", "lng": 2}"#,
            r#"{"lat": 1, "lng": "inf"}"#,
            r#"{"lat": 1, "lng": 2, "accuracy": "wide"}"#,
            r#"{"lat": 1, "lng": 2, "accuracy": -5}"#,
            r#"{"lat": 1, "lng": 2, "accuracy": "-0.5"}"#,
        ] {
            assert_eq!(parse(body), Err("invalid lat/lng".to_string()), "body {body}");
        }
    }
}
