//! Serialization of feature attributes into GeoJSON properties.

use geojson::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use vtgeojson_mvt::MvtValue;

use crate::error::VtGeoJsonError;

/// How attribute values are written into GeoJSON.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyEncoding {
    /// Strings, numbers and booleans are written as JSON strings, numbers and booleans.
    #[default]
    Typed,
    /// Every value is written as a JSON string: `3` becomes `"3"`, `true` becomes `"true"`.
    Stringify,
}

/// Converts ordered feature attributes into a GeoJSON properties object.
///
/// Keys and string values are escaped with the standard JSON rules, so arbitrary attribute text
/// cannot break the output document.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PropertySerializer {
    encoding: PropertyEncoding,
}

impl PropertySerializer {
    /// Creates a new serializer.
    pub fn new(encoding: PropertyEncoding) -> Self {
        Self { encoding }
    }

    /// Value encoding used by the serializer.
    pub fn encoding(&self) -> PropertyEncoding {
        self.encoding
    }

    /// Converts a single value.
    ///
    /// Fails with [`VtGeoJsonError::MalformedProperties`] for [`MvtValue::Unknown`], and in typed
    /// mode for `NaN` and infinite numbers which have no JSON representation.
    pub fn encode_value(&self, key: &str, value: &MvtValue) -> Result<Value, VtGeoJsonError> {
        let non_finite = || {
            VtGeoJsonError::MalformedProperties(format!(
                "value of '{key}' is not a finite number: {value}"
            ))
        };

        Ok(match (self.encoding, value) {
            (_, MvtValue::Unknown) => {
                return Err(VtGeoJsonError::MalformedProperties(format!(
                    "value of '{key}' is not a string, number or boolean"
                )))
            }
            (PropertyEncoding::Stringify, v) => Value::String(v.to_string()),
            (_, MvtValue::String(v)) => Value::String(v.clone()),
            // Widened through the shortest decimal form, so 0.1f32 is written as 0.1.
            (_, MvtValue::Float(v)) => {
                let widened = v.to_string().parse::<f64>().map_err(|_| non_finite())?;
                Value::Number(Number::from_f64(widened).ok_or_else(non_finite)?)
            }
            (_, MvtValue::Double(v)) => {
                Value::Number(Number::from_f64(*v).ok_or_else(non_finite)?)
            }
            (_, MvtValue::Int64(v)) => Value::from(*v),
            (_, MvtValue::Uint64(v)) => Value::from(*v),
            (_, MvtValue::Bool(v)) => Value::Bool(*v),
        })
    }

    /// Builds a properties object. Keys keep their input order; if a key repeats, the last value
    /// wins.
    pub fn to_json_object(
        &self,
        properties: &[(String, MvtValue)],
    ) -> Result<JsonObject, VtGeoJsonError> {
        let mut object = JsonObject::new();
        for (key, value) in properties {
            object.insert(key.clone(), self.encode_value(key, value)?);
        }

        Ok(object)
    }

    /// Writes properties as comma-joined `"key":value` pairs without the enclosing braces.
    pub fn encode(&self, properties: &[(String, MvtValue)]) -> Result<String, VtGeoJsonError> {
        let mut pairs = Vec::with_capacity(properties.len());
        for (key, value) in properties {
            let value = self.encode_value(key, value)?;
            pairs.push(format!(
                "{}:{}",
                serde_json::to_string(key)?,
                serde_json::to_string(&value)?
            ));
        }

        Ok(pairs.join(","))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn props(values: &[(&str, MvtValue)]) -> Vec<(String, MvtValue)> {
        values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn name_and_count() -> Vec<(String, MvtValue)> {
        props(&[
            ("name", MvtValue::String("Foo".into())),
            ("count", MvtValue::Int64(3)),
        ])
    }

    #[test]
    fn stringify_all_values() {
        let serializer = PropertySerializer::new(PropertyEncoding::Stringify);
        assert_eq!(
            serializer.encode(&name_and_count()).unwrap(),
            r#""name":"Foo","count":"3""#
        );

        let mixed = props(&[
            ("flag", MvtValue::Bool(true)),
            ("ratio", MvtValue::Double(0.5)),
            ("big", MvtValue::Uint64(u64::MAX)),
        ]);
        assert_eq!(
            serializer.encode(&mixed).unwrap(),
            r#""flag":"true","ratio":"0.5","big":"18446744073709551615""#
        );
    }

    #[test]
    fn typed_values() {
        let serializer = PropertySerializer::new(PropertyEncoding::Typed);
        assert_eq!(
            serializer.encode(&name_and_count()).unwrap(),
            r#""name":"Foo","count":3"#
        );

        let mixed = props(&[
            ("flag", MvtValue::Bool(false)),
            ("ratio", MvtValue::Double(0.25)),
            ("level", MvtValue::Int64(-2)),
            ("width", MvtValue::Float(0.1)),
        ]);
        assert_eq!(
            serializer.encode(&mixed).unwrap(),
            r#""flag":false,"ratio":0.25,"level":-2,"width":0.1"#
        );
    }

    #[test]
    fn default_is_typed() {
        assert_eq!(
            PropertySerializer::default().encoding(),
            PropertyEncoding::Typed
        );
    }

    #[test]
    fn empty_properties() {
        assert_eq!(PropertySerializer::default().encode(&[]).unwrap(), "");
        assert!(PropertySerializer::default()
            .to_json_object(&[])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn special_characters_are_escaped() {
        let serializer = PropertySerializer::new(PropertyEncoding::Stringify);
        let properties = props(&[(
            "na\"me",
            MvtValue::String("line\nbreak \"quoted\" \\".into()),
        )]);

        let text = serializer.encode(&properties).unwrap();
        assert_eq!(text, r#""na\"me":"line\nbreak \"quoted\" \\""#);

        let parsed: Value = serde_json::from_str(&format!("{{{text}}}")).unwrap();
        assert_eq!(parsed["na\"me"], "line\nbreak \"quoted\" \\");
    }

    #[test]
    fn object_keeps_order() {
        let properties = props(&[
            ("z", MvtValue::Int64(1)),
            ("a", MvtValue::Int64(2)),
            ("m", MvtValue::Int64(3)),
        ]);
        let object = PropertySerializer::default()
            .to_json_object(&properties)
            .unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn unknown_value_is_rejected() {
        for encoding in [PropertyEncoding::Typed, PropertyEncoding::Stringify] {
            let properties = props(&[("broken", MvtValue::Unknown)]);
            assert_matches!(
                PropertySerializer::new(encoding).encode(&properties),
                Err(VtGeoJsonError::MalformedProperties(msg)) if msg.contains("broken")
            );
        }
    }

    #[test]
    fn non_finite_number() {
        let properties = props(&[("nan", MvtValue::Double(f64::NAN))]);
        assert_matches!(
            PropertySerializer::new(PropertyEncoding::Typed).encode(&properties),
            Err(VtGeoJsonError::MalformedProperties(_))
        );
        assert_eq!(
            PropertySerializer::new(PropertyEncoding::Stringify)
                .encode(&properties)
                .unwrap(),
            r#""nan":"NaN""#
        );
    }
}
