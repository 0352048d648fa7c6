// ABOUTME: Parsers for the JSON lines docker emits through its --format templates
// ABOUTME: Includes a decoder for numbers docker reports as percent strings like "32.5%"

use crate::error::{DockhandError, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of the image listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub repository: String,
    pub tag: String,
    pub id: String,
}

/// One line of a one-shot `docker stats` call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContainerStatRecord {
    #[serde(deserialize_with = "deserialize_percent")]
    pub cpu: f64,
    #[serde(rename = "mem", deserialize_with = "deserialize_percent")]
    pub memory: f64,
}

pub fn parse_image_record(line: &str) -> Result<ImageRecord> {
    serde_json::from_str(line.trim())
        .map_err(|e| DockhandError::Parse(format!("Invalid image record '{}': {}", line, e)))
}

pub fn parse_stat_record(line: &str) -> Result<ContainerStatRecord> {
    serde_json::from_str(line.trim())
        .map_err(|e| DockhandError::Parse(format!("Invalid stats record '{}': {}", line, e)))
}

/// Parse `"32.5%"`, `" 5% "` or `"5"` into a number
pub fn parse_percent(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DockhandError::Parse(format!(
            "Invalid decimal string format: '{}'",
            raw
        ))),
    }
}

/// serde `deserialize_with` target for required percent fields
pub fn deserialize_percent<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match decode_percent_value(Value::deserialize(deserializer)?) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(de::Error::custom("Unexpected token type: null")),
        Err(e) => Err(de::Error::custom(e)),
    }
}

/// serde `deserialize_with` target for optional percent fields; `null` maps to `None`
pub fn deserialize_optional_percent<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    decode_percent_value(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

fn decode_percent_value(value: Value) -> Result<Option<f64>> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| DockhandError::Parse(format!("Unrepresentable number: {}", number))),
        Value::String(raw) => parse_percent(&raw).map(Some),
        Value::Null => Ok(None),
        Value::Array(_) => Err(DockhandError::Parse(
            "Unexpected token type: array".to_string(),
        )),
        Value::Object(_) => Err(DockhandError::Parse(
            "Unexpected token type: object".to_string(),
        )),
        Value::Bool(_) => Err(DockhandError::Parse(
            "Unexpected token type: boolean".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[derive(Debug, Deserialize)]
    struct Required {
        #[serde(deserialize_with = "deserialize_percent")]
        value: f64,
    }

    #[derive(Debug, Deserialize)]
    struct Optional {
        #[serde(default, deserialize_with = "deserialize_optional_percent")]
        value: Option<f64>,
    }

    #[rstest]
    #[case(r#"{"value":"32.325%"}"#, 32.325)]
    #[case(r#"{"value":"0%"}"#, 0.0)]
    #[case(r#"{"value":"  5%"}"#, 5.0)]
    #[case(r#"{"value":"5"}"#, 5.0)]
    #[case(r#"{"value":" 7.5 % "}"#, 7.5)]
    #[case(r#"{"value":12.5}"#, 12.5)]
    #[case(r#"{"value":3}"#, 3.0)]
    fn test_decodes_numbers_and_percent_strings(#[case] json: &str, #[case] expected: f64) {
        let parsed: Required = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.value, expected);
    }

    #[rstest]
    #[case(r#"{"value":"%"}"#)]
    #[case(r#"{"value":"I am not a number!"}"#)]
    #[case(r#"{"value":"\t"}"#)]
    #[case(r#"{"value":""}"#)]
    #[case(r#"{"value":"NaN"}"#)]
    #[case(r#"{"value":"inf%"}"#)]
    #[case(r#"{"value":[1,2]}"#)]
    #[case(r#"{"value":{"a":1}}"#)]
    #[case(r#"{"value":true}"#)]
    #[case(r#"{"value":null}"#)]
    fn test_rejects_invalid_required_values(#[case] json: &str) {
        assert!(serde_json::from_str::<Required>(json).is_err());
    }

    #[test]
    fn test_null_is_accepted_for_optional_fields() {
        let parsed: Optional = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert_eq!(parsed.value, None);

        let parsed: Optional = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(parsed.value, None);

        let parsed: Optional = serde_json::from_str(r#"{"value":"1.5%"}"#).unwrap();
        assert_eq!(parsed.value, Some(1.5));
    }

    #[test]
    fn test_optional_still_rejects_garbage() {
        assert!(serde_json::from_str::<Optional>(r#"{"value":"%"}"#).is_err());
        assert!(serde_json::from_str::<Optional>(r#"{"value":[]}"#).is_err());
    }

    #[test]
    fn test_parse_percent_errors_are_parse_errors() {
        let error = parse_percent("abc%").unwrap_err();
        assert!(matches!(error, DockhandError::Parse(_)));
    }

    #[test]
    fn test_parse_stat_record() {
        let record = parse_stat_record(r#"{"cpu":"0.15%","mem":"2.31%"}"#).unwrap();
        assert_eq!(record.cpu, 0.15);
        assert_eq!(record.memory, 2.31);
    }

    #[test]
    fn test_parse_image_record() {
        let record =
            parse_image_record(r#"{"repository":"web","tag":"latest","id":"4f2d1c0a9b8e"}"#)
                .unwrap();
        assert_eq!(
            record,
            ImageRecord {
                repository: "web".to_string(),
                tag: "latest".to_string(),
                id: "4f2d1c0a9b8e".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_image_record_rejects_text() {
        let error = parse_image_record("REPOSITORY   TAG   IMAGE ID").unwrap_err();
        assert!(matches!(error, DockhandError::Parse(_)));
    }
}
