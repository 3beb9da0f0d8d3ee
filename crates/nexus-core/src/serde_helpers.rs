//! Lenient deserializers for values the server encodes inconsistently.
//!
//! Decimal fields arrive as JSON strings (`"1500.00"`) from the Django
//! serializers but as numbers from the aggregate endpoints.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

fn parse_raw<E: serde::de::Error>(raw: RawNumber) -> Result<f64, E> {
    match raw {
        RawNumber::Number(value) => Ok(value),
        RawNumber::Text(text) if text.trim().is_empty() => Ok(0.0),
        RawNumber::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid decimal value '{}'", text))),
    }
}

/// Deserializes a decimal given as a number or a numeric string.
pub fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawNumber>::deserialize(deserializer)? {
        Some(raw) => parse_raw(raw),
        None => Ok(0.0),
    }
}

/// Optional variant of [`decimal`]; `null` stays `None`.
pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawNumber>::deserialize(deserializer)?
        .map(parse_raw)
        .transpose()
}
