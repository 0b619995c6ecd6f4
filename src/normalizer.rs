//! Scalar value equality with numeric tolerance.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum absolute difference (exclusive) under which two numeric values
/// are considered equal. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Epsilon(f64);

impl Epsilon {
    pub const ZERO: Epsilon = Epsilon(0.0);

    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::InvalidEpsilon {
                value: value.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        if value < 0.0 {
            return Err(ConfigError::InvalidEpsilon {
                value: value.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Parse an epsilon from configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let value = parse_number(text).ok_or_else(|| ConfigError::InvalidEpsilon {
            value: text.to_string(),
            reason: "not a number".to_string(),
        })?;
        Self::new(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Epsilon {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Epsilon::new(value)
    }
}

impl From<Epsilon> for f64 {
    fn from(epsilon: Epsilon) -> Self {
        epsilon.0
    }
}

impl fmt::Display for Epsilon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps the fractional part: `0.0`, not `0`.
        write!(f, "{:?}", self.0)
    }
}

/// XML whitespace: space, tab, carriage return and line feed. Other
/// Unicode spaces such as NBSP are content.
pub fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Trim and collapse runs of XML whitespace to a single space.
pub fn normalize_whitespace(value: &str) -> Cow<'_, str> {
    let trimmed = value.trim_matches(is_xml_whitespace);
    let needs_collapse = trimmed.contains("  ") || trimmed.contains(['\t', '\r', '\n']);

    if needs_collapse {
        Cow::Owned(
            trimmed
                .split(is_xml_whitespace)
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        )
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Parse a numeric literal: optional sign, digits with an optional decimal
/// point, optional exponent. `inf`, `NaN`, hex and empty input are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim_matches(is_xml_whitespace);
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
        None => (unsigned, None),
    };

    let mut digits = 0;
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }

    if let Some(exponent) = exponent {
        let exponent_digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if exponent_digits.is_empty() || !exponent_digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decide whether two scalar values are equal.
///
/// Identical normalized text is always equal. Otherwise numeric values are
/// equal when `|test - control| < epsilon`, and anything else is not.
pub fn is_equal(control: &str, test: &str, epsilon: Epsilon) -> bool {
    let control = normalize_whitespace(control);
    let test = normalize_whitespace(test);
    if control == test {
        return true;
    }

    match (parse_number(&control), parse_number(&test)) {
        (Some(control_value), Some(test_value)) => {
            (test_value - control_value).abs() < epsilon.value()
        }
        _ => false,
    }
}
