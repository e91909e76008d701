use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal marker hosts use for a value that is not available.
pub const NA_MARKER: &str = "NA";

/// A single attribute value attached to a region.
///
/// Deserializes from a bare JSON number, string, or `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl AttrValue {
    /// Returns `true` for missing values, NaN, and the `"NA"` marker.
    pub fn is_na(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Number(v) => v.is_nan(),
            Self::Text(s) => s == NA_MARKER,
        }
    }

    /// The numeric value, if this is a finite number.
    ///
    /// Text is not coerced; `"12"` is categorical, not numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Canonical key used for categorical matching.
    ///
    /// Integral numbers drop their fractional part so `1` and `"1"` share a
    /// key.  Returns `None` for NA values.
    pub fn category_key(&self) -> Option<String> {
        if self.is_na() { return None }
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(v) => Some(format_number(*v)),
            Self::Missing => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self { Self::Number(value) }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self { Self::Text(value.to_string()) }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self { Self::Text(value) }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => f.write_str(&format_number(*v)),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str(NA_MARKER),
        }
    }
}

/// Shortest display form: integral values without a trailing `.0`.
fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
