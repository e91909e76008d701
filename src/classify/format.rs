//! A small subset of d3-format specifiers for legend labels.
//!
//! Grammar: `[$][,][.precision][type]` where `type` is one of `f` (fixed),
//! `d` (integer), `%` (percent), `e` (exponent), or absent.  With no type the
//! precision counts significant digits and trailing zeros are trimmed; with
//! neither, the shortest form is used.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    General,
    Fixed,
    Integer,
    Percent,
    Exponent,
}

/// A parsed number format specifier.
///
/// Serializes as its specifier string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumberFormat {
    currency: bool,
    grouping: bool,
    precision: Option<usize>,
    kind: Kind,
}

/// Precision used when a type is given without one (as d3 does).
const DEFAULT_PRECISION: usize = 6;

impl FromStr for NumberFormat {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let currency = spec.starts_with('$');
        let rest = spec.strip_prefix('$').unwrap_or(spec);
        let grouping = rest.starts_with(',');
        let rest = rest.strip_prefix(',').unwrap_or(rest);

        let (precision, rest) = match rest.strip_prefix('.') {
            Some(r) => {
                let digits = r.chars().take_while(char::is_ascii_digit).count();
                if digits == 0 { return Err(format!("missing precision in {spec:?}")) }
                let p = r[..digits].parse::<usize>().map_err(|e| format!("bad precision in {spec:?}: {e}"))?;
                (Some(p), &r[digits..])
            }
            None => (None, rest),
        };

        let kind = match rest {
            "" => Kind::General,
            "f" => Kind::Fixed,
            "d" => Kind::Integer,
            "%" => Kind::Percent,
            "e" => Kind::Exponent,
            other => return Err(format!("unsupported format type {other:?} in {spec:?}")),
        };

        Ok(Self { currency, grouping, precision, kind })
    }
}

impl TryFrom<String> for NumberFormat {
    type Error = String;

    fn try_from(spec: String) -> Result<Self, Self::Error> { spec.parse() }
}

impl From<NumberFormat> for String {
    fn from(format: NumberFormat) -> Self { format.to_string() }
}

impl NumberFormat {
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() { return value.to_string() }

        let negative = value < 0.0;
        let magnitude = value.abs();

        let (mut body, suffix) = match self.kind {
            Kind::General => (match self.precision {
                Some(p) => significant(magnitude, p),
                None => shortest(magnitude),
            }, ""),
            Kind::Fixed => {
                let p = self.precision.unwrap_or(DEFAULT_PRECISION);
                (format!("{magnitude:.p$}"), "")
            }
            Kind::Integer => (format!("{:.0}", magnitude.round()), ""),
            Kind::Percent => {
                let p = self.precision.unwrap_or(DEFAULT_PRECISION);
                (format!("{:.p$}", magnitude * 100.0), "%")
            }
            Kind::Exponent => {
                let p = self.precision.unwrap_or(DEFAULT_PRECISION);
                (exponent(magnitude, p), "")
            }
        };

        if self.grouping && self.kind != Kind::Exponent {
            body = group_thousands(&body);
        }

        // A value that rounds to zero is not shown as negative.
        let negative = negative && body.chars().any(|c| c.is_ascii_digit() && c != '0');

        format!(
            "{}{}{body}{suffix}",
            if negative { "-" } else { "" },
            if self.currency { "$" } else { "" },
        )
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.currency { f.write_str("$")? }
        if self.grouping { f.write_str(",")? }
        if let Some(p) = self.precision { write!(f, ".{p}")? }
        f.write_str(match self.kind {
            Kind::General => "",
            Kind::Fixed => "f",
            Kind::Integer => "d",
            Kind::Percent => "%",
            Kind::Exponent => "e",
        })
    }
}

/// Shortest form: integral values without a fractional part.
pub(crate) fn shortest(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 { format!("{}", value as i64) } else { format!("{value}") }
}

/// `precision` significant digits without trailing zeros, switching to
/// exponent notation for very large or small magnitudes.
fn significant(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value == 0.0 { return "0".to_string() }

    let digits = precision - 1;
    let rounded = format!("{value:.digits$e}");
    let exp = rounded.split_once('e').and_then(|(_, e)| e.parse::<i32>().ok()).unwrap_or(0);

    if exp < -6 || exp >= precision as i32 {
        let (mantissa, _) = rounded.split_once('e').unwrap_or((&rounded, ""));
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{sign}{}", trim_zeros(mantissa), exp.abs());
    }

    let decimals = (precision as i32 - 1 - exp).max(0) as usize;
    trim_zeros(&format!("{value:.decimals$}")).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') { s.trim_end_matches('0').trim_end_matches('.') } else { s }
}

/// `1.50e+3` style exponent notation.
fn exponent(value: f64, precision: usize) -> String {
    let s = format!("{value:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

/// Insert `,` separators into the integer part of a plain decimal string.
fn group_thousands(s: &str) -> String {
    let (int, frac) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };

    let mut out = String::with_capacity(s.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 { out.push(',') }
        out.push(ch);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}
