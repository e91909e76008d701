use ahash::AHashMap;
use maptopo::AttrValue;
use serde::{Deserialize, Serialize};

use crate::{classify::color::{Color, Rgb}, error::{ClassifyError, ScaleError}};

/// Fallback color for regions whose value is not available.
pub const DEFAULT_NA_COLOR: &str = "#cccccc";

/// Host-facing scale description, tagged by `color_type`.
///
/// Field aliases accept the names used by older host payloads
/// (`breaks_var`, `range_col`, `range_var`, and `continuous` for threshold).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "color_type", rename_all = "lowercase")]
pub enum ScaleSpec {
    /// Exact category → color lookup.
    Discrete {
        values: Vec<AttrValue>,
        colors: Vec<Color>,
    },
    /// Step function over ascending breakpoints.
    #[serde(alias = "continuous")]
    Threshold {
        #[serde(alias = "breaks_var", alias = "range_col")]
        breaks: Vec<f64>,
        colors: Vec<Color>,
        /// Observed value range, used to close the open legend bins.
        #[serde(default, alias = "range_var")]
        range: Option<[f64; 2]>,
    },
    /// Linear interpolation across evenly spaced color stops.
    Gradient {
        #[serde(alias = "range_var")]
        domain: [f64; 2],
        colors: Vec<Color>,
    },
}

#[derive(Clone, Debug)]
pub(crate) enum Policy {
    Discrete {
        keys: Vec<String>,
        colors: Vec<Color>,
        lookup: AHashMap<String, usize>,
    },
    Threshold {
        breaks: Vec<f64>,
        colors: Vec<Color>,
        range: Option<[f64; 2]>,
    },
    Gradient {
        domain: [f64; 2],
        stops: Vec<Color>,
        rgb: Vec<Rgb>,
    },
}

/// A validated scale: the policy plus the NA color.
///
/// Immutable once built; live updates replace the whole value.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
    pub(crate) policy: Policy,
    na_color: Color,
    spec: ScaleSpec,
}

fn invalid(msg: impl Into<String>) -> ScaleError { ScaleError::InvalidScale(msg.into()) }

impl ScaleConfig {
    /// Validate `spec` once, so classification never has to.
    pub fn new(spec: ScaleSpec, na_color: Color) -> Result<Self, ScaleError> {
        let policy = match &spec {
            ScaleSpec::Discrete { values, colors } => {
                if values.is_empty() { return Err(invalid("discrete scale has no categories")) }
                if values.len() != colors.len() {
                    return Err(invalid(format!("{} categories but {} colors", values.len(), colors.len())));
                }
                let keys = values.iter()
                    .map(|v| v.category_key().ok_or_else(|| invalid("discrete categories cannot be NA")))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut lookup = AHashMap::with_capacity(keys.len());
                for (i, key) in keys.iter().enumerate() {
                    if lookup.insert(key.clone(), i).is_some() {
                        return Err(invalid(format!("duplicate category {key:?}")));
                    }
                }
                Policy::Discrete { keys, colors: colors.clone(), lookup }
            }
            ScaleSpec::Threshold { breaks, colors, range } => {
                if breaks.iter().any(|b| !b.is_finite()) {
                    return Err(invalid("threshold breaks must be finite"));
                }
                if breaks.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(invalid(format!("threshold breaks must be strictly ascending: {breaks:?}")));
                }
                if colors.len() != breaks.len() + 1 {
                    return Err(invalid(format!("{} breaks need {} colors, got {}", breaks.len(), breaks.len() + 1, colors.len())));
                }
                if let Some([lo, hi]) = range {
                    if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                        return Err(invalid(format!("invalid value range [{lo}, {hi}]")));
                    }
                }
                Policy::Threshold { breaks: breaks.clone(), colors: colors.clone(), range: *range }
            }
            ScaleSpec::Gradient { domain, colors } => {
                let [lo, hi] = *domain;
                if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                    return Err(invalid(format!("gradient domain [{lo}, {hi}] must be finite and increasing")));
                }
                if colors.len() < 2 { return Err(invalid("gradient needs at least two color stops")) }
                let rgb = colors.iter()
                    .map(|c| c.rgb().ok_or_else(|| invalid(format!("cannot interpolate color {:?}", c.as_str()))))
                    .collect::<Result<Vec<_>, _>>()?;
                Policy::Gradient { domain: *domain, stops: colors.clone(), rgb }
            }
        };

        Ok(Self { policy, na_color, spec })
    }

    #[inline] pub fn na_color(&self) -> &Color { &self.na_color }

    /// The specification this scale was built from.
    #[inline] pub fn spec(&self) -> &ScaleSpec { &self.spec }

    /// Classify one value.  See [`classify`].
    pub fn classify(&self, value: &AttrValue) -> Result<Color, ClassifyError> {
        if value.is_na() { return Ok(self.na_color.clone()) }

        match &self.policy {
            Policy::Discrete { colors, lookup, .. } => {
                let key = value.category_key().unwrap_or_default();
                lookup.get(&key)
                    .map(|&i| colors[i].clone())
                    .ok_or(ClassifyError::UnknownCategory(key))
            }
            Policy::Threshold { breaks, colors, .. } => Ok(match value.as_number() {
                // First break strictly greater than the value: bins are right-open.
                Some(v) => colors[breaks.partition_point(|&b| b <= v)].clone(),
                None => self.na_color.clone(),
            }),
            Policy::Gradient { domain: [lo, hi], stops, rgb } => Ok(match value.as_number() {
                Some(v) => gradient_color(((v - lo) / (hi - lo)).clamp(0.0, 1.0), stops, rgb),
                None => self.na_color.clone(),
            }),
        }
    }

    /// Classify, degrading unknown categories to the NA color.
    pub fn classify_or_na(&self, value: &AttrValue) -> Color {
        self.classify(value).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to NA color");
            self.na_color.clone()
        })
    }
}

/// Color at normalized position `t` in `[0, 1]` across evenly spaced stops.
fn gradient_color(t: f64, stops: &[Color], rgb: &[Rgb]) -> Color {
    let segments = stops.len() - 1;
    let position = t * segments as f64;
    let i = (position.floor() as usize).min(segments - 1);
    let f = position - i as f64;

    if f <= 0.0 { return stops[i].clone() }
    if f >= 1.0 { return stops[i + 1].clone() }
    rgb[i].lerp(rgb[i + 1], f).into()
}

/// Map `value` to a color under `scale`.
///
/// NA values (missing, NaN, `"NA"`) yield the NA color for every policy.
/// Discrete scales fail with `UnknownCategory` for values outside the
/// category set; numeric policies give the NA color for non-numeric values.
pub fn classify(value: &AttrValue, scale: &ScaleConfig) -> Result<Color, ClassifyError> {
    scale.classify(value)
}
