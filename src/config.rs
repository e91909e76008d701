//! Host-facing map options, validated once into a [`MapConfig`].

use anyhow::{Context, Result, bail};
use maptopo::AttrValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    cartogram::CartogramOptions,
    classify::{Color, LegendOptions, ScaleConfig, ScaleSpec, DEFAULT_NA_COLOR},
    projection::{FitOptions, ProjectionKind},
};

/// Fill for every region when no color scale is configured.
pub const DEFAULT_FILL: &str = "#5f799c";

// ---------------------------------------------------------------------------
// Options as sent by the host
// ---------------------------------------------------------------------------

/// `colors` block: `color_type` sits beside the policy fields in `scale`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "ColorOptionsData")]
pub struct ColorOptions {
    pub color_var: String,
    pub scale: ScaleSpec,
    pub na_color: Option<Color>,
}

#[derive(Deserialize)]
struct ColorOptionsData {
    color_type: String,
    color_var: String,
    #[serde(default)]
    scale: Map<String, Value>,
    #[serde(default)]
    na_color: Option<Color>,
}

impl TryFrom<ColorOptionsData> for ColorOptions {
    type Error = serde_json::Error;

    fn try_from(data: ColorOptionsData) -> Result<Self, Self::Error> {
        let mut fields = data.scale;
        fields.insert("color_type".into(), Value::String(data.color_type));
        Ok(Self {
            color_var: data.color_var,
            scale: serde_json::from_value(Value::Object(fields))?,
            na_color: data.na_color,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomOptions {
    pub click: bool,
    pub wheel: bool,
}

/// Title and caption drawn around the map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub title: Option<String>,
    pub caption: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Default for Stroke {
    fn default() -> Self { Self { color: Color::from("#fafafa"), width: 1.0 } }
}

/// Every option the map accepts, exactly as the host sends them.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub projection: ProjectionKind,
    pub cartogram: bool,
    pub cartogram_opts: CartogramOptions,
    pub colors: Option<ColorOptions>,
    pub legend: bool,
    pub legend_opts: LegendOptions,
    pub tooltip: bool,
    /// Tooltip text aligned to region order.
    pub tooltip_value: Vec<AttrValue>,
    pub zoom: bool,
    pub zoom_opts: ZoomOptions,
    pub stroke_col: Option<Color>,
    pub stroke_width: Option<f64>,
    pub labs: Labels,
    pub margin: Option<f64>,
    pub bottom_reserve: Option<f64>,
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Color attribute plus the validated scale applied to it.
#[derive(Clone, Debug)]
pub struct ColorConfig {
    pub variable: String,
    pub scale: ScaleConfig,
}

/// Validated map configuration.  Optional features are `Some` only when enabled.
#[derive(Clone, Debug)]
pub struct MapConfig {
    pub projection: ProjectionKind,
    pub fit: FitOptions,
    pub cartogram: Option<CartogramOptions>,
    pub color: Option<ColorConfig>,
    pub legend: Option<LegendOptions>,
    pub tooltips: Option<Vec<AttrValue>>,
    pub zoom: Option<ZoomOptions>,
    pub stroke: Stroke,
    pub labels: Labels,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::default(),
            fit: FitOptions::default(),
            cartogram: None,
            color: None,
            legend: None,
            tooltips: None,
            zoom: None,
            stroke: Stroke::default(),
            labels: Labels::default(),
        }
    }
}

impl MapOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("[config] failed to parse map options")
    }

    /// Validate every option, failing before anything is rendered.
    pub fn validate(self) -> Result<MapConfig> {
        let defaults = FitOptions::default();
        let fit = FitOptions {
            margin: self.margin.unwrap_or(defaults.margin),
            bottom_reserve: self.bottom_reserve.unwrap_or(defaults.bottom_reserve),
        };
        if !(0.0..1.0).contains(&fit.margin) { bail!("[config] margin {} outside [0, 1)", fit.margin) }
        if !(0.0..1.0).contains(&fit.bottom_reserve) {
            bail!("[config] bottom_reserve {} outside [0, 1)", fit.bottom_reserve)
        }

        let cartogram = self.cartogram.then_some(self.cartogram_opts);
        if let Some(opts) = &cartogram {
            if !(opts.tolerance.is_finite() && opts.tolerance > 0.0) {
                bail!("[config] cartogram tolerance must be positive, got {}", opts.tolerance)
            }
        }

        let color = self.colors
            .map(|colors| -> Result<ColorConfig> {
                let na_color = colors.na_color.unwrap_or_else(|| Color::from(DEFAULT_NA_COLOR));
                let scale = ScaleConfig::new(colors.scale, na_color)
                    .with_context(|| format!("[config] invalid scale for {:?}", colors.color_var))?;
                Ok(ColorConfig { variable: colors.color_var, scale })
            })
            .transpose()?;

        if cartogram.is_some() && color.is_none() {
            bail!("[config] cartogram mode needs a colors.color_var to size regions by")
        }

        let stroke_width = self.stroke_width.unwrap_or(Stroke::default().width);
        if !(stroke_width.is_finite() && stroke_width >= 0.0) {
            bail!("[config] stroke_width must be a non-negative number, got {stroke_width}")
        }

        Ok(MapConfig {
            projection: self.projection,
            fit,
            cartogram,
            color,
            legend: self.legend.then_some(self.legend_opts),
            tooltips: self.tooltip.then_some(self.tooltip_value),
            zoom: self.zoom.then_some(self.zoom_opts),
            stroke: Stroke {
                color: self.stroke_col.unwrap_or_else(|| Stroke::default().color),
                width: stroke_width,
            },
            labels: self.labs,
        })
    }
}

impl MapConfig {
    /// Parse and validate options in one step.
    pub fn from_json(json: &str) -> Result<Self> {
        MapOptions::from_json(json)?.validate()
    }
}
