//! Attribute → color classification under discrete, threshold and gradient
//! policies, plus legend descriptors.

mod color;
mod format;
mod legend;
mod scale;

pub use color::{interpolate, Color, Rgb};
pub use format::NumberFormat;
pub use legend::{LegendDescriptor, LegendOptions};
pub use scale::{classify, ScaleConfig, ScaleSpec, DEFAULT_NA_COLOR};
