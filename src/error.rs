//! Error taxonomy shared by the fitter, classifier, cartogram and coordinator.

use thiserror::Error;

/// Errors from fitting a projection to a viewport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// The projected bounding box has zero (or non-finite) width or height.
    #[error("degenerate geometry: projected bounds are {width} x {height}")]
    DegenerateGeometry { width: f64, height: f64 },
    /// Viewport dimensions or fit options are out of range.
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),
    /// The projection backend rejected a coordinate or definition.
    #[error("projection failed: {0}")]
    Projection(String),
}

/// A scale configuration that cannot be used for classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaleError {
    #[error("invalid scale: {0}")]
    InvalidScale(String),
}

/// Per-value classification failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// The value is not one of the discrete scale's categories.
    #[error("unknown category {0:?}")]
    UnknownCategory(String),
}

/// Errors from the cartogram engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartogramError {
    #[error("expected {expected} values (one per region), got {actual}")]
    ValueCount { expected: usize, actual: usize },
    #[error("topology has no regions or zero total area")]
    Empty,
    #[error(transparent)]
    Projection(#[from] FitError),
}

/// Non-fatal: the relaxation hit its iteration cap before reaching tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("cartogram did not converge after {iterations} iterations (max area error {max_error:.4})")]
pub struct NonConvergence {
    pub iterations: usize,
    pub max_error: f64,
}

/// A region is missing the configured color attribute; it renders as NA.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("region {region:?} has no attribute {attribute:?}")]
pub struct MissingAttribute {
    pub region: String,
    pub attribute: String,
}

/// Protocol errors raised by the render coordinator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinatorError {
    #[error("no topology has been fitted")]
    NotFitted,
    #[error("the map has not been rendered yet")]
    NotRendered,
    #[error("update references unknown region {0:?}")]
    UnknownRegion(String),
    #[error("cartogram sizes follow the color variable; switch to {0:?} with update-values")]
    CartogramVariable(String),
}
