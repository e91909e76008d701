//! Projection kinds and viewport fitting.

mod fit;
mod kind;

pub use fit::{fit, FitOptions, ProjectionState, Projector};
pub use kind::ProjectionKind;
