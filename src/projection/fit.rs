use geo::Coord;
use maptopo::{ArcCoords, Topology};
use serde::{Deserialize, Serialize};

use crate::{error::FitError, projection::{kind::RawProjection, ProjectionKind}};

/// How much of the viewport a fitted map may occupy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Fraction of the viewport left empty around the map, in `[0, 1)`.
    pub margin: f64,
    /// Fraction of the height kept free below the map (e.g. for a legend), in `[0, 1)`.
    pub bottom_reserve: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { margin: 0.1, bottom_reserve: 0.0 }
    }
}

impl FitOptions {
    fn validate(&self) -> Result<(), FitError> {
        if !(0.0..1.0).contains(&self.margin) {
            return Err(FitError::InvalidViewport(format!("margin {} outside [0, 1)", self.margin)));
        }
        if !(0.0..1.0).contains(&self.bottom_reserve) {
            return Err(FitError::InvalidViewport(format!("bottom_reserve {} outside [0, 1)", self.bottom_reserve)));
        }
        Ok(())
    }
}

/// A projection fitted to a viewport: `screen = raw(lon, lat) * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionState {
    pub kind: ProjectionKind,
    pub scale: f64,
    pub translate: [f64; 2],
}

impl ProjectionState {
    /// Build a reusable projector for this state.
    pub fn projector(&self) -> Result<Projector, FitError> {
        Ok(Projector { raw: RawProjection::new(self.kind)?, state: *self })
    }
}

/// Applies a fitted `ProjectionState` to coordinates.
pub struct Projector {
    raw: RawProjection,
    state: ProjectionState,
}

impl Projector {
    /// Project a lon/lat coordinate into device coordinates.
    pub fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>, FitError> {
        let Coord { x, y } = self.raw.project(coord)?;
        let [tx, ty] = self.state.translate;
        Ok(Coord { x: x * self.state.scale + tx, y: y * self.state.scale + ty })
    }

    /// Project every arc of `topology`, preserving the arc layout.
    pub fn project_arcs(&self, topology: &Topology) -> Result<Vec<ArcCoords>, FitError> {
        topology.map_arcs(|c| self.project(c))
    }
}

/// Fit `kind` so the topology fills a `width` x `height` viewport.
///
/// The topology is projected at unit scale, and the scale is chosen so the
/// larger relative extent fills `1 - margin` of the usable viewport.  The
/// bounding box is centred in the viewport minus `bottom_reserve`.
/// Deterministic: identical inputs give bit-identical states.
pub fn fit(
    topology: &Topology,
    width: f64,
    height: f64,
    kind: ProjectionKind,
    options: &FitOptions,
) -> Result<ProjectionState, FitError> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(FitError::InvalidViewport(format!("{width} x {height}")));
    }
    options.validate()?;

    let raw = RawProjection::new(kind)?;
    let unit_arcs = topology.map_arcs(|c| raw.project(c))?;

    let bounds = Topology::bounds_of(&unit_arcs)
        .ok_or(FitError::DegenerateGeometry { width: 0.0, height: 0.0 })?;
    let (bw, bh) = (bounds.width(), bounds.height());
    if !(bw.is_finite() && bh.is_finite() && bw > 0.0 && bh > 0.0) {
        return Err(FitError::DegenerateGeometry { width: bw, height: bh });
    }

    let usable_height = height * (1.0 - options.bottom_reserve);
    let scale = (1.0 - options.margin) / f64::max(bw / width, bh / usable_height);
    let translate = [
        (width - scale * (bounds.min().x + bounds.max().x)) / 2.0,
        (usable_height - scale * (bounds.min().y + bounds.max().y)) / 2.0,
    ];

    tracing::debug!(?kind, scale, tx = translate[0], ty = translate[1], "fitted projection");

    Ok(ProjectionState { kind, scale, translate })
}
