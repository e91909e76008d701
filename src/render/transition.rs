use std::time::Duration;

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use serde::Serialize;

use crate::{classify::interpolate, render::scene::{RenderedRegion, Scene}};

/// Duration of every update transition.
pub const TRANSITION_DURATION: Duration = Duration::from_millis(750);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    #[default]
    Linear,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
        }
    }
}

/// An animated change between two committed scenes.
///
/// The core never drives frames; the rendering boundary samples
/// [`frame_at`](Self::frame_at) on its own clock.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransitionDescriptor {
    /// Increases by one with every committed update.
    pub seq: u64,
    pub start: Scene,
    pub end: Scene,
    pub duration: Duration,
    pub easing: Easing,
}

impl TransitionDescriptor {
    pub(crate) fn new(seq: u64, start: Scene, end: Scene) -> Self {
        Self { seq, start, end, duration: TRANSITION_DURATION, easing: Easing::Linear }
    }

    /// Scene at `progress` in `[0, 1]` (clamped).
    ///
    /// Colors interpolate in RGB.  Shapes interpolate vertex by vertex when
    /// start and end share the same ring structure and otherwise snap to the
    /// end shape.
    pub fn frame_at(&self, progress: f64) -> Scene {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        if progress >= 1.0 { return self.end.clone() }
        let t = self.easing.apply(progress);

        let regions = self.end.regions.iter().enumerate()
            .map(|(i, end)| match self.start.regions.get(i).filter(|s| s.id == end.id) {
                Some(start) => RenderedRegion::new(
                    end.id.clone(),
                    lerp_shape(&start.shape, &end.shape, t).unwrap_or_else(|| end.shape.clone()),
                    interpolate(&start.fill, &end.fill, t),
                    end.tooltip.clone(),
                ),
                None => end.clone(),
            })
            .collect();

        let mut frame = Scene { regions, ..self.end.clone() };
        if let Some(mesh) = lerp_mesh(&self.start.mesh, &self.end.mesh, t) {
            frame.set_mesh(mesh);
        }
        frame
    }
}

fn lerp_coord(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t }
}

fn lerp_line(a: &LineString<f64>, b: &LineString<f64>, t: f64) -> Option<LineString<f64>> {
    if a.0.len() != b.0.len() { return None }
    Some(LineString(a.0.iter().zip(&b.0).map(|(&p, &q)| lerp_coord(p, q, t)).collect()))
}

fn lerp_shape(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, t: f64) -> Option<MultiPolygon<f64>> {
    if a.0.len() != b.0.len() { return None }
    a.0.iter().zip(&b.0)
        .map(|(p, q)| {
            if p.interiors().len() != q.interiors().len() { return None }
            let exterior = lerp_line(p.exterior(), q.exterior(), t)?;
            let interiors = p.interiors().iter().zip(q.interiors())
                .map(|(h, k)| lerp_line(h, k, t))
                .collect::<Option<Vec<_>>>()?;
            Some(Polygon::new(exterior, interiors))
        })
        .collect::<Option<Vec<_>>>()
        .map(MultiPolygon)
}

fn lerp_mesh(a: &MultiLineString<f64>, b: &MultiLineString<f64>, t: f64) -> Option<MultiLineString<f64>> {
    if a.0.len() != b.0.len() { return None }
    a.0.iter().zip(&b.0)
        .map(|(p, q)| lerp_line(p, q, t))
        .collect::<Option<Vec<_>>>()
        .map(MultiLineString)
}
