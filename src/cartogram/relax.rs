use std::f64::consts::PI;

use geo::{Area, Centroid, Coord};
use maptopo::{ArcCoords, Topology};

/// Per-region quantities driving one relaxation pass.
#[derive(Clone, Copy, Debug)]
struct Body {
    centroid: Coord<f64>,
    radius: f64,
    mass: f64,
}

/// Result of measuring an arc set against the target weights.
#[derive(Clone, Debug)]
pub(crate) struct Measure {
    pub areas: Vec<f64>,
    /// Largest `max(A, D) / min(A, D)` over all regions.
    pub max_error: f64,
    bodies: Vec<Body>,
    force_reduction: f64,
}

/// Distances below this are treated as coincident with a centroid.
const EPSILON: f64 = 1e-12;

/// Measure region areas, centroids and size errors for `arcs`.
///
/// Returns `None` when the total area is zero.
pub(crate) fn measure(topology: &Topology, arcs: &[ArcCoords], weights: &[f64]) -> Option<Measure> {
    let shapes = topology.shapes(arcs);
    let areas = shapes.iter().map(|s| s.unsigned_area()).collect::<Vec<_>>();
    let total_area = areas.iter().sum::<f64>();
    let total_weight = weights.iter().sum::<f64>();
    if !(total_area > 0.0 && total_area.is_finite() && total_weight > 0.0) { return None }

    let mut bodies = Vec::with_capacity(shapes.len());
    let mut max_error = 1.0_f64;
    let (mut error_sum, mut error_count) = (0.0, 0usize);

    for ((shape, &area), &weight) in shapes.iter().zip(&areas).zip(weights) {
        let desired = total_area * weight / total_weight;
        let radius = (area / PI).sqrt();
        let mass = (desired / PI).sqrt() - radius;

        if area > 0.0 {
            let error = area.max(desired) / area.min(desired);
            max_error = max_error.max(error);
            error_sum += error;
            error_count += 1;
        } else {
            // A collapsed region cannot be measured; it still pulls on the rest.
            max_error = f64::INFINITY;
        }

        if let Some(centroid) = shape.centroid() {
            bodies.push(Body { centroid: centroid.0, radius, mass });
        }
    }

    let mean_error = if error_count > 0 { error_sum / error_count as f64 } else { 1.0 };

    Some(Measure {
        areas,
        max_error,
        bodies,
        force_reduction: 1.0 / (1.0 + mean_error),
    })
}

impl Measure {
    /// Displacement of a single vertex under every region's force.
    fn displacement(&self, p: Coord<f64>) -> Coord<f64> {
        let mut delta = Coord { x: 0.0, y: 0.0 };

        for body in &self.bodies {
            let (dx, dy) = (p.x - body.centroid.x, p.y - body.centroid.y);
            let distance = dx.hypot(dy);
            if distance < EPSILON { continue }

            let force = if distance > body.radius {
                body.mass * body.radius / distance
            } else {
                let ratio = distance / body.radius;
                body.mass * ratio * ratio * (4.0 - 3.0 * ratio)
            };

            delta.x += force * dx / distance;
            delta.y += force * dy / distance;
        }

        Coord { x: delta.x * self.force_reduction, y: delta.y * self.force_reduction }
    }

    /// Move every vertex of `arcs` by its displacement.
    ///
    /// Displacement depends only on the vertex position, so coordinates
    /// shared between arcs move identically.
    pub fn apply(&self, arcs: &[ArcCoords]) -> Vec<ArcCoords> {
        arcs.iter()
            .map(|arc| arc.iter().map(|&p| p + self.displacement(p)).collect())
            .collect()
    }
}
