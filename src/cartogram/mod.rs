//! Area cartograms by rubber-sheet relaxation of the shared arcs
//! (Dougenik, Chrisman & Niemeyer, 1985).
//!
//! Relaxation moves arc vertices, never region rings, so neighbouring regions
//! stay glued together along every shared border.

mod normalize;
mod relax;

use std::collections::BTreeMap;

use geo::MultiPolygon;
use maptopo::{ArcCoords, AttrValue, Topology};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CartogramError, NonConvergence},
    projection::ProjectionState,
};

/// Iteration cap and stopping tolerance for the relaxation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartogramOptions {
    pub max_iterations: usize,
    /// Stop once every region's size error is within `1 + tolerance`.
    pub tolerance: f64,
}

impl Default for CartogramOptions {
    fn default() -> Self {
        Self { max_iterations: 48, tolerance: 0.01 }
    }
}

/// One region of a distorted map.
#[derive(Clone, Debug, PartialEq)]
pub struct DistortedRegion {
    pub id: String,
    /// Attributes of the source region, unchanged.
    pub properties: BTreeMap<String, AttrValue>,
    /// Polygon in device coordinates.
    pub shape: MultiPolygon<f64>,
    pub area: f64,
}

/// Committed cartogram geometry.
///
/// `regions` follows topology order, one entry per topology region.
#[derive(Clone, Debug, PartialEq)]
pub struct CartogramState {
    pub arcs: Vec<ArcCoords>,
    pub regions: Vec<DistortedRegion>,
    /// Relaxation passes applied since the undistorted projection.
    pub iterations: usize,
    /// Largest `max(A, D) / min(A, D)` after the last pass.
    pub max_error: f64,
}

impl CartogramState {
    fn matches_layout(&self, topology: &Topology) -> bool {
        self.arcs.len() == topology.arcs().len()
            && self.arcs.iter().zip(topology.arcs()).all(|(a, b)| a.len() == b.len())
    }
}

/// Result of [`distort`]: the new state plus a non-fatal convergence warning.
#[derive(Clone, Debug, PartialEq)]
pub struct Cartogram {
    pub state: CartogramState,
    pub warning: Option<NonConvergence>,
}

/// Distort `topology` so each region's area is proportional to its value.
///
/// `values` holds one entry per region in topology order.  Relaxation starts
/// from `previous` when its arc layout matches the topology, otherwise from
/// the projected base arcs.  Identical inputs give bit-identical output.
pub fn distort(
    topology: &Topology,
    projection: &ProjectionState,
    values: &[AttrValue],
    previous: Option<&CartogramState>,
    options: &CartogramOptions,
) -> Result<Cartogram, CartogramError> {
    if topology.is_empty() { return Err(CartogramError::Empty) }
    if values.len() != topology.num_regions() {
        return Err(CartogramError::ValueCount { expected: topology.num_regions(), actual: values.len() });
    }

    let weights = normalize::normalize(values);

    let (mut arcs, mut iterations) = match previous.filter(|p| p.matches_layout(topology)) {
        Some(p) => (p.arcs.clone(), p.iterations),
        None => (projection.projector()?.project_arcs(topology)?, 0),
    };

    let mut measure = relax::measure(topology, &arcs, &weights).ok_or(CartogramError::Empty)?;
    let mut passes = 0;

    while measure.max_error - 1.0 >= options.tolerance && passes < options.max_iterations {
        arcs = measure.apply(&arcs);
        measure = relax::measure(topology, &arcs, &weights).ok_or(CartogramError::Empty)?;
        passes += 1;
    }
    iterations += passes;

    let warning = (measure.max_error - 1.0 >= options.tolerance).then(|| {
        let warning = NonConvergence { iterations: passes, max_error: measure.max_error };
        tracing::warn!(%warning, "cartogram stopped at iteration cap");
        warning
    });

    tracing::debug!(passes, iterations, max_error = measure.max_error, "cartogram relaxed");

    let regions = topology.regions().iter().enumerate()
        .zip(topology.shapes(&arcs))
        .map(|((i, region), shape)| DistortedRegion {
            id: region.id.clone(),
            properties: region.properties.clone(),
            shape,
            area: measure.areas[i],
        })
        .collect();

    Ok(Cartogram {
        state: CartogramState { arcs, regions, iterations, max_error: measure.max_error },
        warning,
    })
}

#[cfg(test)]
mod tests {
    use geo::Coord;
    use maptopo::{ArcRef, Region};

    use super::*;
    use crate::projection::{fit, FitOptions, ProjectionKind};

    fn c(x: f64, y: f64) -> Coord<f64> { Coord { x, y } }

    /// Three strips side by side: widths 1, 1 and 2.
    fn strips() -> Topology {
        let arcs = vec![
            vec![c(1.0, 0.0), c(1.0, 2.0)],
            vec![c(2.0, 0.0), c(2.0, 2.0)],
            vec![c(1.0, 2.0), c(0.0, 2.0), c(0.0, 0.0), c(1.0, 0.0)],
            vec![c(2.0, 2.0), c(1.0, 2.0)],
            vec![c(1.0, 0.0), c(2.0, 0.0)],
            vec![c(2.0, 0.0), c(4.0, 0.0), c(4.0, 2.0), c(2.0, 2.0)],
        ];
        let ring = |refs: &[ArcRef]| vec![vec![refs.to_vec()]];
        Topology::new(arcs, vec![
            Region::new("a", ring(&[ArcRef::forward(0), ArcRef::forward(2)])).with_property("pop", 10.0),
            Region::new("b", ring(&[ArcRef::forward(4), ArcRef::forward(1), ArcRef::forward(3), ArcRef::reverse(0)])),
            Region::new("c", ring(&[ArcRef::forward(5), ArcRef::reverse(1)])),
        ]).unwrap()
    }

    fn projection(topology: &Topology) -> ProjectionState {
        fit(topology, 400.0, 200.0, ProjectionKind::NaturalEarth, &FitOptions::default()).unwrap()
    }

    fn shares(state: &CartogramState) -> Vec<f64> {
        let total = state.regions.iter().map(|r| r.area).sum::<f64>();
        state.regions.iter().map(|r| r.area / total).collect()
    }

    fn values(vs: &[f64]) -> Vec<AttrValue> { vs.iter().map(|&v| v.into()).collect() }

    #[test]
    fn distortion_is_idempotent() {
        let topo = strips();
        let proj = projection(&topo);
        let vs = values(&[3.0, 1.0, 8.0]);
        let a = distort(&topo, &proj, &vs, None, &CartogramOptions::default()).unwrap();
        let b = distort(&topo, &proj, &vs, None, &CartogramOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn equal_values_move_toward_equal_areas() {
        let topo = strips();
        let proj = projection(&topo);
        let initial = shares(&distort(&topo, &proj, &values(&[1.0, 1.0, 1.0]), None,
            &CartogramOptions { max_iterations: 0, tolerance: 0.01 }).unwrap().state);
        let relaxed = distort(&topo, &proj, &values(&[1.0, 1.0, 1.0]), None,
            &CartogramOptions { max_iterations: 200, tolerance: 0.01 }).unwrap();

        let target = 1.0 / 3.0;
        let before = initial.iter().map(|s| (s - target).abs()).fold(0.0, f64::max);
        let after = shares(&relaxed.state).iter().map(|s| (s - target).abs()).fold(0.0, f64::max);
        assert!(after < before, "max share deviation {after} not below {before}");
    }

    #[test]
    fn equal_values_converge_to_equal_shares() {
        let topo = strips();
        let proj = projection(&topo);
        let result = distort(&topo, &proj, &values(&[1.0, 1.0, 1.0]), None, &CartogramOptions::default()).unwrap();

        assert!(result.warning.is_none(), "stopped at the cap: {:?}", result.warning);
        assert!(result.state.max_error - 1.0 < 0.01);
        for share in shares(&result.state) {
            assert!((share - 1.0 / 3.0).abs() < 0.01, "share {share} far from 1/3");
        }
    }

    #[test]
    fn unequal_values_approach_target_shares() {
        let topo = strips();
        let proj = projection(&topo);
        let vs = values(&[10.0, 55.0, 100.0]);
        let weights = normalize::normalize(&vs);
        let total = weights.iter().sum::<f64>();
        let targets = weights.iter().map(|w| w / total).collect::<Vec<_>>();

        let deviation = |state: &CartogramState| {
            shares(state).iter().zip(&targets).map(|(s, t)| (s - t).abs()).fold(0.0, f64::max)
        };
        let initial = distort(&topo, &proj, &vs, None, &CartogramOptions { max_iterations: 0, tolerance: 0.01 }).unwrap();
        let relaxed = distort(&topo, &proj, &vs, None, &CartogramOptions { max_iterations: 500, tolerance: 0.01 }).unwrap();

        let (before, after) = (deviation(&initial.state), deviation(&relaxed.state));
        assert!(after < before / 2.0, "max share deviation {after} vs initial {before}");
        let s = shares(&relaxed.state);
        assert!(s[0] < s[1] && s[0] < s[2], "smallest value should hold the smallest share: {s:?}");
    }

    #[test]
    fn larger_value_gets_larger_share() {
        let topo = strips();
        let proj = projection(&topo);
        let result = distort(&topo, &proj, &values(&[9.0, 1.0, 1.0]), None, &CartogramOptions::default()).unwrap();
        let s = shares(&result.state);
        assert!(s[0] > 0.25, "region a should grow from its initial quarter, got {}", s[0]);
        assert!(s[0] > s[1]);
    }

    #[test]
    fn converged_input_is_left_in_place() {
        // Equal weights leave size errors of about 4/3 and 3/2, inside a loose tolerance.
        let topo = strips();
        let proj = projection(&topo);
        let options = CartogramOptions { max_iterations: 48, tolerance: 0.6 };
        let base = proj.projector().unwrap().project_arcs(&topo).unwrap();

        let result = distort(&topo, &proj, &values(&[5.0, 5.0, 5.0]), None, &options).unwrap();
        assert_eq!(result.state.iterations, 0);
        assert_eq!(result.state.arcs, base);
        assert!(result.warning.is_none());
    }

    #[test]
    fn iteration_cap_yields_warning_not_error() {
        let topo = strips();
        let proj = projection(&topo);
        let options = CartogramOptions { max_iterations: 2, tolerance: 1e-9 };
        let result = distort(&topo, &proj, &values(&[1.0, 50.0, 100.0]), None, &options).unwrap();
        let warning = result.warning.unwrap();
        assert_eq!(warning.iterations, 2);
        assert_eq!(result.state.iterations, 2);
    }

    #[test]
    fn seeding_from_previous_accumulates_iterations() {
        let topo = strips();
        let proj = projection(&topo);
        let options = CartogramOptions { max_iterations: 3, tolerance: 1e-9 };
        let vs = values(&[1.0, 50.0, 100.0]);
        let first = distort(&topo, &proj, &vs, None, &options).unwrap();
        let second = distort(&topo, &proj, &vs, Some(&first.state), &options).unwrap();
        assert_eq!(first.state.iterations, 3);
        assert_eq!(second.state.iterations, 6);
        assert_ne!(second.state.arcs, first.state.arcs);
    }

    #[test]
    fn zero_and_na_keep_every_region() {
        let topo = strips();
        let proj = projection(&topo);
        let vs = vec![AttrValue::Number(0.0), AttrValue::Missing, AttrValue::Number(50.0)];
        let result = distort(&topo, &proj, &vs, None, &CartogramOptions::default()).unwrap();

        let ids = result.state.regions.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(result.state.regions.iter().all(|r| r.area.is_finite() && r.area >= 0.0));
        assert_eq!(result.state.regions[0].properties.get("pop"), Some(&AttrValue::Number(10.0)));
    }

    #[test]
    fn value_count_must_match_regions() {
        let topo = strips();
        let proj = projection(&topo);
        assert_eq!(
            distort(&topo, &proj, &values(&[1.0]), None, &CartogramOptions::default()),
            Err(CartogramError::ValueCount { expected: 3, actual: 1 }),
        );
    }

    #[test]
    fn empty_topology_is_rejected() {
        let topo = Topology::new(vec![], vec![]).unwrap();
        let proj = ProjectionState { kind: ProjectionKind::Mercator, scale: 1.0, translate: [0.0, 0.0] };
        assert_eq!(distort(&topo, &proj, &[], None, &CartogramOptions::default()), Err(CartogramError::Empty));
    }
}
