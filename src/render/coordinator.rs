use anyhow::{Context, Result};
use geo::MultiLineString;
use maptopo::{ArcCoords, AttrValue, Topology};

use crate::{
    cartogram::{distort, CartogramState},
    classify::{Color, LegendOptions, ScaleConfig, DEFAULT_NA_COLOR},
    config::{MapConfig, DEFAULT_FILL},
    error::{CoordinatorError, MissingAttribute},
    event::{ScaleUpdate, UpdateEvent, UpdateReceiver, ValuesUpdate},
    projection::{fit, ProjectionState},
    render::{
        scene::{RenderedRegion, Scene},
        sink::RenderSink,
        transition::TransitionDescriptor,
    },
};

/// Viewport size in device units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

/// Lifecycle of a [`RenderCoordinator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    Fitted,
    Rendered,
    Updating,
}

// ---------------------------------------------------------------------------
// Live state
// ---------------------------------------------------------------------------

/// Everything updates may change.  Updates build a new copy and swap it in
/// only once the whole update has succeeded.
#[derive(Clone, Debug)]
struct LiveState {
    variable: Option<String>,
    scale: Option<ScaleConfig>,
    /// Color (and cartogram) values in topology order.
    values: Vec<AttrValue>,
    tooltips: Vec<Option<String>>,
    legend: LegendOptions,
    cartogram: Option<CartogramState>,
}

/// Values of `variable` for every region, NA where the attribute is absent.
fn read_values(topology: &Topology, variable: Option<&str>) -> Vec<AttrValue> {
    let Some(variable) = variable else { return vec![AttrValue::Missing; topology.num_regions()] };

    topology.regions().iter()
        .map(|region| match region.attribute(variable) {
            Some(value) => value.clone(),
            None => {
                let missing = MissingAttribute { region: region.id.clone(), attribute: variable.to_string() };
                tracing::debug!(%missing, "rendering region as NA");
                AttrValue::Missing
            }
        })
        .collect()
}

fn tooltip_text(value: &AttrValue) -> Option<String> {
    (!value.is_na()).then(|| value.to_string())
}

/// Finite extent of `values`, used to close open legend bins.
fn value_range(values: &[AttrValue]) -> Option<[f64; 2]> {
    values.iter().filter_map(AttrValue::as_number).fold(None, |acc, v| match acc {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}

impl LiveState {
    fn initial(config: &MapConfig, topology: &Topology) -> Self {
        let variable = config.color.as_ref().map(|c| c.variable.clone());
        let tooltips = (0..topology.num_regions())
            .map(|i| config.tooltips.as_ref().and_then(|t| t.get(i)).and_then(tooltip_text))
            .collect();

        Self {
            values: read_values(topology, variable.as_deref()),
            variable,
            scale: config.color.as_ref().map(|c| c.scale.clone()),
            tooltips,
            legend: config.legend.clone().unwrap_or_default(),
            cartogram: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the committed map state and turns update events into transitions.
pub struct RenderCoordinator {
    config: MapConfig,
    phase: Phase,
    topology: Option<Topology>,
    viewport: Viewport,
    projection: Option<ProjectionState>,
    /// Projected, undistorted arcs.
    base_arcs: Vec<ArcCoords>,
    live: Option<LiveState>,
    scene: Option<Scene>,
    seq: u64,
}

impl RenderCoordinator {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            phase: Phase::Uninitialized,
            topology: None,
            viewport: Viewport::new(0.0, 0.0),
            projection: None,
            base_arcs: Vec::new(),
            live: None,
            scene: None,
            seq: 0,
        }
    }

    #[inline] pub fn phase(&self) -> Phase { self.phase }

    #[inline] pub fn config(&self) -> &MapConfig { &self.config }

    #[inline] pub fn projection(&self) -> Option<&ProjectionState> { self.projection.as_ref() }

    /// The committed scene, once rendered.
    #[inline] pub fn scene(&self) -> Option<&Scene> { self.scene.as_ref() }

    /// Attribute currently driving colors (and cartogram sizes).
    pub fn color_variable(&self) -> Option<&str> {
        self.live.as_ref().and_then(|live| live.variable.as_deref())
    }

    /// The committed cartogram, in cartogram mode.
    pub fn cartogram(&self) -> Option<&CartogramState> {
        self.live.as_ref().and_then(|live| live.cartogram.as_ref())
    }

    /// Fit `topology` into `viewport`.
    ///
    /// May be called again (e.g. after a resize); a map with the same region
    /// ids keeps its live scale and values but must be rendered again.
    pub fn fit(&mut self, topology: Topology, viewport: Viewport) -> Result<&ProjectionState> {
        let state = fit(&topology, viewport.width, viewport.height, self.config.projection, &self.config.fit)
            .context("[render] failed to fit projection")?;
        let base_arcs = state.projector()
            .and_then(|p| p.project_arcs(&topology))
            .context("[render] failed to project topology")?;

        let same_regions = self.topology.as_ref().is_some_and(|old| old.ids().eq(topology.ids()));
        if !same_regions { self.live = None }
        if let Some(live) = &mut self.live { live.cartogram = None }

        tracing::info!(regions = topology.num_regions(), width = viewport.width, height = viewport.height, "fitted map");

        self.topology = Some(topology);
        self.viewport = viewport;
        self.base_arcs = base_arcs;
        self.scene = None;
        self.phase = Phase::Fitted;
        Ok(&*self.projection.insert(state))
    }

    /// Classify every region (distorting first in cartogram mode) and commit
    /// the resulting scene.
    pub fn render(&mut self) -> Result<Scene> {
        let topology = self.topology.as_ref().ok_or(CoordinatorError::NotFitted)?;
        let projection = self.projection.as_ref().ok_or(CoordinatorError::NotFitted)?;

        let mut live = match &self.live {
            Some(live) => live.clone(),
            None => LiveState::initial(&self.config, topology),
        };

        if let Some(options) = self.config.cartogram.as_ref().filter(|_| live.cartogram.is_none()) {
            let cartogram = distort(topology, projection, &live.values, None, options)
                .context("[render] cartogram failed")?;
            live.cartogram = Some(cartogram.state);
        }

        let scene = self.build_scene(topology, &live);
        self.live = Some(live);
        self.scene = Some(scene.clone());
        self.phase = Phase::Rendered;

        tracing::info!(regions = scene.regions.len(), "rendered map");
        Ok(scene)
    }

    /// Render and hand the scene to `sink`.
    pub fn draw(&mut self, sink: &mut impl RenderSink) -> Result<()> {
        let scene = self.render()?;
        sink.draw(&scene)
    }

    fn build_scene(&self, topology: &Topology, live: &LiveState) -> Scene {
        let arcs = live.cartogram.as_ref().map_or(self.base_arcs.as_slice(), |c| c.arcs.as_slice());
        let default_fill = Color::from(DEFAULT_FILL);

        let regions = topology.regions().iter().enumerate()
            .zip(topology.shapes(arcs))
            .map(|((i, region), shape)| {
                let fill = match &live.scale {
                    Some(scale) => scale.classify_or_na(&live.values[i]),
                    None => default_fill.clone(),
                };
                RenderedRegion::new(region.id.clone(), shape, fill, live.tooltips[i].clone())
            })
            .collect();

        let legend = self.config.legend.as_ref()
            .and(live.scale.as_ref())
            .map(|scale| scale.legend(&live.legend, value_range(&live.values)));

        let mut scene = Scene {
            width: self.viewport.width,
            height: self.viewport.height,
            regions,
            mesh: MultiLineString(Vec::new()),
            mesh_path: String::new(),
            legend,
            labels: self.config.labels.clone(),
            stroke: self.config.stroke.clone(),
            zoom: self.config.zoom,
        };
        scene.set_mesh(topology.mesh(arcs));
        scene
    }

    /// Apply one update event and commit the result.
    ///
    /// The transition starts from the committed scene, so a superseding update
    /// begins where the previous transition ends.  On error nothing is
    /// committed and the coordinator stays `Rendered`.
    pub fn apply_update(&mut self, event: UpdateEvent) -> Result<TransitionDescriptor> {
        match self.phase {
            Phase::Rendered => {}
            Phase::Uninitialized => return Err(CoordinatorError::NotFitted.into()),
            Phase::Fitted | Phase::Updating => return Err(CoordinatorError::NotRendered.into()),
        }

        let kind = event.kind();
        self.phase = Phase::Updating;
        let prepared = self.prepare(event);
        self.phase = Phase::Rendered;

        let (live, scene) = prepared.with_context(|| format!("[update] failed to apply {kind}"))?;
        let start = self.scene.replace(scene.clone()).ok_or(CoordinatorError::NotRendered)?;
        self.live = Some(live);
        self.seq += 1;

        tracing::debug!(seq = self.seq, kind, "committed update");
        Ok(TransitionDescriptor::new(self.seq, start, scene))
    }

    fn prepare(&self, event: UpdateEvent) -> Result<(LiveState, Scene)> {
        let topology = self.topology.as_ref().ok_or(CoordinatorError::NotFitted)?;
        let projection = self.projection.as_ref().ok_or(CoordinatorError::NotFitted)?;
        let mut live = self.live.clone().ok_or(CoordinatorError::NotRendered)?;

        match event {
            UpdateEvent::UpdateScale(ScaleUpdate { color_var, na_color, scale }) => {
                let na_color = na_color
                    .or_else(|| live.scale.as_ref().map(|s| s.na_color().clone()))
                    .unwrap_or_else(|| Color::from(DEFAULT_NA_COLOR));
                live.scale = Some(ScaleConfig::new(scale, na_color)?);
                // Switching variables resizes a cartogram, which a scale update must not do.
                if let Some(variable) = color_var.filter(|v| live.variable.as_deref() != Some(v.as_str())) {
                    if self.config.cartogram.is_some() {
                        return Err(CoordinatorError::CartogramVariable(variable).into());
                    }
                    live.values = read_values(topology, Some(&variable));
                    live.variable = Some(variable);
                }
            }
            UpdateEvent::UpdateValues(ValuesUpdate { values, variable, tooltip }) => {
                if let Some(variable) = variable {
                    live.values = read_values(topology, Some(&variable));
                    live.variable = Some(variable);
                }
                for (id, value) in values {
                    let i = topology.region_index(&id).ok_or(CoordinatorError::UnknownRegion(id))?;
                    live.values[i] = value;
                }
                for (id, value) in tooltip.into_iter().flatten() {
                    let i = topology.region_index(&id).ok_or(CoordinatorError::UnknownRegion(id))?;
                    live.tooltips[i] = tooltip_text(&value);
                }
                if let Some(options) = &self.config.cartogram {
                    let cartogram = distort(topology, projection, &live.values, live.cartogram.as_ref(), options)?;
                    live.cartogram = Some(cartogram.state);
                }
            }
            UpdateEvent::UpdateLegend(update) => {
                live.legend = update.apply(&live.legend);
            }
        }

        let scene = self.build_scene(topology, &live);
        Ok((live, scene))
    }

    /// Apply one event and forward the transition to `sink`.  Rejected
    /// updates are logged and leave the map unchanged.
    fn handle(&mut self, event: UpdateEvent, sink: &mut impl RenderSink, processed: &mut Processed) {
        let kind = event.kind();
        let result = self.apply_update(event)
            .and_then(|transition| sink.transition(&transition));
        match result {
            Ok(()) => processed.applied += 1,
            Err(error) => {
                let message = format!("{error:#}");
                tracing::warn!(error = %message, kind, "update rejected");
                processed.rejected.push(Rejected { kind, error });
            }
        }
    }

    /// Drain every queued event in arrival order.
    pub fn process(&mut self, receiver: &mut UpdateReceiver, sink: &mut impl RenderSink) -> Processed {
        let mut processed = Processed::default();
        while let Some(event) = receiver.try_recv() {
            self.handle(event, sink, &mut processed);
        }
        processed
    }

    /// Apply events as they arrive until every sender is dropped.
    pub async fn run(&mut self, mut receiver: UpdateReceiver, sink: &mut impl RenderSink) -> Processed {
        let mut processed = Processed::default();
        while let Some(event) = receiver.recv().await {
            self.handle(event, sink, &mut processed);
        }
        tracing::debug!(applied = processed.applied, rejected = processed.rejected.len(), "update bus closed");
        processed
    }
}

/// Outcome of draining the update bus.
#[derive(Debug, Default)]
pub struct Processed {
    pub applied: usize,
    /// Rejected events in arrival order.
    pub rejected: Vec<Rejected>,
}

/// An update that left the map unchanged, and why.
#[derive(Debug)]
pub struct Rejected {
    pub kind: &'static str,
    pub error: anyhow::Error,
}

#[cfg(test)]
mod tests {
    use geo::Coord;
    use maptopo::{ArcRef, Region};

    use super::*;
    use crate::{classify::ScaleSpec, config::ColorConfig};

    fn c(x: f64, y: f64) -> Coord<f64> { Coord { x, y } }

    fn pair() -> Topology {
        let arcs = vec![
            vec![c(1.0, 0.0), c(1.0, 1.0)],
            vec![c(1.0, 1.0), c(0.0, 1.0), c(0.0, 0.0), c(1.0, 0.0)],
            vec![c(1.0, 0.0), c(2.0, 0.0), c(2.0, 1.0), c(1.0, 1.0)],
        ];
        Topology::new(arcs, vec![
            Region::new("w", vec![vec![vec![ArcRef::forward(0), ArcRef::forward(1)]]]).with_property("v", 1.0),
            Region::new("e", vec![vec![vec![ArcRef::forward(2), ArcRef::reverse(0)]]]),
        ]).unwrap()
    }

    fn threshold_config() -> MapConfig {
        let spec = ScaleSpec::Threshold { breaks: vec![5.0], colors: vec!["#000".into(), "#fff".into()], range: None };
        MapConfig {
            color: Some(ColorConfig { variable: "v".into(), scale: ScaleConfig::new(spec, "#ccc".into()).unwrap() }),
            ..Default::default()
        }
    }

    #[test]
    fn phases_follow_the_lifecycle() {
        let mut coordinator = RenderCoordinator::new(MapConfig::default());
        assert_eq!(coordinator.phase(), Phase::Uninitialized);
        let err = coordinator.render().unwrap_err();
        assert_eq!(err.downcast_ref::<CoordinatorError>(), Some(&CoordinatorError::NotFitted));

        coordinator.fit(pair(), Viewport::new(200.0, 100.0)).unwrap();
        assert_eq!(coordinator.phase(), Phase::Fitted);
        let err = coordinator.apply_update(UpdateEvent::UpdateValues(ValuesUpdate::default())).unwrap_err();
        assert_eq!(err.downcast_ref::<CoordinatorError>(), Some(&CoordinatorError::NotRendered));

        coordinator.render().unwrap();
        assert_eq!(coordinator.phase(), Phase::Rendered);
    }

    #[test]
    fn regions_without_scale_use_default_fill() {
        let mut coordinator = RenderCoordinator::new(MapConfig::default());
        coordinator.fit(pair(), Viewport::new(200.0, 100.0)).unwrap();
        let scene = coordinator.render().unwrap();
        assert_eq!(scene.fills(), vec![DEFAULT_FILL, DEFAULT_FILL]);
        assert!(!scene.mesh_path.is_empty());
    }

    #[test]
    fn missing_attribute_renders_as_na() {
        let mut coordinator = RenderCoordinator::new(threshold_config());
        coordinator.fit(pair(), Viewport::new(200.0, 100.0)).unwrap();
        let scene = coordinator.render().unwrap();
        assert_eq!(scene.fills(), vec!["#000", "#ccc"]);
    }

    #[test]
    fn unknown_region_leaves_state_untouched() {
        let mut coordinator = RenderCoordinator::new(threshold_config());
        coordinator.fit(pair(), Viewport::new(200.0, 100.0)).unwrap();
        let before = coordinator.render().unwrap();

        let mut values = std::collections::BTreeMap::new();
        values.insert("w".to_string(), AttrValue::Number(9.0));
        values.insert("nowhere".to_string(), AttrValue::Number(1.0));
        let err = coordinator.apply_update(UpdateEvent::UpdateValues(ValuesUpdate { values, ..Default::default() })).unwrap_err();

        assert!(format!("{err:#}").contains("nowhere"));
        assert_eq!(coordinator.phase(), Phase::Rendered);
        assert_eq!(coordinator.scene(), Some(&before));
    }

    #[test]
    fn refit_keeps_live_scale_for_same_regions() {
        let mut coordinator = RenderCoordinator::new(threshold_config());
        coordinator.fit(pair(), Viewport::new(200.0, 100.0)).unwrap();
        coordinator.render().unwrap();

        let mut values = std::collections::BTreeMap::new();
        values.insert("e".to_string(), AttrValue::Number(7.0));
        coordinator.apply_update(UpdateEvent::UpdateValues(ValuesUpdate { values, ..Default::default() })).unwrap();

        coordinator.fit(pair(), Viewport::new(400.0, 200.0)).unwrap();
        assert_eq!(coordinator.phase(), Phase::Fitted);
        assert!(coordinator.scene().is_none());
        let scene = coordinator.render().unwrap();
        assert_eq!(scene.fills(), vec!["#000", "#fff"]);
        assert_eq!(scene.width, 400.0);
    }
}
