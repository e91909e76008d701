use geo::{MultiLineString, MultiPolygon};
use serde::Serialize;

use crate::{
    classify::{Color, LegendDescriptor},
    config::{Labels, Stroke, ZoomOptions},
    render::path::{lines_to_path, multipolygon_to_path},
};

/// One region as handed to the rendering boundary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedRegion {
    pub id: String,
    /// Device-space geometry; `path` is derived from it.
    #[serde(skip)]
    pub shape: MultiPolygon<f64>,
    pub path: String,
    pub fill: Color,
    pub tooltip: Option<String>,
}

impl RenderedRegion {
    pub fn new(id: impl Into<String>, shape: MultiPolygon<f64>, fill: Color, tooltip: Option<String>) -> Self {
        let path = multipolygon_to_path(&shape);
        Self { id: id.into(), shape, path, fill, tooltip }
    }
}

/// A fully resolved frame: geometry, colors and decorations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    /// Regions in topology order.
    pub regions: Vec<RenderedRegion>,
    /// Interior borders between neighbouring regions.
    #[serde(skip)]
    pub mesh: MultiLineString<f64>,
    pub mesh_path: String,
    pub legend: Option<LegendDescriptor>,
    pub labels: Labels,
    pub stroke: Stroke,
    pub zoom: Option<ZoomOptions>,
}

impl Scene {
    pub(crate) fn set_mesh(&mut self, mesh: MultiLineString<f64>) {
        self.mesh_path = lines_to_path(&mesh);
        self.mesh = mesh;
    }

    pub fn region(&self, id: &str) -> Option<&RenderedRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// `(id, path, fill)` for every region, in topology order.
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, &Color)> + '_ {
        self.regions.iter().map(|r| (r.id.as_str(), r.path.as_str(), &r.fill))
    }

    pub fn fills(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.fill.as_str()).collect()
    }
}
