use ahash::AHashMap;
use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon, Rect};
use serde::Deserialize;

use crate::{arc::{extend_ring, ArcCoords, ArcRef}, region::Region};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when constructing a `Topology`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    /// A region ring references an arc index that does not exist.
    #[error("region {region:?} references arc {arc}, but the topology has {len} arcs")]
    MissingArc { region: String, arc: usize, len: usize },
    /// Two regions share the same identifier.
    #[error("duplicate region id {0:?}")]
    DuplicateRegion(String),
    /// A region contains a ring with no arcs.
    #[error("region {0:?} contains an empty ring")]
    EmptyRing(String),
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// Serialized form: arcs as `[x, y]` pairs plus the region collection.
#[derive(Deserialize)]
struct TopologyData {
    arcs: Vec<Vec<[f64; 2]>>,
    regions: Vec<Region>,
}

/// A set of shared boundary arcs and the regions built from them.
///
/// Arcs are stored in lon/lat.  Geometry helpers accept any arc set with the
/// same layout as `arcs()` (projected or distorted copies), so derived shapes
/// stay keyed by the same region indices.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "TopologyData")]
pub struct Topology {
    arcs: Vec<ArcCoords>,
    regions: Vec<Region>,
    index: AHashMap<String, usize>,
}

impl TryFrom<TopologyData> for Topology {
    type Error = TopologyError;

    fn try_from(data: TopologyData) -> Result<Self, Self::Error> {
        let arcs = data.arcs.into_iter()
            .map(|arc| arc.into_iter().map(|[x, y]| Coord { x, y }).collect())
            .collect();
        Self::new(arcs, data.regions)
    }
}

impl Topology {
    /// Build a topology, checking that every arc reference resolves and that
    /// region ids are unique.
    pub fn new(arcs: Vec<ArcCoords>, regions: Vec<Region>) -> Result<Self, TopologyError> {
        let mut index = AHashMap::with_capacity(regions.len());

        for (i, region) in regions.iter().enumerate() {
            if index.insert(region.id.clone(), i).is_some() {
                return Err(TopologyError::DuplicateRegion(region.id.clone()));
            }
            for ring in region.polygons.iter().flatten() {
                if ring.is_empty() { return Err(TopologyError::EmptyRing(region.id.clone())) }
            }
            if let Some(bad) = region.arc_refs().find(|r| r.index() >= arcs.len()) {
                return Err(TopologyError::MissingArc {
                    region: region.id.clone(),
                    arc: bad.index(),
                    len: arcs.len(),
                });
            }
        }

        Ok(Self { arcs, regions, index })
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    #[inline] pub fn arcs(&self) -> &[ArcCoords] { &self.arcs }

    #[inline] pub fn regions(&self) -> &[Region] { &self.regions }

    #[inline] pub fn num_regions(&self) -> usize { self.regions.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    /// Position of the region with identifier `id`.
    #[inline]
    pub fn region_index(&self, id: &str) -> Option<usize> { self.index.get(id).copied() }

    /// Region identifiers in topology order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.regions.iter().map(|region| region.id.as_str())
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Transform every arc vertex, preserving the arc layout.
    pub fn map_arcs<E>(&self, mut f: impl FnMut(Coord<f64>) -> Result<Coord<f64>, E>) -> Result<Vec<ArcCoords>, E> {
        self.arcs.iter()
            .map(|arc| arc.iter().map(|&c| f(c)).collect())
            .collect()
    }

    /// Assemble one ring from `arcs`.
    pub fn ring(ring: &[ArcRef], arcs: &[ArcCoords]) -> LineString<f64> {
        let mut coords = Vec::new();
        for r in ring {
            extend_ring(&mut coords, &arcs[r.index()], r.is_reversed());
        }
        LineString::from(coords)
    }

    /// Shape of region `region`, assembled from `arcs`.
    ///
    /// `arcs` must share the layout of `self.arcs()`.
    pub fn shape(&self, region: usize, arcs: &[ArcCoords]) -> MultiPolygon<f64> {
        debug_assert_eq!(arcs.len(), self.arcs.len(), "arc layout mismatch");

        let polygons = self.regions[region].polygons.iter()
            .filter_map(|rings| {
                let (exterior, holes) = rings.split_first()?;
                Some(Polygon::new(
                    Self::ring(exterior, arcs),
                    holes.iter().map(|hole| Self::ring(hole, arcs)).collect(),
                ))
            })
            .collect::<Vec<_>>();

        MultiPolygon(polygons)
    }

    /// Shapes of all regions, in topology order.
    pub fn shapes(&self, arcs: &[ArcCoords]) -> Vec<MultiPolygon<f64>> {
        (0..self.regions.len()).map(|i| self.shape(i, arcs)).collect()
    }

    /// Indices of arcs that separate two distinct regions.
    pub fn interior_arcs(&self) -> Vec<usize> {
        let mut owners: Vec<Option<usize>> = vec![None; self.arcs.len()];
        let mut interior = vec![false; self.arcs.len()];

        for (i, region) in self.regions.iter().enumerate() {
            for r in region.arc_refs() {
                match owners[r.index()] {
                    None => owners[r.index()] = Some(i),
                    Some(owner) if owner != i => interior[r.index()] = true,
                    Some(_) => {}
                }
            }
        }

        interior.iter().enumerate()
            .filter_map(|(i, &shared)| shared.then_some(i))
            .collect()
    }

    /// Interior borders (arcs shared by two distinct regions) built from `arcs`.
    pub fn mesh(&self, arcs: &[ArcCoords]) -> MultiLineString<f64> {
        MultiLineString(
            self.interior_arcs().into_iter()
                .map(|i| LineString::from(arcs[i].clone()))
                .collect()
        )
    }

    /// Bounding rectangle of an arc set, or `None` if it has no vertices.
    pub fn bounds_of(arcs: &[ArcCoords]) -> Option<Rect<f64>> {
        let mut coords = arcs.iter().flatten();
        let first = *coords.next()?;
        let (min, max) = coords.fold((first, first), |(min, max), c| (
            Coord { x: min.x.min(c.x), y: min.y.min(c.y) },
            Coord { x: max.x.max(c.x), y: max.y.max(c.y) },
        ));
        Some(Rect::new(min, max))
    }

    /// Bounding rectangle of the base arcs in lon/lat.
    #[inline]
    pub fn bounds(&self) -> Option<Rect<f64>> { Self::bounds_of(&self.arcs) }
}
