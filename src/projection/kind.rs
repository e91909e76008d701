use geo::Coord;
use proj4rs::{proj::Proj as Proj4, transform::transform};
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// The fixed set of supported map projections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionKind {
    Mercator,
    ConicEqualArea,
    NaturalEarth,
    #[default]
    Albers,
}

/// Mercator is clipped at the latitude where the map becomes square.
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Geographic source CRS on the same unit sphere as every target.
const UNIT_SPHERE_LONGLAT: &str = "+proj=longlat +a=1 +b=1 +no_defs";

impl ProjectionKind {
    /// PROJ.4 definition on a unit sphere, or `None` when computed directly.
    fn proj4(self) -> Option<&'static str> {
        match self {
            Self::Mercator => Some("+proj=merc +a=1 +b=1 +no_defs"),
            Self::ConicEqualArea => Some("+proj=aea +lat_1=0 +lat_2=60 +a=1 +b=1 +no_defs"),
            Self::Albers => Some("+proj=aea +lat_1=29.5 +lat_2=45.5 +lat_0=37.5 +lon_0=-96 +a=1 +b=1 +no_defs"),
            Self::NaturalEarth => None,
        }
    }
}

enum Backend {
    Proj { from: Proj4, to: Proj4 },
    NaturalEarth,
}

/// A projection at unit scale and zero translation, producing y-down
/// screen coordinates.
pub(crate) struct RawProjection {
    kind: ProjectionKind,
    backend: Backend,
}

impl RawProjection {
    pub(crate) fn new(kind: ProjectionKind) -> Result<Self, FitError> {
        let backend = match kind.proj4() {
            Some(definition) => {
                let build = |s: &str| Proj4::from_proj_string(s)
                    .map_err(|e| FitError::Projection(format!("failed to build PROJ.4 {s:?}: {e}")));
                Backend::Proj { from: build(UNIT_SPHERE_LONGLAT)?, to: build(definition)? }
            }
            None => Backend::NaturalEarth,
        };
        Ok(Self { kind, backend })
    }

    /// Project a lon/lat coordinate (degrees).
    pub(crate) fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>, FitError> {
        let lat = match self.kind {
            ProjectionKind::Mercator => coord.y.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT),
            _ => coord.y,
        };
        let (lambda, phi) = (coord.x.to_radians(), lat.to_radians());

        let (x, y) = match &self.backend {
            Backend::Proj { from, to } => {
                let mut point = (lambda, phi, 0.0);
                transform(from, to, &mut point)
                    .map_err(|e| FitError::Projection(format!("({}, {}): {e}", coord.x, coord.y)))?;
                (point.0, point.1)
            }
            Backend::NaturalEarth => natural_earth(lambda, phi),
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(FitError::Projection(format!("({}, {}) projects to a non-finite point", coord.x, coord.y)));
        }

        // Screen space grows downward.
        Ok(Coord { x, y: -y })
    }
}

/// Natural Earth I (Šavrič, Jenny, Patterson, Petrovič, Hurni 2011), radians in.
fn natural_earth(lambda: f64, phi: f64) -> (f64, f64) {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    let x = lambda * (0.8707 - 0.131979 * phi2 + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4)));
    let y = phi * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)));
    (x, y)
}
