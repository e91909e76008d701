use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

/// The vertices of one arc: a polyline shared by at most two region rings.
pub type ArcCoords = Vec<Coord<f64>>;

/// A reference from a region ring to an arc.
///
/// Non-negative values index the arc directly.  A negative value `!i` (the
/// ones' complement of `i`) references arc `i` traversed in reverse, so
/// `-1` is arc 0 backwards, `-2` is arc 1 backwards, and so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcRef(pub i32);

impl ArcRef {
    /// Reference arc `index` in its stored direction.
    pub fn forward(index: usize) -> Self { Self(index as i32) }

    /// Reference arc `index` traversed backwards.
    pub fn reverse(index: usize) -> Self { Self(!(index as i32)) }

    /// Index of the underlying arc.
    #[inline]
    pub fn index(self) -> usize {
        if self.0 < 0 { (!self.0) as usize } else { self.0 as usize }
    }

    /// Returns `true` if the arc is traversed against its stored direction.
    #[inline]
    pub fn is_reversed(self) -> bool { self.0 < 0 }
}

impl fmt::Display for ArcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reversed() {
            write!(f, "ArcRef(~{})", self.index())
        } else {
            write!(f, "ArcRef({})", self.index())
        }
    }
}

/// Append the coordinates of `arc` to `ring`, dropping the first vertex when
/// it repeats the ring's current last vertex.
pub(crate) fn extend_ring(ring: &mut Vec<Coord<f64>>, arc: &[Coord<f64>], reversed: bool) {
    let mut push = |c: Coord<f64>| {
        if ring.last() != Some(&c) { ring.push(c) }
    };

    if reversed {
        arc.iter().rev().copied().for_each(&mut push);
    } else {
        arc.iter().copied().for_each(&mut push);
    }
}
