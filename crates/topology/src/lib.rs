pub mod arc;
pub mod region;
pub mod topology;
pub mod value;

pub use arc::{ArcCoords, ArcRef};
pub use region::Region;
pub use topology::{Topology, TopologyError};
pub use value::AttrValue;
