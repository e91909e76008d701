#![doc = "Cartomap public API: thematic maps, cartograms and live restyling"]
pub mod cartogram;
pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod projection;
pub mod render;

#[doc(inline)]
pub use maptopo::{ArcCoords, ArcRef, AttrValue, Region, Topology, TopologyError};

#[doc(inline)]
pub use projection::{fit, FitOptions, ProjectionKind, ProjectionState};

#[doc(inline)]
pub use classify::{classify, Color, LegendDescriptor, LegendOptions, ScaleConfig, ScaleSpec};

#[doc(inline)]
pub use cartogram::{distort, Cartogram, CartogramOptions, CartogramState};

#[doc(inline)]
pub use config::{MapConfig, MapOptions};

#[doc(inline)]
pub use event::{update_channel, UpdateEvent, UpdateReceiver, UpdateSender};

#[doc(inline)]
pub use render::{RenderCoordinator, RenderSink, Scene, TransitionDescriptor, Viewport};
