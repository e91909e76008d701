//! Render coordination: committed scenes, update transitions and the
//! outward render calls.

mod coordinator;
mod path;
mod scene;
mod sink;
mod transition;

pub use coordinator::{Phase, Processed, Rejected, RenderCoordinator, Viewport};
pub use scene::{RenderedRegion, Scene};
pub use sink::{scene_to_svg, RenderSink, SvgPreviewSink};
pub use transition::{Easing, TransitionDescriptor, TRANSITION_DURATION};
