//! Composition domain module: cover-fit geometry and slide timing

mod plan;
mod timing;

pub use plan::{cover_fit, CompositionPlan, Dimensions, Placement};
pub use timing::{FrameRate, SlideSchedule, DEFAULT_FRAME_RATE};
