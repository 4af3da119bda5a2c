//! Glance Processing Core
//!
//! Turns captured frames into something worth looking at:
//! - **Effects:** scaling plus brightness/contrast through a ladder of
//!   interchangeable numeric stages, and raw BGRA output for the GPU path
//! - **Motion:** frame differencing and blob extraction
//! - **Tracker:** the single background worker that runs motion analysis
//!   without ever blocking the render loop
//!
//! No platform dependencies: frames in, images and boxes out.

pub mod convert;
pub mod effects;
pub mod motion;
pub mod tracker;

pub use effects::{ColorAdjust, FrameProcessor, GpuFrame, Stage};
pub use motion::{MotionResult, TrackerState};
pub use tracker::{MotionTracker, TrackerStats};
