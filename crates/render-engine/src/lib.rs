//! Glance Render Engine
//!
//! Live display side of the mirror: the fixed-interval render loop, the
//! motion overlay painter and the display surface seam.
//!
//! # Tick
//!
//! ```text
//! WindowProvider ── rect ──► CaptureSource ── frame ──┬──► MotionTracker (worker)
//!                                                     │          │ latest result
//!                                                     ▼          ▼
//!                                          FrameProcessor ──► overlay ──► DisplaySurface
//!                                          (or GPU texture + cached overlay layer)
//! ```

pub mod font;
pub mod gpu;
pub mod links;
pub mod overlay;
pub mod paint;
pub mod render_loop;
pub mod surface;

pub use gpu::{Shading, FRAGMENT_SHADER, VERTEX_SHADER};
pub use links::link_pairs;
pub use overlay::{draw_raster_overlay, paint_overlay, GpuOverlayCache, OverlayTransform};
pub use render_loop::{RenderLoop, TickOutcome, TickReport};
pub use surface::{fit_to_viewport, DisplaySurface, HeadlessSurface, Presented};
