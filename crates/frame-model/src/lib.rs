//! Glance Frame Model
//!
//! Defines the data contracts shared by every stage of the pipeline:
//! - **Geometry:** Capture rectangles, crop margins, scaling and letterbox math
//! - **Frames:** Raw pixel buffers as produced by capture backends
//! - **Settings:** Live-tunable effect settings and backend selection
//! - **Blobs:** Motion-analysis parameters, overlay styling and results
//!
//! Rectangles are in absolute screen coordinates (`right`/`bottom`
//! exclusive); frames and blob boxes are in pixel coordinates of the
//! frame they were computed from.

pub mod blob;
pub mod frame;
pub mod geometry;
pub mod settings;

pub use blob::*;
pub use frame::*;
pub use geometry::*;
pub use settings::*;
