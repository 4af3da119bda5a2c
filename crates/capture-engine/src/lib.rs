//! Glance Capture Engine
//!
//! Turns a target window into raw frames. The region resolver computes the
//! absolute rectangle to grab; the [`CaptureSource`] dispatcher routes each
//! grab to one of three backends and falls back to software capture when a
//! faster backend cannot start or stops producing frames.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                  CaptureSource                    │
//! │  ┌──────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │  │ Software │  │ Pooled       │  │ LowLatency  │  │
//! │  │ snapshot │  │ (sync/pump)  │  │ (on change) │  │
//! │  └─────┬────┘  └──────┬───────┘  └──────┬──────┘  │
//! │        │              ▼                 ▼         │
//! │        │        ┌───────────────────────────┐     │
//! │        │        │  LatestFrame (one slot)   │     │
//! │        │        └─────────────┬─────────────┘     │
//! │        ▼                      ▼                   │
//! │        └──────► FrameBuffer ◄─┘                   │
//! └───────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod latest;
pub mod region;
pub mod source;

pub use backend::{CaptureBackend, LowLatencyBackend, PooledBackend, SoftwareBackend};
pub use latest::LatestFrame;
pub use region::{crop_client_area, resolve_capture_rect, resolve_for};
pub use source::{CaptureSource, CaptureStats, FallbackNotice, DEFAULT_STALL_TIMEOUT};
