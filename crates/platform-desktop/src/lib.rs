//! Glance desktop platform backend.
//!
//! Implements [`ScreenGrabber`](glance_platform_core::ScreenGrabber) and
//! [`WindowProvider`](glance_platform_core::WindowProvider) on top of
//! `xcap`, plus display-server detection and the environment checks
//! reported by `glance check`.

pub mod display;
pub mod grabber;
pub mod permissions;
pub mod windows;

pub use display::{detect_display_server, DisplayServer};
pub use grabber::DesktopGrabber;
pub use windows::DesktopWindows;
