//! Camera state for the demos: tracking (first person) and orbiting modes.
//!
//! # Invariants
//! - The view transform is a pure function of the camera fields; repeated
//!   calls without a mutation return the same matrix.
//! - Elevation and azimuth are kept in degrees, wrapped into `[-180, 180)`.

mod camera;

pub use camera::{Camera, CameraKind};

pub fn crate_info() -> &'static str {
    "rtgl-camera v0.1.0"
}
