//! Shared types for the rtgl workspace.

mod types;

pub use types::{AMBIENT_GRAY, ObjectId, Rgba, Viewport, WHITE, rgb};
