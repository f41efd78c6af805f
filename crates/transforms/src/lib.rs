//! Transform pipeline: model-view, projection and normal matrices.
//!
//! # Invariants
//! - `pop` after `push` restores the model-view matrix exactly.
//! - Popping an empty stack returns `None` and changes nothing.
//! - The normal matrix is only derived, as the inverse-transpose of the
//!   model-view matrix, when the matrices are uploaded.
//!
//! # Workaround
//! Inverting a singular model-view matrix (a zero scale) yields non-finite
//! values; callers must not upload such a matrix.

mod stack;

pub use stack::{ModelViewGuard, Projection, TransformStack};

pub fn crate_info() -> &'static str {
    "rtgl-transforms v0.1.0"
}
