//! Scene graph: owns render objects, their GPU buffers, and the draw order.
//!
//! Models arrive as JSON payloads (`vertices`, `indices`, optional colours and
//! texture coordinates, MTL-style material fields) from an [`AssetSource`].
//! Each payload becomes one [`RenderObject`] holding a vertex array, an index
//! buffer and one buffer per attribute the bound program actually declares.
//!
//! # Invariants
//! - The order of [`SceneGraph::iter`] is draw order; ids never repeat.
//! - Material defaults fill only fields the payload left out.
//! - A failed load or add leaves the scene untouched and frees any buffer it
//!   created.
//! - Alias lookups resolve to the first object in draw order.

mod error;
pub mod geometry;
mod graph;
mod loader;
mod object;
mod payload;
pub mod shapes;

pub use error::LoadError;
pub use graph::SceneGraph;
pub use loader::{
    AssetSource, FetchedPart, FileSource, LoadReport, MemorySource, fetch_model, fetch_parts,
};
pub use object::RenderObject;
pub use payload::{ModelPayload, ObjectAttributes};

pub fn crate_info() -> &'static str {
    "rtgl-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
