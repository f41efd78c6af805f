//! GPU adapter: backend-agnostic GL interface and shader program wrapper.
//!
//! # Invariants
//! - Consumers never touch a concrete GL binding, only [`GpuContext`].
//! - Shader compile and link failures are never fatal; they leave the program
//!   unlinked and are reported through [`ShaderProgram::error`] and the log.
//! - Name lookups resolve once at load time and are reused by name afterwards.
//!
//! # Backends
//! [`RecordingGpu`] is a headless backend that reflects shader interfaces from
//! GLSL source and records every call. The `rtgl-gpu-glow` crate provides the
//! real GL backend; the trait is the same for both.

mod context;
pub mod names;
mod program;
mod recording;
mod render_context;

pub use context::{
    BufferId, GpuContext, GpuError, Primitive, ProgramId, ShaderId, ShaderStage, UniformLocation,
    VertexArrayId,
};
pub use program::{ShaderError, ShaderProgram};
pub use recording::{GpuCommand, RecordingGpu};
pub use render_context::RenderContext;

pub fn crate_info() -> &'static str {
    "rtgl-gpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("gpu"));
    }
}
