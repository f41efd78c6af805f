use std::fmt;

/// Handle to a compiled (not yet linked) shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

/// Handle to a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Handle to a vertex or index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Handle to a vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub u32);

/// Location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Primitive assembly mode for indexed draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    Lines,
}

/// Failure to allocate a GPU object (lost context, exhausted driver).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to create {object}: {reason}")]
pub struct GpuError {
    pub object: &'static str,
    pub reason: String,
}

impl GpuError {
    pub fn new(object: &'static str, reason: impl Into<String>) -> Self {
        Self {
            object,
            reason: reason.into(),
        }
    }
}

/// The narrow slice of a WebGL2 / GLES3 context the substrate consumes.
///
/// Everything above this trait is backend-agnostic: swap the headless
/// [`RecordingGpu`](crate::RecordingGpu) for a real GL backend without
/// changing consumers. Buffer uploads are always `STATIC_DRAW`; index data is
/// always `u16`.
pub trait GpuContext {
    /// Compile one shader stage. `Err` carries the driver's info log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;

    /// Link two compiled stages. `Err` carries the driver's info log.
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String>;

    fn delete_shader(&mut self, shader: ShaderId);

    fn delete_program(&mut self, program: ProgramId);

    fn use_program(&mut self, program: Option<ProgramId>);

    /// `None` when the program does not declare (or the linker dropped) the attribute.
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// `None` when the program does not declare the uniform.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Upload a column-major 4x4 matrix.
    fn uniform_matrix4(&mut self, location: UniformLocation, value: &[f32; 16]);

    fn uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]);

    fn uniform_vec3(&mut self, location: UniformLocation, value: [f32; 3]);

    fn uniform_f32(&mut self, location: UniformLocation, value: f32);

    fn uniform_i32(&mut self, location: UniformLocation, value: i32);

    /// Create an element array buffer holding `indices`. Leaves it bound.
    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, GpuError>;

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GpuError>;

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>);

    fn bind_index_buffer(&mut self, buffer: Option<BufferId>);

    /// Create an array buffer with `data`, enable `location` on the bound
    /// vertex array and point it at the buffer with `components` floats per
    /// vertex (tightly packed).
    fn vertex_attribute(
        &mut self,
        location: u32,
        components: i32,
        data: &[f32],
    ) -> Result<BufferId, GpuError>;

    fn unbind_array_buffer(&mut self);

    /// Draw `count` indices from the bound element array buffer.
    fn draw_elements(&mut self, mode: Primitive, count: i32);

    fn delete_buffer(&mut self, buffer: BufferId);

    fn delete_vertex_array(&mut self, vao: VertexArrayId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");
    }

    #[test]
    fn gpu_error_message() {
        let err = GpuError::new("buffer", "context lost");
        assert_eq!(err.to_string(), "failed to create buffer: context lost");
    }
}
