use crate::context::GpuContext;
use crate::program::ShaderProgram;

/// The GPU context plus the active program, owned by the host entry point and
/// handed explicitly to every component that talks to the GPU.
#[derive(Debug)]
pub struct RenderContext<G: GpuContext> {
    pub gl: G,
    pub program: ShaderProgram,
}

impl<G: GpuContext> RenderContext<G> {
    pub fn new(gl: G, program: ShaderProgram) -> Self {
        Self { gl, program }
    }

    /// Compile and link `vertex`/`fragment`, then resolve the given names.
    pub fn with_program(
        mut gl: G,
        vertex: &str,
        fragment: &str,
        attributes: &[&str],
        uniforms: &[&str],
    ) -> Self {
        let mut program = ShaderProgram::new(&mut gl, vertex, fragment);
        program.load(&mut gl, attributes, uniforms);
        Self { gl, program }
    }

    // Each setter returns whether the program declares the uniform.

    pub fn set_matrix4(&mut self, name: &str, value: &[f32; 16]) -> bool {
        let Some(location) = self.program.uniform(name) else {
            return false;
        };
        self.gl.uniform_matrix4(location, value);
        true
    }

    pub fn set_vec4(&mut self, name: &str, value: [f32; 4]) -> bool {
        let Some(location) = self.program.uniform(name) else {
            return false;
        };
        self.gl.uniform_vec4(location, value);
        true
    }

    pub fn set_vec3(&mut self, name: &str, value: [f32; 3]) -> bool {
        let Some(location) = self.program.uniform(name) else {
            return false;
        };
        self.gl.uniform_vec3(location, value);
        true
    }

    pub fn set_f32(&mut self, name: &str, value: f32) -> bool {
        let Some(location) = self.program.uniform(name) else {
            return false;
        };
        self.gl.uniform_f32(location, value);
        true
    }

    pub fn set_i32(&mut self, name: &str, value: i32) -> bool {
        let Some(location) = self.program.uniform(name) else {
            return false;
        };
        self.gl.uniform_i32(location, value);
        true
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> bool {
        self.set_i32(name, value as i32)
    }
}
