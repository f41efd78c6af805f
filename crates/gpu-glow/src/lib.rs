//! glow render backend.
//!
//! Implements [`GpuContext`] over any [`glow::HasContext`], so the same
//! substrate runs on a native GL context or a WebGL2 canvas. Creating that
//! context (window, canvas, loader) is the host's job; the host wraps it with
//! [`GlowGpu::new`] and hands the result to `RenderContext::with_program`.
//!
//! # Invariants
//! - Every GL object is used only with the context that created it; the
//!   backend owns that context for its whole lifetime.
//! - Opaque handles map one-to-one to native objects until deleted.
//! - Deleting a program forgets its uniform locations; stale handles upload
//!   nothing.

use std::collections::{BTreeMap, HashMap};

use glow::HasContext;
use rtgl_gpu::{
    BufferId, GpuContext, GpuError, Primitive, ProgramId, ShaderId, ShaderStage, UniformLocation,
    VertexArrayId,
};

/// [`GpuContext`] over a glow context.
pub struct GlowGpu<C: HasContext = glow::Context> {
    gl: C,
    shaders: BTreeMap<u32, C::Shader>,
    programs: BTreeMap<u32, C::Program>,
    buffers: BTreeMap<u32, C::Buffer>,
    vertex_arrays: BTreeMap<u32, C::VertexArray>,
    uniforms: UniformTable<C::UniformLocation>,
    next_id: u32,
}

/// Uniform locations handed out per program, keyed by opaque handle.
struct UniformTable<L> {
    locations: BTreeMap<u32, L>,
    by_name: HashMap<(ProgramId, String), UniformLocation>,
}

impl<L> Default for UniformTable<L> {
    fn default() -> Self {
        Self {
            locations: BTreeMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<L> UniformTable<L> {
    fn cached(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.by_name.get(&(program, name.to_string())).copied()
    }

    fn insert(&mut self, program: ProgramId, name: &str, handle: u32, native: L) -> UniformLocation {
        let location = UniformLocation(handle);
        self.locations.insert(handle, native);
        self.by_name.insert((program, name.to_string()), location);
        location
    }

    fn get(&self, location: UniformLocation) -> Option<&L> {
        self.locations.get(&location.0)
    }

    fn forget_program(&mut self, program: ProgramId) {
        let locations = &mut self.locations;
        self.by_name.retain(|(owner, _), location| {
            if *owner == program {
                locations.remove(&location.0);
                false
            } else {
                true
            }
        });
    }

    fn len(&self) -> usize {
        self.locations.len()
    }
}

impl<C: HasContext> GlowGpu<C> {
    pub fn new(gl: C) -> Self {
        Self {
            gl,
            shaders: BTreeMap::new(),
            programs: BTreeMap::new(),
            buffers: BTreeMap::new(),
            vertex_arrays: BTreeMap::new(),
            uniforms: UniformTable::default(),
            next_id: 0,
        }
    }

    /// Raw context, for state the substrate does not wrap (clear colour, depth test, viewport).
    pub fn gl(&self) -> &C {
        &self.gl
    }

    pub fn into_inner(self) -> C {
        self.gl
    }

    fn next_handle(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn native_uniform(&self, location: UniformLocation) -> Option<&C::UniformLocation> {
        self.uniforms.get(location)
    }

    /// Uniform locations currently held for live programs.
    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }
}

pub fn crate_info() -> &'static str {
    "rtgl-gpu-glow v0.1.0"
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn primitive_enum(mode: Primitive) -> u32 {
    match mode {
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::Lines => glow::LINES,
    }
}

impl<C: HasContext> GpuContext for GlowGpu<C> {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let shader = unsafe {
            let shader = self.gl.create_shader(stage_enum(stage))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            shader
        };
        let id = self.next_handle();
        self.shaders.insert(id, shader);
        Ok(ShaderId(id))
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String> {
        let vs = *self
            .shaders
            .get(&vertex.0)
            .ok_or("invalid vertex shader handle")?;
        let fs = *self
            .shaders
            .get(&fragment.0)
            .ok_or("invalid fragment shader handle")?;

        let program = unsafe {
            let program = self.gl.create_program()?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            program
        };
        let id = self.next_handle();
        self.programs.insert(id, program);
        Ok(ProgramId(id))
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if let Some(native) = self.shaders.remove(&shader.0) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(native) = self.programs.remove(&program.0) {
            unsafe { self.gl.delete_program(native) };
        }
        self.uniforms.forget_program(program);
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        let native = program.and_then(|p| self.programs.get(&p.0).copied());
        unsafe { self.gl.use_program(native) };
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let native = *self.programs.get(&program.0)?;
        unsafe { self.gl.get_attrib_location(native, name) }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if let Some(location) = self.uniforms.cached(program, name) {
            return Some(location);
        }
        let native = *self.programs.get(&program.0)?;
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;
        let handle = self.next_handle();
        Some(self.uniforms.insert(program, name, handle, location))
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        let native = self.native_uniform(location);
        unsafe { self.gl.uniform_matrix_4_f32_slice(native, false, value) };
    }

    fn uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        let native = self.native_uniform(location);
        unsafe { self.gl.uniform_4_f32_slice(native, &value) };
    }

    fn uniform_vec3(&mut self, location: UniformLocation, value: [f32; 3]) {
        let native = self.native_uniform(location);
        unsafe { self.gl.uniform_3_f32_slice(native, &value) };
    }

    fn uniform_f32(&mut self, location: UniformLocation, value: f32) {
        let native = self.native_uniform(location);
        unsafe { self.gl.uniform_1_f32(native, value) };
    }

    fn uniform_i32(&mut self, location: UniformLocation, value: i32) {
        let native = self.native_uniform(location);
        unsafe { self.gl.uniform_1_i32(native, value) };
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, GpuError> {
        let buffer = unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|e| GpuError::new("index buffer", e))?;
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );
            buffer
        };
        let id = self.next_handle();
        self.buffers.insert(id, buffer);
        Ok(BufferId(id))
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GpuError> {
        let vao = unsafe { self.gl.create_vertex_array() }
            .map_err(|e| GpuError::new("vertex array", e))?;
        let id = self.next_handle();
        self.vertex_arrays.insert(id, vao);
        Ok(VertexArrayId(id))
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) {
        let native = vao.and_then(|v| self.vertex_arrays.get(&v.0).copied());
        unsafe { self.gl.bind_vertex_array(native) };
    }

    fn bind_index_buffer(&mut self, buffer: Option<BufferId>) {
        let native = buffer.and_then(|b| self.buffers.get(&b.0).copied());
        unsafe { self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, native) };
    }

    fn vertex_attribute(
        &mut self,
        location: u32,
        components: i32,
        data: &[f32],
    ) -> Result<BufferId, GpuError> {
        let buffer = unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|e| GpuError::new("vertex buffer", e))?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            self.gl.enable_vertex_attrib_array(location);
            self.gl
                .vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, 0, 0);
            buffer
        };
        let id = self.next_handle();
        self.buffers.insert(id, buffer);
        Ok(BufferId(id))
    }

    fn unbind_array_buffer(&mut self) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, None) };
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32) {
        tracing::trace!(?mode, count, "draw_elements");
        unsafe {
            self.gl
                .draw_elements(primitive_enum(mode), count, glow::UNSIGNED_SHORT, 0)
        };
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(native) = self.buffers.remove(&buffer.0) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        if let Some(native) = self.vertex_arrays.remove(&vao.0) {
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }
}
