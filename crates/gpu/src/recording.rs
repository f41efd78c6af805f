use std::collections::{BTreeMap, BTreeSet};

use crate::context::{
    BufferId, GpuContext, GpuError, Primitive, ProgramId, ShaderId, ShaderStage, UniformLocation,
    VertexArrayId,
};

/// One call issued against a [`RecordingGpu`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CompileShader { stage: ShaderStage, ok: bool },
    LinkProgram { ok: bool },
    UseProgram(Option<ProgramId>),
    UniformMatrix4 { location: UniformLocation, value: [f32; 16] },
    UniformVec4 { location: UniformLocation, value: [f32; 4] },
    UniformVec3 { location: UniformLocation, value: [f32; 3] },
    UniformF32 { location: UniformLocation, value: f32 },
    UniformI32 { location: UniformLocation, value: i32 },
    CreateIndexBuffer { buffer: BufferId, len: usize },
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    BindIndexBuffer(Option<BufferId>),
    VertexAttribute {
        location: u32,
        components: i32,
        buffer: BufferId,
        len: usize,
    },
    UnbindArrayBuffer,
    DrawElements { mode: Primitive, count: i32 },
    DeleteBuffer(BufferId),
    DeleteVertexArray(VertexArrayId),
    DeleteShader(ShaderId),
    DeleteProgram(ProgramId),
}

#[derive(Debug, Clone)]
struct Declared {
    name: String,
    location: Option<u32>,
}

#[derive(Debug, Clone, Default)]
struct Declarations {
    inputs: Vec<Declared>,
    outputs: Vec<Declared>,
    uniforms: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompiledShader {
    stage: ShaderStage,
    decls: Declarations,
}

#[derive(Debug, Clone)]
struct LinkedProgram {
    attributes: BTreeMap<String, u32>,
    uniforms: Vec<String>,
}

/// Headless GPU backend.
///
/// Reflects attribute, varying and uniform declarations straight from GLSL
/// source, so programs behave like a real driver for location lookups, and
/// records every call for inspection. Useful for CLI runs and for testing the
/// substrate without a GL context.
#[derive(Debug, Default)]
pub struct RecordingGpu {
    commands: Vec<GpuCommand>,
    shaders: BTreeMap<ShaderId, CompiledShader>,
    programs: BTreeMap<ProgramId, LinkedProgram>,
    current_program: Option<ProgramId>,
    bound_vertex_array: Option<VertexArrayId>,
    live_buffers: BTreeSet<BufferId>,
    live_vertex_arrays: BTreeSet<VertexArrayId>,
    next_id: u32,
    lost: bool,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command issued so far, oldest first.
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the command log.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// `(mode, index count)` of every draw issued so far.
    pub fn draw_calls(&self) -> Vec<(Primitive, i32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DrawElements { mode, count } => Some((*mode, *count)),
                _ => None,
            })
            .collect()
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn live_vertex_array_count(&self) -> usize {
        self.live_vertex_arrays.len()
    }

    /// Simulate a lost context: every later allocation fails.
    pub fn lose_context(&mut self) {
        self.lost = true;
    }

    fn next_handle(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_context(&self, object: &'static str) -> Result<(), GpuError> {
        if self.lost {
            Err(GpuError::new(object, "context lost"))
        } else {
            Ok(())
        }
    }
}

impl GpuContext for RecordingGpu {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let result = reflect(stage, source);
        self.commands.push(GpuCommand::CompileShader {
            stage,
            ok: result.is_ok(),
        });
        let decls = result?;
        let id = ShaderId(self.next_handle());
        self.shaders.insert(id, CompiledShader { stage, decls });
        Ok(id)
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String> {
        let result = link(self.shaders.get(&vertex), self.shaders.get(&fragment));
        self.commands.push(GpuCommand::LinkProgram { ok: result.is_ok() });
        let linked = result?;
        let id = ProgramId(self.next_handle());
        self.programs.insert(id, linked);
        Ok(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
        self.commands.push(GpuCommand::DeleteShader(shader));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.commands.push(GpuCommand::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
        self.commands.push(GpuCommand::UseProgram(program));
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs.get(&program)?.attributes.get(name).copied()
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs
            .get(&program)?
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        self.commands.push(GpuCommand::UniformMatrix4 {
            location,
            value: *value,
        });
    }

    fn uniform_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.commands.push(GpuCommand::UniformVec4 { location, value });
    }

    fn uniform_vec3(&mut self, location: UniformLocation, value: [f32; 3]) {
        self.commands.push(GpuCommand::UniformVec3 { location, value });
    }

    fn uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.commands.push(GpuCommand::UniformF32 { location, value });
    }

    fn uniform_i32(&mut self, location: UniformLocation, value: i32) {
        self.commands.push(GpuCommand::UniformI32 { location, value });
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, GpuError> {
        self.check_context("index buffer")?;
        let buffer = BufferId(self.next_handle());
        self.live_buffers.insert(buffer);
        self.commands.push(GpuCommand::CreateIndexBuffer {
            buffer,
            len: indices.len(),
        });
        Ok(buffer)
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GpuError> {
        self.check_context("vertex array")?;
        let vao = VertexArrayId(self.next_handle());
        self.live_vertex_arrays.insert(vao);
        self.commands.push(GpuCommand::CreateVertexArray(vao));
        Ok(vao)
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) {
        self.bound_vertex_array = vao;
        self.commands.push(GpuCommand::BindVertexArray(vao));
    }

    fn bind_index_buffer(&mut self, buffer: Option<BufferId>) {
        self.commands.push(GpuCommand::BindIndexBuffer(buffer));
    }

    fn vertex_attribute(
        &mut self,
        location: u32,
        components: i32,
        data: &[f32],
    ) -> Result<BufferId, GpuError> {
        self.check_context("vertex buffer")?;
        if self.bound_vertex_array.is_none() {
            tracing::warn!(location, "vertex attribute configured with no vertex array bound");
        }
        let buffer = BufferId(self.next_handle());
        self.live_buffers.insert(buffer);
        self.commands.push(GpuCommand::VertexAttribute {
            location,
            components,
            buffer,
            len: data.len(),
        });
        Ok(buffer)
    }

    fn unbind_array_buffer(&mut self) {
        self.commands.push(GpuCommand::UnbindArrayBuffer);
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32) {
        self.commands.push(GpuCommand::DrawElements { mode, count });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.live_buffers.remove(&buffer);
        self.commands.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        self.live_vertex_arrays.remove(&vao);
        if self.bound_vertex_array == Some(vao) {
            self.bound_vertex_array = None;
        }
        self.commands.push(GpuCommand::DeleteVertexArray(vao));
    }
}

const INTERPOLATION_QUALIFIERS: &[&str] = &[
    "flat",
    "smooth",
    "centroid",
    "noperspective",
    "invariant",
];

/// Minimal GLSL "compiler": checks the shape of the source and collects its
/// interface declarations.
fn reflect(stage: ShaderStage, source: &str) -> Result<Declarations, String> {
    if source.trim().is_empty() {
        return Err(format!("ERROR: empty {stage} shader source"));
    }
    if source.matches('{').count() != source.matches('}').count() {
        return Err(format!(
            "ERROR: 0:{}: syntax error: unbalanced braces",
            source.lines().count()
        ));
    }
    if !source.contains("void main") {
        return Err("ERROR: 0:1: 'main' : missing entry point".into());
    }

    let mut decls = Declarations::default();
    for raw in source.lines() {
        let line = raw.split("//").next().unwrap_or_default().trim();
        if line.contains('{') || (line.contains('(') && !line.starts_with("layout")) {
            continue;
        }
        let Some(line) = line.strip_suffix(';') else {
            continue;
        };
        let (location, rest) = split_layout(line);
        let tokens: Vec<&str> = rest
            .split_whitespace()
            .skip_while(|t| INTERPOLATION_QUALIFIERS.contains(t))
            .collect();
        if tokens.len() < 3 {
            continue;
        }
        let name = tokens[tokens.len() - 1];
        let name = name.split('[').next().unwrap_or(name).to_string();
        let declared = Declared { name, location };

        match (tokens[0], stage) {
            ("uniform", _) => decls.uniforms.push(declared.name),
            ("in" | "attribute", ShaderStage::Vertex) => decls.inputs.push(declared),
            ("in" | "varying", ShaderStage::Fragment) => decls.inputs.push(declared),
            ("out" | "varying", ShaderStage::Vertex) => decls.outputs.push(declared),
            _ => {}
        }
    }
    Ok(decls)
}

fn split_layout(line: &str) -> (Option<u32>, &str) {
    if let Some(rest) = line.strip_prefix("layout") {
        if let Some(close) = rest.find(')') {
            let location = rest[..close]
                .split('=')
                .nth(1)
                .and_then(|v| v.trim().parse().ok());
            return (location, rest[close + 1..].trim());
        }
    }
    (None, line)
}

fn link(
    vertex: Option<&CompiledShader>,
    fragment: Option<&CompiledShader>,
) -> Result<LinkedProgram, String> {
    let vertex = vertex.ok_or("invalid vertex shader handle")?;
    let fragment = fragment.ok_or("invalid fragment shader handle")?;
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err("shader stages attached in the wrong slots".into());
    }

    for input in &fragment.decls.inputs {
        if !vertex.decls.outputs.iter().any(|o| o.name == input.name) {
            return Err(format!(
                "Varying `{}` consumed by fragment shader is not written by vertex shader",
                input.name
            ));
        }
    }

    let mut attributes = BTreeMap::new();
    let taken: BTreeSet<u32> = vertex.decls.inputs.iter().filter_map(|i| i.location).collect();
    let mut next = 0;
    for input in &vertex.decls.inputs {
        let location = match input.location {
            Some(explicit) => explicit,
            None => {
                while taken.contains(&next) {
                    next += 1;
                }
                next += 1;
                next - 1
            }
        };
        attributes.insert(input.name.clone(), location);
    }

    let mut uniforms: Vec<String> = Vec::new();
    for name in vertex.decls.uniforms.iter().chain(&fragment.decls.uniforms) {
        if !uniforms.contains(name) {
            uniforms.push(name.clone());
        }
    }

    Ok(LinkedProgram {
        attributes,
        uniforms,
    })
}
