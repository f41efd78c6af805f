use std::collections::BTreeMap;

use crate::context::{GpuContext, ProgramId, ShaderStage, UniformLocation};

/// Why a program is unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("no {0} shader source was provided")]
    MissingSource(ShaderStage),
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("could not link program: {0}")]
    Link(String),
}

/// A linked vertex + fragment program and the locations resolved from it.
///
/// Compile and link failures never panic and are never returned as `Err`:
/// they are logged and kept in [`ShaderProgram::error`], and the program stays
/// in an unusable state. Check [`ShaderProgram::is_linked`] before drawing.
#[derive(Debug, Clone, Default)]
pub struct ShaderProgram {
    handle: Option<ProgramId>,
    error: Option<ShaderError>,
    attributes: BTreeMap<String, Option<u32>>,
    uniforms: BTreeMap<String, Option<UniformLocation>>,
}

impl ShaderProgram {
    /// Compile both stages, link them and make the result the active program.
    pub fn new<G: GpuContext>(gl: &mut G, vertex_source: &str, fragment_source: &str) -> Self {
        match build(gl, vertex_source, fragment_source) {
            Ok(handle) => {
                gl.use_program(Some(handle));
                tracing::debug!(?handle, "shader program linked");
                Self {
                    handle: Some(handle),
                    ..Self::default()
                }
            }
            Err(error) => {
                tracing::error!("could not initialize shaders: {error}");
                Self {
                    error: Some(error),
                    ..Self::default()
                }
            }
        }
    }

    pub fn is_linked(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<ProgramId> {
        self.handle
    }

    /// The compile or link failure, if any.
    pub fn error(&self) -> Option<&ShaderError> {
        self.error.as_ref()
    }

    pub fn use_program<G: GpuContext>(&self, gl: &mut G) {
        if let Some(handle) = self.handle {
            gl.use_program(Some(handle));
        }
    }

    /// Bind the program and resolve every attribute and uniform name once.
    ///
    /// Names the linked program does not declare resolve to `None`; that is
    /// not an error, consumers simply skip them.
    pub fn load<G: GpuContext>(&mut self, gl: &mut G, attributes: &[&str], uniforms: &[&str]) {
        let Some(handle) = self.handle else {
            tracing::warn!("ignoring location lookup on an unlinked program");
            return;
        };
        gl.use_program(Some(handle));

        for &name in attributes {
            let location = gl.attrib_location(handle, name);
            if location.is_none() {
                tracing::debug!(name, "attribute not present in program");
            }
            self.attributes.insert(name.to_string(), location);
        }
        for &name in uniforms {
            let location = gl.uniform_location(handle, name);
            if location.is_none() {
                tracing::debug!(name, "uniform not present in program");
            }
            self.uniforms.insert(name.to_string(), location);
        }
    }

    /// Attribute location, `None` when absent or never loaded.
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied().flatten()
    }

    /// Uniform location, `None` when absent or never loaded.
    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied().flatten()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    /// Free the GPU program. Resolved locations are forgotten.
    pub fn delete<G: GpuContext>(&mut self, gl: &mut G) {
        if let Some(handle) = self.handle.take() {
            gl.delete_program(handle);
        }
        self.attributes.clear();
        self.uniforms.clear();
    }
}

fn build<G: GpuContext>(
    gl: &mut G,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<ProgramId, ShaderError> {
    if vertex_source.trim().is_empty() {
        return Err(ShaderError::MissingSource(ShaderStage::Vertex));
    }
    if fragment_source.trim().is_empty() {
        return Err(ShaderError::MissingSource(ShaderStage::Fragment));
    }

    let vertex = gl
        .compile_shader(ShaderStage::Vertex, vertex_source)
        .map_err(|log| ShaderError::Compile {
            stage: ShaderStage::Vertex,
            log,
        })?;
    let fragment = match gl.compile_shader(ShaderStage::Fragment, fragment_source) {
        Ok(fragment) => fragment,
        Err(log) => {
            gl.delete_shader(vertex);
            return Err(ShaderError::Compile {
                stage: ShaderStage::Fragment,
                log,
            });
        }
    };

    let linked = gl.link_program(vertex, fragment).map_err(ShaderError::Link);
    gl.delete_shader(vertex);
    gl.delete_shader(fragment);
    linked
}
