use std::ops::ControlFlow;

use rtgl_common::ObjectId;
use rtgl_gpu::{GpuContext, RenderContext, ShaderProgram, names};

use crate::error::LoadError;
use crate::geometry;
use crate::object::{GpuBuffers, RenderObject};
use crate::payload::{ModelPayload, ObjectAttributes};

/// Ordered collection of render objects. Iteration order is draw order.
#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: Vec<RenderObject>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `payload` and append it to the draw order.
    ///
    /// Absent material fields are filled with defaults, then `extra` is
    /// applied. Only attributes the program declares get a buffer. On failure
    /// every buffer created so far is deleted and the scene is unchanged.
    pub fn add<G: GpuContext>(
        &mut self,
        ctx: &mut RenderContext<G>,
        payload: ModelPayload,
        extra: &ObjectAttributes,
    ) -> Result<ObjectId, LoadError> {
        payload.validate()?;
        let buffers = upload(ctx, &payload)?;
        let object = RenderObject::new(payload, extra, buffers);
        let id = object.id();
        tracing::debug!(alias = %object.alias, vertices = object.vertices().len() / 3, "object added");
        self.objects.push(object);
        self.log_render_order();
        Ok(id)
    }

    /// First object with `alias` in draw order.
    pub fn get(&self, alias: &str) -> Option<&RenderObject> {
        self.objects.iter().find(|o| o.alias == alias)
    }

    pub fn get_mut(&mut self, alias: &str) -> Option<&mut RenderObject> {
        self.objects.iter_mut().find(|o| o.alias == alias)
    }

    pub fn get_by_id(&self, id: ObjectId) -> Option<&RenderObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    fn position(&self, alias: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.alias == alias)
    }

    /// Take the first object with `alias` out of the draw order.
    ///
    /// Its GPU buffers stay alive until [`RenderObject::release`].
    pub fn remove(&mut self, alias: &str) -> Option<RenderObject> {
        let index = self.position(alias)?;
        let object = self.objects.remove(index);
        self.log_render_order();
        Some(object)
    }

    /// Remove and release in one step. Returns whether anything was removed.
    pub fn discard<G: GpuContext>(&mut self, gl: &mut G, alias: &str) -> bool {
        match self.remove(alias) {
            Some(object) => {
                object.release(gl);
                true
            }
            None => false,
        }
    }

    /// Release every object and empty the scene.
    pub fn clear<G: GpuContext>(&mut self, gl: &mut G) {
        for object in self.objects.drain(..) {
            object.release(gl);
        }
    }

    // Reordering. Each returns whether the draw order changed.

    pub fn render_first(&mut self, alias: &str) -> bool {
        match self.position(alias) {
            Some(index) if index > 0 => {
                let object = self.objects.remove(index);
                self.objects.insert(0, object);
                self.log_render_order();
                true
            }
            _ => false,
        }
    }

    pub fn render_last(&mut self, alias: &str) -> bool {
        match self.position(alias) {
            Some(index) if index + 1 < self.objects.len() => {
                let object = self.objects.remove(index);
                self.objects.push(object);
                self.log_render_order();
                true
            }
            _ => false,
        }
    }

    pub fn render_sooner(&mut self, alias: &str) -> bool {
        match self.position(alias) {
            Some(index) if index > 0 => {
                self.objects.swap(index, index - 1);
                self.log_render_order();
                true
            }
            _ => false,
        }
    }

    pub fn render_later(&mut self, alias: &str) -> bool {
        match self.position(alias) {
            Some(index) if index + 1 < self.objects.len() => {
                self.objects.swap(index, index + 1);
                self.log_render_order();
                true
            }
            _ => false,
        }
    }

    /// Visit objects in draw order until the visitor breaks.
    ///
    /// Returns the break value, or `None` if every object was visited.
    pub fn traverse<B>(
        &self,
        mut visitor: impl FnMut(&RenderObject, usize) -> ControlFlow<B>,
    ) -> Option<B> {
        for (index, object) in self.objects.iter().enumerate() {
            if let ControlFlow::Break(value) = visitor(object, index) {
                return Some(value);
            }
        }
        None
    }

    /// Aliases in draw order, joined with `" > "`.
    pub fn render_order(&self) -> String {
        self.objects
            .iter()
            .map(|o| o.alias.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn log_render_order(&self) {
        tracing::debug!("Render Order: {}", self.render_order());
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RenderObject> {
        self.objects.iter_mut()
    }
}

/// Create the index buffer, vertex array and attribute buffers for `payload`.
fn upload<G: GpuContext>(
    ctx: &mut RenderContext<G>,
    payload: &ModelPayload,
) -> Result<GpuBuffers, LoadError> {
    let RenderContext { gl, program } = ctx;

    let index_buffer = gl.create_index_buffer(&payload.indices)?;
    let vertex_array = match gl.create_vertex_array() {
        Ok(vao) => vao,
        Err(err) => {
            gl.delete_buffer(index_buffer);
            gl.bind_index_buffer(None);
            return Err(err.into());
        }
    };
    let mut buffers = GpuBuffers {
        vertex_array,
        index_buffer,
        attributes: Vec::new(),
    };

    gl.bind_vertex_array(Some(vertex_array));
    let result = bind_attributes(gl, program, payload, &mut buffers);
    gl.bind_vertex_array(None);
    gl.bind_index_buffer(None);
    gl.unbind_array_buffer();

    match result {
        Ok(()) => Ok(buffers),
        Err(err) => {
            buffers.release(gl);
            Err(err)
        }
    }
}

fn bind_attributes<G: GpuContext>(
    gl: &mut G,
    program: &ShaderProgram,
    payload: &ModelPayload,
    buffers: &mut GpuBuffers,
) -> Result<(), LoadError> {
    let mut bind = |name: &str, components: i32, data: &[f32]| -> Result<(), LoadError> {
        if let Some(location) = program.attribute(name) {
            let buffer = gl.vertex_attribute(location, components, data)?;
            buffers.attributes.push((location, buffer));
        }
        Ok(())
    };

    bind(names::A_VERTEX_POSITION, 3, &payload.vertices)?;
    if program.attribute(names::A_VERTEX_NORMAL).is_some() {
        let normals = geometry::calculate_normals(&payload.vertices, &payload.indices);
        bind(names::A_VERTEX_NORMAL, 3, &normals)?;
    }
    if let Some(scalars) = &payload.scalars {
        bind(names::A_VERTEX_COLOR, 4, scalars)?;
    }
    if let Some(coords) = &payload.texture_coords {
        bind(names::A_VERTEX_TEXTURE_COORDS, 2, coords)?;
        if program.attribute(names::A_VERTEX_TANGENT).is_some() {
            let tangents = geometry::calculate_tangents(&payload.vertices, coords, &payload.indices);
            bind(names::A_VERTEX_TANGENT, 3, &tangents)?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rtgl_common::WHITE;
    use rtgl_gpu::{GpuCommand, Primitive, RecordingGpu};

    pub(crate) const VS: &str = r#"#version 300 es
uniform mat4 uModelViewMatrix;
uniform mat4 uProjectionMatrix;
uniform mat4 uNormalMatrix;

in vec3 aVertexPosition;
in vec3 aVertexNormal;

out vec3 vNormal;

void main(void) {
    vNormal = aVertexNormal;
    gl_Position = uProjectionMatrix * uModelViewMatrix * vec4(aVertexPosition, 1.0);
}
"#;

    pub(crate) const FS: &str = r#"#version 300 es
precision mediump float;

uniform vec4 uMaterialAmbient;
uniform vec4 uMaterialDiffuse;
uniform bool uWireframe;

in vec3 vNormal;
out vec4 fragColor;

void main(void) {
    fragColor = uMaterialDiffuse;
}
"#;

    pub(crate) fn context() -> RenderContext<RecordingGpu> {
        let mut ctx =
            RenderContext::with_program(RecordingGpu::new(), VS, FS, names::ATTRIBUTES, names::UNIFORMS);
        assert!(ctx.program.is_linked());
        ctx.gl.take_commands();
        ctx
    }

    pub(crate) fn triangle(alias: &str) -> ModelPayload {
        ModelPayload {
            alias: Some(alias.to_string()),
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            ..ModelPayload::default()
        }
    }

    fn scene_abc(ctx: &mut RenderContext<RecordingGpu>) -> SceneGraph {
        let mut scene = SceneGraph::new();
        for alias in ["A", "B", "C"] {
            scene
                .add(ctx, triangle(alias), &ObjectAttributes::default())
                .unwrap();
        }
        scene
    }

    #[test]
    fn add_binds_only_declared_attributes() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let payload = ModelPayload {
            scalars: Some(vec![1.0; 12]),
            texture_coords: Some(vec![0.0; 6]),
            ..triangle("tri")
        };
        let id = scene.add(&mut ctx, payload, &ObjectAttributes::default()).unwrap();

        let object = scene.get("tri").unwrap();
        assert_eq!(object.id(), id);
        let position = ctx.program.attribute(names::A_VERTEX_POSITION).unwrap();
        let normal = ctx.program.attribute(names::A_VERTEX_NORMAL).unwrap();
        assert_eq!(object.bound_attributes().collect::<Vec<_>>(), vec![position, normal]);
        assert_eq!(ctx.gl.live_buffer_count(), 3);
        assert_eq!(ctx.gl.live_vertex_array_count(), 1);

        let attributes: Vec<_> = ctx
            .gl
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::VertexAttribute { components, len, .. } => Some((*components, *len)),
                _ => None,
            })
            .collect();
        assert_eq!(attributes, vec![(3, 9), (3, 9)]);
        // everything unbound afterwards
        assert_eq!(
            &ctx.gl.commands()[ctx.gl.commands().len() - 3..],
            &[
                GpuCommand::BindVertexArray(None),
                GpuCommand::BindIndexBuffer(None),
                GpuCommand::UnbindArrayBuffer,
            ]
        );
    }

    #[test]
    fn add_binds_tangents_only_with_texture_coords() {
        let vs = "in vec3 aVertexPosition;\nin vec2 aVertexTextureCoords;\nin vec3 aVertexTangent;\nvoid main() {}";
        let fs = "out vec4 fragColor;\nvoid main() {}";
        let mut ctx =
            RenderContext::with_program(RecordingGpu::new(), vs, fs, names::ATTRIBUTES, &[]);
        let mut scene = SceneGraph::new();

        scene
            .add(&mut ctx, triangle("plain"), &ObjectAttributes::default())
            .unwrap();
        assert_eq!(scene.get("plain").unwrap().bound_attributes().count(), 1);

        let textured = ModelPayload {
            texture_coords: Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            ..triangle("textured")
        };
        scene
            .add(&mut ctx, textured, &ObjectAttributes::default())
            .unwrap();
        let tangent = ctx.program.attribute(names::A_VERTEX_TANGENT).unwrap();
        let bound: Vec<_> = scene.get("textured").unwrap().bound_attributes().collect();
        assert_eq!(bound.len(), 3);
        assert_eq!(bound[2], tangent);
    }

    #[test]
    fn add_keeps_supplied_material() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let payload = ModelPayload {
            diffuse: Some([0.1, 0.2, 0.3, 1.0]),
            ..triangle("tri")
        };
        scene.add(&mut ctx, payload, &ObjectAttributes::default()).unwrap();
        let object = scene.get("tri").unwrap();
        assert_eq!(object.diffuse, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(object.specular, WHITE);
    }

    #[test]
    fn invalid_payload_leaves_scene_untouched() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let payload = ModelPayload {
            indices: vec![0, 1, 7],
            ..triangle("bad")
        };
        let err = scene
            .add(&mut ctx, payload, &ObjectAttributes::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidPayload(_)));
        assert!(scene.is_empty());
        assert!(ctx.gl.commands().is_empty());
    }

    #[test]
    fn lost_context_leaves_scene_untouched() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        ctx.gl.lose_context();
        let err = scene
            .add(&mut ctx, triangle("tri"), &ObjectAttributes::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Gpu(_)));
        assert!(scene.is_empty());
        assert_eq!(ctx.gl.live_buffer_count(), 0);
    }

    #[test]
    fn reorder_scenario() {
        let mut ctx = context();
        let mut scene = scene_abc(&mut ctx);
        assert_eq!(scene.render_order(), "A > B > C");

        assert!(scene.render_last("A"));
        assert_eq!(scene.render_order(), "B > C > A");

        assert!(scene.render_sooner("A"));
        assert_eq!(scene.render_order(), "B > A > C");

        assert!(scene.render_first("C"));
        assert_eq!(scene.render_order(), "C > B > A");

        assert!(scene.render_later("C"));
        assert_eq!(scene.render_order(), "B > C > A");
    }

    #[test]
    fn reorder_at_boundary_is_noop() {
        let mut ctx = context();
        let mut scene = scene_abc(&mut ctx);
        assert!(!scene.render_first("A"));
        assert!(!scene.render_sooner("A"));
        assert!(!scene.render_last("C"));
        assert!(!scene.render_later("C"));
        assert_eq!(scene.render_order(), "A > B > C");
    }

    #[test]
    fn missing_alias_is_noop() {
        let mut ctx = context();
        let mut scene = scene_abc(&mut ctx);
        assert!(!scene.render_first("nope"));
        assert!(!scene.render_last("nope"));
        assert!(!scene.render_sooner("nope"));
        assert!(!scene.render_later("nope"));
        assert!(scene.remove("nope").is_none());
        assert_eq!(scene.render_order(), "A > B > C");
    }

    #[test]
    fn alias_lookup_finds_first_match() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let first = scene
            .add(&mut ctx, triangle("part"), &ObjectAttributes::default())
            .unwrap();
        let second = scene
            .add(&mut ctx, triangle("part"), &ObjectAttributes::default())
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(scene.get("part").unwrap().id(), first);
        assert!(scene.get_by_id(second).is_some());

        let removed = scene.remove("part").unwrap();
        assert_eq!(removed.id(), first);
        assert_eq!(scene.get("part").unwrap().id(), second);
    }

    #[test]
    fn remove_then_release_frees_buffers() {
        let mut ctx = context();
        let mut scene = scene_abc(&mut ctx);
        let live = ctx.gl.live_buffer_count();

        let removed = scene.remove("B").unwrap();
        assert_eq!(scene.render_order(), "A > C");
        assert_eq!(ctx.gl.live_buffer_count(), live);
        removed.release(&mut ctx.gl);
        assert_eq!(ctx.gl.live_buffer_count(), live - 3);

        assert!(scene.discard(&mut ctx.gl, "A"));
        assert!(!scene.discard(&mut ctx.gl, "A"));
        scene.clear(&mut ctx.gl);
        assert!(scene.is_empty());
        assert_eq!(ctx.gl.live_buffer_count(), 0);
        assert_eq!(ctx.gl.live_vertex_array_count(), 0);
    }

    #[test]
    fn get_mut_edits_material() {
        let mut ctx = context();
        let mut scene = scene_abc(&mut ctx);
        scene.get_mut("B").unwrap().visible = false;
        assert!(!scene.get("B").unwrap().visible);
    }

    #[test]
    fn traverse_stops_on_break() {
        let mut ctx = context();
        let scene = scene_abc(&mut ctx);

        let mut seen = Vec::new();
        let found = scene.traverse(|object, index| {
            seen.push(index);
            if object.alias == "B" {
                ControlFlow::Break(object.id())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(found, Some(scene.get("B").unwrap().id()));

        let mut count = 0;
        let none: Option<()> = scene.traverse(|_, _| {
            count += 1;
            ControlFlow::Continue(())
        });
        assert!(none.is_none());
        assert_eq!(count, 3);
    }

    #[test]
    fn draw_loop_issues_one_draw_per_visible_object() {
        let mut ctx = context();
        let mut scene = scene_abc(&mut ctx);
        scene.get_mut("B").unwrap().wireframe = true;
        scene.get_mut("C").unwrap().visible = false;
        ctx.gl.take_commands();

        scene.traverse(|object, _| {
            object.upload_material(&mut ctx);
            object.draw(&mut ctx.gl);
            ControlFlow::<()>::Continue(())
        });
        assert_eq!(
            ctx.gl.draw_calls(),
            vec![(Primitive::Triangles, 3), (Primitive::Lines, 3)]
        );
    }
}
