use rtgl_common::{AMBIENT_GRAY, ObjectId, Rgba, WHITE, rgb};
use rtgl_gpu::{BufferId, GpuContext, Primitive, RenderContext, VertexArrayId, names};

use crate::payload::{ModelPayload, ObjectAttributes};

/// GPU objects backing one render object. Fixed once uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GpuBuffers {
    pub vertex_array: VertexArrayId,
    pub index_buffer: BufferId,
    /// `(attribute location, buffer)` for every attribute that was bound.
    pub attributes: Vec<(u32, BufferId)>,
}

/// One drawable unit: geometry, material and the GPU buffers it owns.
///
/// Material and visibility fields are public and may be edited between frames.
/// Geometry and buffer handles are fixed at load time.
#[derive(Debug)]
pub struct RenderObject {
    id: ObjectId,
    pub alias: String,
    vertices: Vec<f32>,
    indices: Vec<u16>,
    scalars: Option<Vec<f32>>,
    texture_coords: Option<Vec<f32>>,

    pub ambient: Rgba,
    pub diffuse: Rgba,
    pub specular: Rgba,
    pub ka: [f32; 3],
    pub kd: [f32; 3],
    pub ks: [f32; 3],
    pub specular_exponent: f32,
    pub transparency: f32,
    pub illumination_model: u32,
    pub wireframe: bool,
    pub visible: bool,

    buffers: GpuBuffers,
}

impl RenderObject {
    /// Fill absent material fields with defaults, then apply `extra`.
    pub(crate) fn new(payload: ModelPayload, extra: &ObjectAttributes, buffers: GpuBuffers) -> Self {
        let diffuse = payload.diffuse.unwrap_or(WHITE);
        let ambient = payload.ambient.unwrap_or(AMBIENT_GRAY);
        let specular = payload.specular.unwrap_or(WHITE);
        let specular_exponent = payload.specular_exponent.or(payload.ns).unwrap_or(0.0);
        let transparency = payload.transparency.or(payload.dissolve).unwrap_or(1.0);

        let mut object = Self {
            id: ObjectId::new(),
            alias: payload.alias.unwrap_or_default(),
            kd: payload.kd.unwrap_or(rgb(diffuse)),
            ka: payload.ka.unwrap_or(rgb(ambient)),
            ks: payload.ks.unwrap_or(rgb(specular)),
            ambient,
            diffuse,
            specular,
            specular_exponent,
            transparency,
            illumination_model: payload.illum.unwrap_or(1),
            wireframe: payload.wireframe.unwrap_or(false),
            visible: payload.visible.unwrap_or(true),
            vertices: payload.vertices,
            indices: payload.indices,
            scalars: payload.scalars,
            texture_coords: payload.texture_coords,
            buffers,
        };
        object.apply(extra);
        object
    }

    /// Overwrite every field `attributes` sets.
    pub fn apply(&mut self, attributes: &ObjectAttributes) {
        let ObjectAttributes {
            alias,
            ambient,
            diffuse,
            specular,
            ka,
            kd,
            ks,
            specular_exponent,
            transparency,
            illumination_model,
            wireframe,
            visible,
        } = attributes.clone();
        if let Some(v) = alias {
            self.alias = v;
        }
        if let Some(v) = ambient {
            self.ambient = v;
        }
        if let Some(v) = diffuse {
            self.diffuse = v;
        }
        if let Some(v) = specular {
            self.specular = v;
        }
        if let Some(v) = ka {
            self.ka = v;
        }
        if let Some(v) = kd {
            self.kd = v;
        }
        if let Some(v) = ks {
            self.ks = v;
        }
        if let Some(v) = specular_exponent {
            self.specular_exponent = v;
        }
        if let Some(v) = transparency {
            self.transparency = v;
        }
        if let Some(v) = illumination_model {
            self.illumination_model = v;
        }
        if let Some(v) = wireframe {
            self.wireframe = v;
        }
        if let Some(v) = visible {
            self.visible = v;
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn scalars(&self) -> Option<&[f32]> {
        self.scalars.as_deref()
    }

    pub fn texture_coords(&self) -> Option<&[f32]> {
        self.texture_coords.as_deref()
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.buffers.vertex_array
    }

    pub fn index_buffer(&self) -> BufferId {
        self.buffers.index_buffer
    }

    /// Attribute locations this object bound a buffer to, in upload order.
    pub fn bound_attributes(&self) -> impl Iterator<Item = u32> + '_ {
        self.buffers.attributes.iter().map(|(location, _)| *location)
    }

    pub fn primitive(&self) -> Primitive {
        if self.wireframe {
            Primitive::Lines
        } else {
            Primitive::Triangles
        }
    }

    /// Upload material colours and the wireframe flag to the bound program.
    pub fn upload_material<G: GpuContext>(&self, ctx: &mut RenderContext<G>) {
        ctx.set_vec4(names::U_MATERIAL_AMBIENT, self.ambient);
        ctx.set_vec4(names::U_MATERIAL_DIFFUSE, self.diffuse);
        ctx.set_vec4(names::U_MATERIAL_SPECULAR, self.specular);
        ctx.set_bool(names::U_WIREFRAME, self.wireframe);
    }

    /// Issue the indexed draw for this object. Hidden objects draw nothing.
    pub fn draw<G: GpuContext>(&self, gl: &mut G) -> bool {
        if !self.visible {
            return false;
        }
        gl.bind_vertex_array(Some(self.buffers.vertex_array));
        gl.bind_index_buffer(Some(self.buffers.index_buffer));
        gl.draw_elements(self.primitive(), self.indices.len() as i32);
        gl.bind_vertex_array(None);
        gl.bind_index_buffer(None);
        true
    }

    /// Free every GPU object this render object owns.
    pub fn release<G: GpuContext>(self, gl: &mut G) {
        self.buffers.release(gl);
        tracing::debug!(alias = %self.alias, "render object released");
    }
}

impl GpuBuffers {
    pub(crate) fn release<G: GpuContext>(&self, gl: &mut G) {
        for (_, buffer) in &self.attributes {
            gl.delete_buffer(*buffer);
        }
        gl.delete_buffer(self.index_buffer);
        gl.delete_vertex_array(self.vertex_array);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtgl_gpu::{GpuCommand, RecordingGpu};

    fn buffers() -> GpuBuffers {
        GpuBuffers {
            vertex_array: VertexArrayId(1),
            index_buffer: BufferId(2),
            attributes: vec![(0, BufferId(3))],
        }
    }

    fn triangle() -> ModelPayload {
        ModelPayload {
            alias: Some("tri".into()),
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            ..ModelPayload::default()
        }
    }

    #[test]
    fn absent_fields_get_defaults() {
        let object = RenderObject::new(triangle(), &ObjectAttributes::default(), buffers());
        assert_eq!(object.diffuse, WHITE);
        assert_eq!(object.ambient, AMBIENT_GRAY);
        assert_eq!(object.specular, WHITE);
        assert_eq!(object.kd, [1.0, 1.0, 1.0]);
        assert_eq!(object.ka, [0.2, 0.2, 0.2]);
        assert_eq!(object.transparency, 1.0);
        assert_eq!(object.illumination_model, 1);
        assert_eq!(object.specular_exponent, 0.0);
        assert!(object.visible);
        assert!(!object.wireframe);
    }

    #[test]
    fn present_fields_are_kept() {
        let payload = ModelPayload {
            diffuse: Some([0.5, 0.25, 0.125, 1.0]),
            ns: Some(12.0),
            dissolve: Some(0.4),
            illum: Some(2),
            ..triangle()
        };
        let object = RenderObject::new(payload, &ObjectAttributes::default(), buffers());
        assert_eq!(object.diffuse, [0.5, 0.25, 0.125, 1.0]);
        assert_eq!(object.kd, [0.5, 0.25, 0.125]);
        assert_eq!(object.specular_exponent, 12.0);
        assert_eq!(object.transparency, 0.4);
        assert_eq!(object.illumination_model, 2);
    }

    #[test]
    fn extra_attributes_override_after_defaults() {
        let extra = ObjectAttributes {
            diffuse: Some([0.0, 1.0, 0.0, 1.0]),
            wireframe: Some(true),
            ..ObjectAttributes::default()
        };
        let object = RenderObject::new(triangle(), &extra, buffers());
        assert_eq!(object.diffuse, [0.0, 1.0, 0.0, 1.0]);
        // derived before the override
        assert_eq!(object.kd, [1.0, 1.0, 1.0]);
        assert_eq!(object.primitive(), Primitive::Lines);
    }

    #[test]
    fn extra_attributes_can_rename() {
        let extra = ObjectAttributes {
            alias: Some("renamed".into()),
            ..ObjectAttributes::default()
        };
        let mut object = RenderObject::new(triangle(), &extra, buffers());
        assert_eq!(object.alias, "renamed");

        object.apply(&ObjectAttributes::default());
        assert_eq!(object.alias, "renamed");
    }

    #[test]
    fn hidden_object_draws_nothing() {
        let mut gl = RecordingGpu::new();
        let mut object = RenderObject::new(triangle(), &ObjectAttributes::default(), buffers());
        object.visible = false;
        assert!(!object.draw(&mut gl));
        assert!(gl.commands().is_empty());

        object.visible = true;
        assert!(object.draw(&mut gl));
        assert_eq!(gl.draw_calls(), vec![(Primitive::Triangles, 3)]);
        assert_eq!(
            gl.commands()[0],
            GpuCommand::BindVertexArray(Some(VertexArrayId(1)))
        );
    }
}
