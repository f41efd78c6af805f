//! Attribute and uniform names shared by the chapter shaders.

pub const A_VERTEX_POSITION: &str = "aVertexPosition";
pub const A_VERTEX_NORMAL: &str = "aVertexNormal";
pub const A_VERTEX_COLOR: &str = "aVertexColor";
pub const A_VERTEX_TEXTURE_COORDS: &str = "aVertexTextureCoords";
pub const A_VERTEX_TANGENT: &str = "aVertexTangent";

pub const U_MODEL_VIEW_MATRIX: &str = "uModelViewMatrix";
pub const U_PROJECTION_MATRIX: &str = "uProjectionMatrix";
pub const U_NORMAL_MATRIX: &str = "uNormalMatrix";

pub const U_MATERIAL_AMBIENT: &str = "uMaterialAmbient";
pub const U_MATERIAL_DIFFUSE: &str = "uMaterialDiffuse";
pub const U_MATERIAL_SPECULAR: &str = "uMaterialSpecular";
pub const U_WIREFRAME: &str = "uWireframe";

/// Every well-known attribute, for [`ShaderProgram::load`](crate::ShaderProgram::load).
pub const ATTRIBUTES: &[&str] = &[
    A_VERTEX_POSITION,
    A_VERTEX_NORMAL,
    A_VERTEX_COLOR,
    A_VERTEX_TEXTURE_COORDS,
    A_VERTEX_TANGENT,
];

/// Every well-known uniform.
pub const UNIFORMS: &[&str] = &[
    U_MODEL_VIEW_MATRIX,
    U_PROJECTION_MATRIX,
    U_NORMAL_MATRIX,
    U_MATERIAL_AMBIENT,
    U_MATERIAL_DIFFUSE,
    U_MATERIAL_SPECULAR,
    U_WIREFRAME,
];
