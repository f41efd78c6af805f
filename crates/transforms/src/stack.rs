use std::ops::{Deref, DerefMut};

use glam::Mat4;
use rtgl_camera::Camera;
use rtgl_common::Viewport;
use rtgl_gpu::{GpuContext, RenderContext, names};
use serde::{Deserialize, Serialize};

/// Projection mode used by [`TransformStack::update_perspective`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Perspective,
    /// Box of `width/fov` by `height/fov`, depth `-max_z..max_z`.
    Orthographic,
}

/// The three matrices a draw needs, plus a LIFO of model-view snapshots.
#[derive(Debug, Clone)]
pub struct TransformStack {
    model_view: Mat4,
    projection: Mat4,
    normal: Mat4,
    mode: Projection,
    stack: Vec<Mat4>,
}

impl TransformStack {
    /// Derive all three matrices from `camera` and `viewport`.
    pub fn new(camera: &Camera, viewport: Viewport) -> Self {
        let mut transforms = Self {
            model_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            normal: Mat4::IDENTITY,
            mode: Projection::default(),
            stack: Vec::new(),
        };
        transforms.calculate_model_view(camera);
        transforms.update_perspective(camera, viewport);
        transforms.calculate_normal();
        transforms
    }

    /// Reset model-view to the camera's view transform.
    pub fn calculate_model_view(&mut self, camera: &Camera) {
        self.model_view = camera.view_transform();
    }

    fn calculate_normal(&mut self) {
        self.normal = self.model_view.inverse().transpose();
    }

    /// Rebuild the projection for the current mode.
    pub fn update_perspective(&mut self, camera: &Camera, viewport: Viewport) {
        self.projection = match self.mode {
            Projection::Perspective => Mat4::perspective_rh_gl(
                camera.fov.to_radians(),
                viewport.aspect(),
                camera.min_z,
                camera.max_z,
            ),
            Projection::Orthographic => {
                let half_w = viewport.width as f32 / camera.fov;
                let half_h = viewport.height.max(1) as f32 / camera.fov;
                Mat4::orthographic_rh_gl(
                    -half_w,
                    half_w,
                    -half_h,
                    half_h,
                    -camera.max_z,
                    camera.max_z,
                )
            }
        };
    }

    /// Takes effect on the next [`TransformStack::update_perspective`].
    pub fn set_projection(&mut self, mode: Projection) {
        self.mode = mode;
    }

    pub fn projection_mode(&self) -> Projection {
        self.mode
    }

    /// Save a copy of the current model-view matrix.
    pub fn push(&mut self) {
        self.stack.push(self.model_view);
    }

    /// Restore and return the most recent snapshot; `None` if there is none.
    pub fn pop(&mut self) -> Option<Mat4> {
        let snapshot = self.stack.pop()?;
        self.model_view = snapshot;
        Some(snapshot)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Push now, pop when the guard drops (unwinding included).
    pub fn scoped(&mut self) -> ModelViewGuard<'_> {
        self.push();
        ModelViewGuard { transforms: self }
    }

    pub fn model_view(&self) -> Mat4 {
        self.model_view
    }

    pub fn model_view_mut(&mut self) -> &mut Mat4 {
        &mut self.model_view
    }

    pub fn set_model_view(&mut self, matrix: Mat4) {
        self.model_view = matrix;
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// The normal matrix as of the last upload.
    pub fn normal(&self) -> Mat4 {
        self.normal
    }

    /// Post-multiply the model-view matrix, like `mat4.translate(mv, mv, v)`.
    pub fn apply(&mut self, transform: Mat4) {
        self.model_view *= transform;
    }

    /// Derive the normal matrix and upload all three to the bound program.
    pub fn set_matrix_uniforms<G: GpuContext>(&mut self, ctx: &mut RenderContext<G>) {
        self.calculate_normal();
        ctx.set_matrix4(names::U_MODEL_VIEW_MATRIX, &self.model_view.to_cols_array());
        ctx.set_matrix4(names::U_PROJECTION_MATRIX, &self.projection.to_cols_array());
        ctx.set_matrix4(names::U_NORMAL_MATRIX, &self.normal.to_cols_array());
        tracing::trace!(depth = self.stack.len(), "matrix uniforms uploaded");
    }
}

/// Scoped model-view snapshot from [`TransformStack::scoped`].
pub struct ModelViewGuard<'a> {
    transforms: &'a mut TransformStack,
}

impl Deref for ModelViewGuard<'_> {
    type Target = TransformStack;

    fn deref(&self) -> &TransformStack {
        self.transforms
    }
}

impl DerefMut for ModelViewGuard<'_> {
    fn deref_mut(&mut self) -> &mut TransformStack {
        self.transforms
    }
}

impl Drop for ModelViewGuard<'_> {
    fn drop(&mut self) {
        self.transforms.pop();
    }
}
