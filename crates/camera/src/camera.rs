use std::cell::Cell;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// How a [`Camera`] moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    /// First person: rotations turn the camera in place.
    Tracking,
    /// Rotations swing the camera around its focus point.
    #[default]
    Orbiting,
}

/// A tracking or orbiting camera.
///
/// Angles are in degrees. For a tracking camera `position` is the eye in world
/// space; for an orbiting camera it is the eye offset from `focus` before the
/// orbit rotation is applied.
#[derive(Debug, Clone)]
pub struct Camera {
    kind: CameraKind,
    position: Vec3,
    focus: Vec3,
    home: Vec3,
    elevation: f32,
    azimuth: f32,
    /// Vertical field of view, degrees.
    pub fov: f32,
    pub min_z: f32,
    pub max_z: f32,
    view: Cell<Option<Mat4>>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraKind::default())
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

impl Camera {
    pub fn new(kind: CameraKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            focus: Vec3::ZERO,
            home: Vec3::ZERO,
            elevation: 0.0,
            azimuth: 0.0,
            fov: 45.0,
            min_z: 0.1,
            max_z: 10000.0,
            view: Cell::new(None),
        }
    }

    pub fn kind(&self) -> CameraKind {
        self.kind
    }

    pub fn is_tracking(&self) -> bool {
        self.kind == CameraKind::Tracking
    }

    pub fn is_orbiting(&self) -> bool {
        self.kind == CameraKind::Orbiting
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn focus(&self) -> Vec3 {
        self.focus
    }

    pub fn home(&self) -> Vec3 {
        self.home
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    fn invalidate(&mut self) {
        self.view.set(None);
    }

    pub fn set_type(&mut self, kind: CameraKind) {
        self.kind = kind;
        self.invalidate();
    }

    /// Reset to the home position with no rotation, optionally moving home first.
    pub fn go_home(&mut self, home: Option<Vec3>) {
        if let Some(home) = home {
            self.home = home;
        }
        self.position = self.home;
        self.azimuth = 0.0;
        self.elevation = 0.0;
        self.invalidate();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.invalidate();
    }

    pub fn set_focus(&mut self, focus: Vec3) {
        self.focus = focus;
        self.invalidate();
    }

    pub fn set_elevation(&mut self, degrees: f32) {
        self.elevation = wrap_degrees(degrees);
        self.invalidate();
    }

    pub fn set_azimuth(&mut self, degrees: f32) {
        self.azimuth = wrap_degrees(degrees);
        self.invalidate();
    }

    pub fn change_elevation(&mut self, delta: f32) {
        self.set_elevation(self.elevation + delta);
    }

    pub fn change_azimuth(&mut self, delta: f32) {
        self.set_azimuth(self.azimuth + delta);
    }

    /// Move along the viewing axis. Positive amounts move toward the scene.
    ///
    /// An orbiting camera never passes through its focus.
    pub fn dolly(&mut self, amount: f32) {
        match self.kind {
            CameraKind::Tracking => {
                let normal = self.normal();
                self.position -= normal * amount;
            }
            CameraKind::Orbiting => {
                let distance = (self.position.length() - amount).max(0.0);
                let direction = self.position.try_normalize().unwrap_or(Vec3::Z);
                self.position = direction * distance;
            }
        }
        tracing::trace!(position = ?self.position, "dolly");
        self.invalidate();
    }

    /// Camera-to-world transform.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_y(self.azimuth.to_radians())
            * Mat4::from_rotation_x(self.elevation.to_radians());
        match self.kind {
            CameraKind::Tracking => Mat4::from_translation(self.position) * rotation,
            CameraKind::Orbiting => {
                Mat4::from_translation(self.focus)
                    * rotation
                    * Mat4::from_translation(self.position)
            }
        }
    }

    /// World-to-camera transform. Cached until the next mutation.
    pub fn view_transform(&self) -> Mat4 {
        if let Some(view) = self.view.get() {
            return view;
        }
        let view = self.matrix().inverse();
        self.view.set(Some(view));
        view
    }

    /// Eye position in world space.
    pub fn world_position(&self) -> Vec3 {
        self.matrix().w_axis.truncate()
    }

    pub fn right(&self) -> Vec3 {
        self.matrix().x_axis.truncate()
    }

    pub fn up(&self) -> Vec3 {
        self.matrix().y_axis.truncate()
    }

    /// Camera +Z in world space, pointing away from what it looks at.
    pub fn normal(&self) -> Vec3 {
        self.matrix().z_axis.truncate()
    }
}
