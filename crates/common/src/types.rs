use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of a render object inside a scene graph.
///
/// Aliases may repeat across the parts of a composite model; the id never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Four-component colour as the asset payloads store it.
pub type Rgba = [f32; 4];

pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const AMBIENT_GRAY: Rgba = [0.2, 0.2, 0.2, 1.0];

/// First three components of a colour.
pub fn rgb(color: Rgba) -> [f32; 3] {
    [color[0], color[1], color[2]]
}

/// Drawable surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. A zero height is treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_uniqueness() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn viewport_aspect() {
        assert_eq!(Viewport::new(800, 400).aspect(), 2.0);
        assert_eq!(Viewport::new(640, 0).aspect(), 640.0);
    }

    #[test]
    fn rgb_drops_alpha() {
        assert_eq!(rgb([0.1, 0.2, 0.3, 0.4]), [0.1, 0.2, 0.3]);
    }
}
