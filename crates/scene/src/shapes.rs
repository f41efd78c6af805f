//! Wireframe helper shapes the demos add next to loaded models.

use crate::payload::ModelPayload;

/// Densest floor whose vertices still fit 16-bit indices.
pub const MAX_FLOOR_LINES: u32 = (u16::MAX as u32 + 1) / 4 - 1;

/// Square grid on the XZ plane, `2 * dimension` across, `lines` cells per side.
///
/// `lines` is clamped to `1..=MAX_FLOOR_LINES`.
pub fn floor(dimension: f32, lines: u32) -> ModelPayload {
    let lines = lines.clamp(1, MAX_FLOOR_LINES);
    let step = 2.0 * dimension / lines as f32;
    let mut vertices = Vec::new();
    for i in 0..=lines {
        let offset = -dimension + i as f32 * step;
        // along X
        vertices.extend([-dimension, 0.0, offset, dimension, 0.0, offset]);
        // along Z
        vertices.extend([offset, 0.0, -dimension, offset, 0.0, dimension]);
    }
    let indices = (0..=u16::MAX).take(vertices.len() / 3).collect();
    wireframe("floor", vertices, indices)
}

/// X, Y and Z axis lines through the origin; Y is half length.
pub fn axis(dimension: f32) -> ModelPayload {
    let half = dimension / 2.0;
    let vertices = vec![
        -dimension, 0.0, 0.0, dimension, 0.0, 0.0, //
        0.0, -half, 0.0, 0.0, half, 0.0, //
        0.0, 0.0, -dimension, 0.0, 0.0, dimension,
    ];
    wireframe("axis", vertices, (0..6).collect())
}

fn wireframe(alias: &str, vertices: Vec<f32>, indices: Vec<u16>) -> ModelPayload {
    ModelPayload {
        alias: Some(alias.to_string()),
        vertices,
        indices,
        wireframe: Some(true),
        visible: Some(true),
        ..ModelPayload::default()
    }
}
