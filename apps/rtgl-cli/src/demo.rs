//! Headless demo: the per-chapter entry point, driven by a manifest.

use std::cell::Cell;
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use rtgl_camera::Camera;
use rtgl_clock::{Clock, ClockEvent, FixedStep};
use rtgl_common::Viewport;
use rtgl_gpu::{RecordingGpu, RenderContext, names};
use futures::StreamExt;
use rtgl_scene::{FileSource, ObjectAttributes, SceneGraph, fetch_parts, shapes};
use rtgl_transforms::TransformStack;

use crate::manifest::{DemoManifest, ReorderOp};

pub const DEFAULT_VERTEX_SHADER: &str = r#"#version 300 es
precision mediump float;

uniform mat4 uModelViewMatrix;
uniform mat4 uProjectionMatrix;
uniform mat4 uNormalMatrix;

in vec3 aVertexPosition;
in vec3 aVertexNormal;
in vec4 aVertexColor;

out vec3 vNormal;
out vec3 vEyeVector;
out vec4 vColor;

void main(void) {
    vec4 vertex = uModelViewMatrix * vec4(aVertexPosition, 1.0);
    vNormal = vec3(uNormalMatrix * vec4(aVertexNormal, 1.0));
    vEyeVector = -vec3(vertex.xyz);
    vColor = aVertexColor;
    gl_Position = uProjectionMatrix * vertex;
}
"#;

pub const DEFAULT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

uniform vec4 uMaterialAmbient;
uniform vec4 uMaterialDiffuse;
uniform vec4 uMaterialSpecular;
uniform bool uWireframe;

in vec3 vNormal;
in vec3 vEyeVector;
in vec4 vColor;

out vec4 fragColor;

void main(void) {
    if (uWireframe) {
        fragColor = uMaterialDiffuse;
    }
    else {
        vec3 N = normalize(vNormal);
        vec3 E = normalize(vEyeVector);
        float facing = max(dot(N, E), 0.0);
        fragColor = uMaterialAmbient + uMaterialDiffuse * facing + uMaterialSpecular * pow(facing, 8.0);
    }
}
"#;

/// Everything a frame touches. Owned by the host, lent to clock listeners.
pub struct DemoState {
    pub ctx: RenderContext<RecordingGpu>,
    pub camera: Camera,
    pub transforms: TransformStack,
    pub scene: SceneGraph,
    pub viewport: Viewport,
    pub draws: usize,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub frames: u64,
    pub draws: usize,
    pub failed_listeners: usize,
    pub simulation_steps: u32,
    pub loaded: usize,
    pub failed_loads: Vec<String>,
    pub render_order: String,
}

pub fn build(manifest: &DemoManifest, base_dir: &Path) -> anyhow::Result<(DemoState, RunSummary)> {
    let (vertex, fragment) = match &manifest.shaders {
        Some(paths) => (
            read(&base_dir.join(&paths.vertex))?,
            read(&base_dir.join(&paths.fragment))?,
        ),
        None => (
            DEFAULT_VERTEX_SHADER.to_string(),
            DEFAULT_FRAGMENT_SHADER.to_string(),
        ),
    };
    let ctx = RenderContext::with_program(
        RecordingGpu::new(),
        &vertex,
        &fragment,
        names::ATTRIBUTES,
        names::UNIFORMS,
    );
    if let Some(err) = ctx.program.error() {
        anyhow::bail!("shader program unusable: {err}");
    }

    let config = &manifest.camera;
    let mut camera = Camera::new(config.kind);
    camera.fov = config.fov;
    camera.go_home(Some(config.home));
    camera.set_focus(config.focus);
    camera.set_azimuth(config.azimuth);
    camera.set_elevation(config.elevation);

    let mut transforms = TransformStack::new(&camera, manifest.canvas);
    transforms.set_projection(manifest.projection);
    transforms.update_perspective(&camera, manifest.canvas);

    let mut state = DemoState {
        ctx,
        camera,
        transforms,
        scene: SceneGraph::new(),
        viewport: manifest.canvas,
        draws: 0,
    };
    let mut summary = RunSummary::default();
    populate(&mut state, manifest, base_dir, &mut summary)?;
    Ok((state, summary))
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading shader {}", path.display()))
}

fn populate(
    state: &mut DemoState,
    manifest: &DemoManifest,
    base_dir: &Path,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    let defaults = ObjectAttributes::default();
    if let Some(floor) = manifest.floor {
        state
            .scene
            .add(&mut state.ctx, shapes::floor(floor.dimension, floor.lines), &defaults)?;
    }
    if let Some(dimension) = manifest.axis {
        state
            .scene
            .add(&mut state.ctx, shapes::axis(dimension), &defaults)?;
    }

    let source = FileSource::new(base_dir.join(&manifest.assets));
    for model in &manifest.models {
        let alias = model.alias.as_deref();
        match model.parts {
            Some(count) => {
                let mut parts = fetch_parts(&source, &model.path, count);
                while let Some((locator, fetched)) = pollster::block_on(parts.next()) {
                    let added = state.scene.add_loaded(
                        &mut state.ctx,
                        &locator,
                        fetched,
                        alias,
                        &model.attributes,
                    );
                    match added {
                        Ok(_) => summary.loaded += 1,
                        Err(_) => summary.failed_loads.push(locator),
                    }
                }
            }
            None => {
                let loaded = pollster::block_on(state.scene.load(
                    &mut state.ctx,
                    &source,
                    &model.path,
                    alias,
                    &model.attributes,
                ));
                match loaded {
                    Ok(_) => summary.loaded += 1,
                    Err(_) => summary.failed_loads.push(model.path.clone()),
                }
            }
        }
    }

    for op in &manifest.reorder {
        let changed = match op {
            ReorderOp::First(alias) => state.scene.render_first(alias),
            ReorderOp::Last(alias) => state.scene.render_last(alias),
            ReorderOp::Sooner(alias) => state.scene.render_sooner(alias),
            ReorderOp::Later(alias) => state.scene.render_later(alias),
            ReorderOp::Remove(alias) => state.scene.discard(&mut state.ctx.gl, alias),
        };
        if !changed {
            tracing::debug!(?op, "reorder had no effect");
        }
    }
    Ok(())
}

/// Recompute transforms and draw every object once.
pub fn draw(state: &mut DemoState) {
    let DemoState {
        ctx,
        camera,
        transforms,
        scene,
        viewport,
        draws,
    } = state;
    transforms.calculate_model_view(camera);
    transforms.update_perspective(camera, *viewport);

    scene.traverse(|object, _| {
        let mut scope = transforms.scoped();
        scope.set_matrix_uniforms(ctx);
        object.upload_material(ctx);
        if object.draw(&mut ctx.gl) {
            *draws += 1;
        }
        ControlFlow::<()>::Continue(())
    });
}

/// Tick the clock `manifest.frames` times with an animate and a render listener.
pub fn run(mut state: DemoState, manifest: &DemoManifest, mut summary: RunSummary) -> RunSummary {
    let frame = Duration::from_millis(manifest.frame_ms);
    let orbit = manifest.orbit;
    let steps = Rc::new(Cell::new(0u32));

    let mut clock: Clock<DemoState> = Clock::new();
    let mut pacer = FixedStep::default();
    let counted = Rc::clone(&steps);
    clock.on(ClockEvent::Tick, move |state: &mut DemoState| {
        let due = pacer.advance(frame);
        if due > 0 && orbit != 0.0 {
            state.camera.change_azimuth(orbit * due as f32);
        }
        counted.set(counted.get() + due);
    });
    clock.on(ClockEvent::Tick, draw);

    for _ in 0..manifest.frames {
        let report = clock.tick(&mut state);
        summary.failed_listeners += report.failed;
    }

    summary.frames = clock.frame();
    summary.draws = state.draws;
    summary.simulation_steps = steps.get();
    summary.render_order = state.scene.render_order();
    summary
}
