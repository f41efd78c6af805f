use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use futures::channel::oneshot;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use rtgl_common::ObjectId;
use rtgl_gpu::{GpuContext, RenderContext};

use crate::error::LoadError;
use crate::graph::SceneGraph;
use crate::payload::{ModelPayload, ObjectAttributes};

/// Where model payloads come from. Fetching is the only suspension point of a load.
pub trait AssetSource {
    fn fetch(&self, locator: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>>;
}

/// Reads payloads from files under a root directory.
///
/// Each read runs on its own thread, so concurrent fetches overlap.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FileSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.root.join(locator.trim_start_matches('/'));
        let (tx, rx) = oneshot::channel();
        let target = path.clone();
        std::thread::spawn(move || {
            let _ = tx.send(std::fs::read(&target));
        });
        match rx.await {
            Ok(read) => read.map_err(|source| LoadError::Io { path, source }),
            Err(oneshot::Canceled) => Err(LoadError::Fetch {
                locator: locator.to_string(),
                reason: "reader thread exited".into(),
            }),
        }
    }
}

/// In-memory payloads keyed by locator.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(locator.into(), bytes.into());
    }

    pub fn with(mut self, locator: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(locator, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, LoadError> {
        self.entries
            .get(locator)
            .cloned()
            .ok_or_else(|| LoadError::Fetch {
                locator: locator.to_string(),
                reason: "not found".into(),
            })
    }
}

/// A fetched part: its locator and the parsed payload or the failure.
pub type FetchedPart = (String, Result<ModelPayload, LoadError>);

/// Outcome of a multi-part load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Ids in the order the parts resolved.
    pub loaded: Vec<ObjectId>,
    pub failed: Vec<(String, LoadError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn record(&mut self, locator: String, added: Result<ObjectId, LoadError>) {
        match added {
            Ok(id) => self.loaded.push(id),
            Err(err) => self.failed.push((locator, err)),
        }
    }
}

/// Fetch and parse one payload. Touches nothing but `source`.
pub async fn fetch_model<S: AssetSource>(
    source: &S,
    locator: &str,
) -> Result<ModelPayload, LoadError> {
    let bytes = source.fetch(locator).await?;
    ModelPayload::from_json(&bytes)
}

/// Fetch `{prefix}1.json` through `{prefix}{count}.json` concurrently.
///
/// Items arrive in resolution order. The stream never touches the scene, so a
/// host can keep drawing and reordering between items and hand each one to
/// [`SceneGraph::add_loaded`].
pub fn fetch_parts<S: AssetSource>(
    source: &S,
    prefix: &str,
    count: usize,
) -> impl Stream<Item = FetchedPart> + Unpin {
    let pending = FuturesUnordered::new();
    for part in 1..=count {
        let locator = format!("{prefix}{part}.json");
        pending.push(async move {
            let fetched = fetch_model(source, &locator).await;
            (locator, fetched)
        });
    }
    pending
}

impl SceneGraph {
    /// Fetch, parse and add one model.
    ///
    /// The alias is `alias`, else the payload's own, else the locator. A loaded
    /// object is always visible unless `extra` says otherwise. Failures are
    /// logged and leave the scene unchanged. The scene stays borrowed until the
    /// fetch resolves; hosts that render meanwhile use [`fetch_model`] and
    /// [`SceneGraph::add_loaded`].
    pub async fn load<G: GpuContext, S: AssetSource>(
        &mut self,
        ctx: &mut RenderContext<G>,
        source: &S,
        locator: &str,
        alias: Option<&str>,
        extra: &ObjectAttributes,
    ) -> Result<ObjectId, LoadError> {
        let fetched = fetch_model(source, locator).await;
        self.add_loaded(ctx, locator, fetched, alias, extra)
    }

    /// Load every part of a split model and add each as it resolves.
    ///
    /// Parts may land in any order. Failed parts are logged and collected;
    /// they never stop the others. This drives [`fetch_parts`] to the end
    /// while holding the scene.
    pub async fn load_by_parts<G: GpuContext, S: AssetSource>(
        &mut self,
        ctx: &mut RenderContext<G>,
        source: &S,
        prefix: &str,
        count: usize,
        alias: Option<&str>,
    ) -> LoadReport {
        let mut parts = fetch_parts(source, prefix, count);
        let mut report = LoadReport::default();
        let extra = ObjectAttributes::default();
        while let Some((locator, fetched)) = parts.next().await {
            let added = self.add_loaded(ctx, &locator, fetched, alias, &extra);
            report.record(locator, added);
        }
        tracing::debug!(
            prefix,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "load by parts finished"
        );
        report
    }

    /// Add a payload produced by [`fetch_model`] or [`fetch_parts`].
    ///
    /// Alias resolution and visibility follow [`SceneGraph::load`]. A failed
    /// fetch is logged and passed through.
    pub fn add_loaded<G: GpuContext>(
        &mut self,
        ctx: &mut RenderContext<G>,
        locator: &str,
        fetched: Result<ModelPayload, LoadError>,
        alias: Option<&str>,
        extra: &ObjectAttributes,
    ) -> Result<ObjectId, LoadError> {
        let added = fetched.and_then(|mut payload| {
            payload.alias = alias
                .map(str::to_string)
                .or(payload.alias.take())
                .or_else(|| Some(locator.to_string()));
            payload.visible = Some(true);
            self.add(ctx, payload, extra)
        });
        if let Err(err) = &added {
            tracing::error!(locator, "could not load model: {err}");
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;
    use crate::graph::tests::{context, triangle};

    fn json(payload: &ModelPayload) -> Vec<u8> {
        serde_json::to_vec(payload).unwrap()
    }

    /// Pending for `n` polls, waking itself each time.
    struct Yield(usize);

    impl Future for Yield {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 == 0 {
                return Poll::Ready(());
            }
            self.0 -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    /// A memory source where some locators take more polls to resolve.
    struct DelayedSource {
        inner: MemorySource,
        delays: HashMap<String, usize>,
    }

    impl AssetSource for DelayedSource {
        async fn fetch(&self, locator: &str) -> Result<Vec<u8>, LoadError> {
            Yield(self.delays.get(locator).copied().unwrap_or(0)).await;
            self.inner.fetch(locator).await
        }
    }

    fn delayed(entries: &[(&str, Option<&str>, usize)]) -> DelayedSource {
        let mut inner = MemorySource::new();
        let mut delays = HashMap::new();
        for &(locator, alias, delay) in entries {
            if let Some(alias) = alias {
                inner.insert(locator, json(&triangle(alias)));
            }
            delays.insert(locator.to_string(), delay);
        }
        DelayedSource { inner, delays }
    }

    #[test]
    fn load_resolves_alias() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let unnamed = ModelPayload {
            alias: None,
            ..triangle("")
        };
        let source = MemorySource::new()
            .with("models/cone.json", json(&triangle("cone")))
            .with("models/plain.json", json(&unnamed));
        let extra = ObjectAttributes::default();

        pollster::block_on(async {
            scene
                .load(&mut ctx, &source, "models/cone.json", None, &extra)
                .await
                .unwrap();
            scene
                .load(&mut ctx, &source, "models/cone.json", Some("renamed"), &extra)
                .await
                .unwrap();
            scene
                .load(&mut ctx, &source, "models/plain.json", None, &extra)
                .await
                .unwrap();
        });
        assert_eq!(scene.render_order(), "cone > renamed > models/plain.json");
    }

    #[test]
    fn load_forces_visible() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let hidden = ModelPayload {
            visible: Some(false),
            ..triangle("ghost")
        };
        let source = MemorySource::new().with("ghost.json", json(&hidden));
        pollster::block_on(scene.load(
            &mut ctx,
            &source,
            "ghost.json",
            None,
            &ObjectAttributes::default(),
        ))
        .unwrap();
        assert!(scene.get("ghost").unwrap().visible);
    }

    #[test]
    fn failed_load_leaves_scene_unchanged() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let source = MemorySource::new().with("broken.json", "{ not json");
        let extra = ObjectAttributes::default();

        let missing =
            pollster::block_on(scene.load(&mut ctx, &source, "missing.json", None, &extra));
        assert!(matches!(missing, Err(LoadError::Fetch { .. })));
        let broken = pollster::block_on(scene.load(&mut ctx, &source, "broken.json", None, &extra));
        assert!(matches!(broken, Err(LoadError::Parse(_))));
        assert!(scene.is_empty());
        assert_eq!(ctx.gl.live_buffer_count(), 0);
    }

    #[test]
    fn load_by_parts_survives_failed_part() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let source = MemorySource::new()
            .with("car/part1.json", json(&triangle("p1")))
            .with("car/part3.json", json(&triangle("p3")));

        let report = pollster::block_on(scene.load_by_parts(
            &mut ctx,
            &source,
            "car/part",
            3,
            Some("car"),
        ));
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "car/part2.json");
        assert!(!report.is_complete());

        assert_eq!(scene.len(), 2);
        assert!(scene.iter().all(|object| object.alias == "car"));
        for id in &report.loaded {
            assert!(scene.get_by_id(*id).is_some());
        }
    }

    #[test]
    fn load_by_parts_keeps_part_aliases_without_override() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let source = MemorySource::new()
            .with("p1.json", json(&triangle("wheel")))
            .with("p2.json", json(&triangle("body")));

        let report = pollster::block_on(scene.load_by_parts(&mut ctx, &source, "p", 2, None));
        assert!(report.is_complete());
        assert!(scene.get("wheel").is_some());
        assert!(scene.get("body").is_some());
    }

    #[test]
    fn file_source_reads_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("models")).unwrap();
        std::fs::write(dir.path().join("models/cone.json"), json(&triangle("cone"))).unwrap();
        let source = FileSource::new(dir.path());

        let bytes = pollster::block_on(source.fetch("/models/cone.json")).unwrap();
        assert_eq!(ModelPayload::from_json(&bytes).unwrap().alias.as_deref(), Some("cone"));

        let err = pollster::block_on(source.fetch("models/nope.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn parts_land_in_resolution_order() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        // part2 is missing and fails before the slower parts arrive
        let source = delayed(&[
            ("car/part1.json", Some("p1"), 6),
            ("car/part2.json", None, 3),
            ("car/part3.json", Some("p3"), 0),
        ]);

        let report = pollster::block_on(scene.load_by_parts(&mut ctx, &source, "car/part", 3, None));
        assert_eq!(scene.render_order(), "p3 > p1");
        let p1 = scene.get("p1").unwrap().id();
        let p3 = scene.get("p3").unwrap().id();
        assert_eq!(report.loaded, vec![p3, p1]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "car/part2.json");
        assert!(matches!(report.failed[0].1, LoadError::Fetch { .. }));
    }

    #[test]
    fn scene_stays_usable_while_parts_are_pending() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        scene
            .add(&mut ctx, triangle("floor"), &ObjectAttributes::default())
            .unwrap();
        let source = delayed(&[
            ("car/part1.json", Some("p1"), 0),
            ("car/part2.json", Some("p2"), 4),
        ]);
        let extra = ObjectAttributes::default();
        let mut report = LoadReport::default();

        let mut parts = fetch_parts(&source, "car/part", 2);
        let (locator, fetched) = pollster::block_on(parts.next()).unwrap();
        assert_eq!(locator, "car/part1.json");
        let added = scene.add_loaded(&mut ctx, &locator, fetched, None, &extra);
        report.record(locator, added);

        // reorders and draws between parts only see what has arrived
        assert!(scene.render_first("p1"));
        assert!(!scene.render_later("p2"));
        let mut drawn = 0;
        scene.traverse(|object, _| {
            if object.draw(&mut ctx.gl) {
                drawn += 1;
            }
            ControlFlow::<()>::Continue(())
        });
        assert_eq!(drawn, 2);
        assert_eq!(scene.render_order(), "p1 > floor");

        let (locator, fetched) = pollster::block_on(parts.next()).unwrap();
        assert_eq!(locator, "car/part2.json");
        let added = scene.add_loaded(&mut ctx, &locator, fetched, None, &extra);
        report.record(locator, added);
        assert!(pollster::block_on(parts.next()).is_none());

        assert!(report.is_complete());
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(scene.render_order(), "p1 > floor > p2");
    }

    #[test]
    fn add_loaded_passes_fetch_failures_through() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let fetched = Err(LoadError::Fetch {
            locator: "gone.json".into(),
            reason: "not found".into(),
        });
        let added = scene.add_loaded(&mut ctx, "gone.json", fetched, None, &ObjectAttributes::default());
        assert!(matches!(added, Err(LoadError::Fetch { .. })));
        assert!(scene.is_empty());
    }

    #[test]
    fn extra_alias_wins_over_resolved_alias() {
        let mut ctx = context();
        let mut scene = SceneGraph::new();
        let source = MemorySource::new().with("cone.json", json(&triangle("cone")));
        let extra = ObjectAttributes {
            alias: Some("tip".into()),
            ..ObjectAttributes::default()
        };
        pollster::block_on(scene.load(&mut ctx, &source, "cone.json", Some("given"), &extra)).unwrap();
        assert_eq!(scene.render_order(), "tip");
    }
}
