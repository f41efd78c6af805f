use std::path::PathBuf;

use rtgl_gpu::GpuError;

/// Why a model did not make it into the scene.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not fetch {locator}: {reason}")]
    Fetch { locator: String, reason: String },
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model JSON error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Gpu(#[from] GpuError),
}
