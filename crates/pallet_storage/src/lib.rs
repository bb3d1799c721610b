#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

pub mod cache;
pub mod diagnostics;
pub mod line_format;
pub mod loader;
pub mod source;
pub mod structured;

pub use cache::{SnapshotCache, DEFAULT_SNAPSHOT_TTL};
pub use diagnostics::{DiagnosticKind, LoadDiagnostic};
pub use loader::{
    load_snapshot, FileSnapshotLoader, LoadOutcome, LoadedSnapshot, SnapshotLoader, SourceFormat,
};
pub use source::DataSource;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .path.display())]
    NotUtf8 { path: PathBuf },

    #[error("malformed structured document: {0}")]
    Json(#[from] serde_json::Error),
}
