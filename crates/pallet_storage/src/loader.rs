#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use pallet_contracts::PalletStore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::diagnostics::{DiagnosticKind, LoadDiagnostic};
use crate::line_format::parse_line_oriented;
use crate::source::DataSource;
use crate::structured::parse_structured;
use crate::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceFormat {
    Structured,
    LineOriented,
}

/// One immutable load of the data files.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot {
    pub store: PalletStore,
    pub format: SourceFormat,
    pub source_path: PathBuf,
    /// Lower-case hex SHA-256 of the bytes the store was parsed from.
    pub content_digest: String,
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadedSnapshot {
    pub fn record_count(&self) -> usize {
        self.store.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(LoadedSnapshot),
    /// Neither file exists, or none of the present files could be read.
    NoData,
}

impl LoadOutcome {
    pub fn snapshot(&self) -> Option<&LoadedSnapshot> {
        match self {
            LoadOutcome::Loaded(snapshot) => Some(snapshot),
            LoadOutcome::NoData => None,
        }
    }
}

pub trait SnapshotLoader {
    fn load(&self, source: &DataSource) -> LoadOutcome;
}

/// Reads the structured file first and falls back to the line-oriented one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSnapshotLoader;

impl SnapshotLoader for FileSnapshotLoader {
    fn load(&self, source: &DataSource) -> LoadOutcome {
        load_snapshot(source)
    }
}

pub fn load_snapshot(source: &DataSource) -> LoadOutcome {
    let mut carried = Vec::new();

    let structured_path = source.structured_path();
    if structured_path.exists() {
        match load_structured(structured_path) {
            Ok(snapshot) => {
                info!(
                    path = %structured_path.display(),
                    records = snapshot.record_count(),
                    skipped = snapshot.diagnostics.len(),
                    "loaded structured traceability data"
                );
                return LoadOutcome::Loaded(snapshot);
            }
            Err(err) => {
                warn!(
                    path = %structured_path.display(),
                    error = %err,
                    "structured data unusable, trying line-oriented file"
                );
                carried.push(LoadDiagnostic::new(
                    DiagnosticKind::StructuredParseFailed,
                    err.to_string(),
                ));
            }
        }
    } else {
        debug!(path = %structured_path.display(), "structured data file not present");
    }

    let line_path = source.line_path();
    if !line_path.exists() {
        warn!(
            structured = %structured_path.display(),
            line = %line_path.display(),
            "no traceability data available"
        );
        return LoadOutcome::NoData;
    }
    match load_line_oriented(line_path) {
        Ok(mut snapshot) => {
            carried.append(&mut snapshot.diagnostics);
            snapshot.diagnostics = carried;
            info!(
                path = %line_path.display(),
                records = snapshot.record_count(),
                skipped = snapshot.diagnostics.len(),
                "loaded line-oriented traceability data"
            );
            LoadOutcome::Loaded(snapshot)
        }
        Err(err) => {
            warn!(
                path = %line_path.display(),
                error = %err,
                "line-oriented data unreadable, no traceability data available"
            );
            LoadOutcome::NoData
        }
    }
}

fn load_structured(path: &Path) -> Result<LoadedSnapshot, LoadError> {
    let raw = read_text(path)?;
    let parsed = parse_structured(&raw)?;
    Ok(LoadedSnapshot {
        store: parsed.store,
        format: SourceFormat::Structured,
        source_path: path.to_path_buf(),
        content_digest: sha256_hex(raw.as_bytes()),
        diagnostics: parsed.diagnostics,
    })
}

fn load_line_oriented(path: &Path) -> Result<LoadedSnapshot, LoadError> {
    let raw = read_text(path)?;
    let parsed = parse_line_oriented(&raw);
    for diagnostic in &parsed.diagnostics {
        debug!(path = %path.display(), %diagnostic, "skipped line-oriented input");
    }
    Ok(LoadedSnapshot {
        store: parsed.store,
        format: SourceFormat::LineOriented,
        source_path: path.to_path_buf(),
        content_digest: sha256_hex(raw.as_bytes()),
        diagnostics: parsed.diagnostics,
    })
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| LoadError::NotUtf8 {
        path: path.to_path_buf(),
    })?;
    // BOM is not content.
    if let Some(stripped) = text.strip_prefix('\u{feff}') {
        return Ok(stripped.to_string());
    }
    Ok(text)
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_loader_01_digest_is_lower_hex_sha256() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn at_loader_02_missing_files_mean_no_data() {
        let base = std::env::temp_dir().join("pallet-loader-definitely-missing-dir");
        let source = DataSource::default_in_dir(&base);
        assert_eq!(load_snapshot(&source), LoadOutcome::NoData);
        assert!(load_snapshot(&source).snapshot().is_none());
    }
}
