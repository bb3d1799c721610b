#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub const DEFAULT_STRUCTURED_FILE: &str = "dados_rastreabilidade.json";
pub const DEFAULT_LINE_FILE: &str = "dados_rastreabilidade.txt";

/// The two fixed files a snapshot may come from. Also the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSource {
    structured_path: PathBuf,
    line_path: PathBuf,
}

impl DataSource {
    pub fn for_paths(structured_path: PathBuf, line_path: PathBuf) -> Self {
        Self {
            structured_path,
            line_path,
        }
    }

    pub fn in_dir(dir: &Path, structured_file: &str, line_file: &str) -> Self {
        Self::for_paths(dir.join(structured_file), dir.join(line_file))
    }

    pub fn default_in_dir(dir: &Path) -> Self {
        Self::in_dir(dir, DEFAULT_STRUCTURED_FILE, DEFAULT_LINE_FILE)
    }

    pub fn structured_path(&self) -> &Path {
        &self.structured_path
    }

    pub fn line_path(&self) -> &Path {
        &self.line_path
    }

    pub fn any_file_present(&self) -> bool {
        self.structured_path.exists() || self.line_path.exists()
    }
}
