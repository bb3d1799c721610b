#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use pallet_os::TraceabilityConfig;
use pallet_storage::source::{DEFAULT_LINE_FILE, DEFAULT_STRUCTURED_FILE};
use pallet_storage::{DataSource, DEFAULT_SNAPSHOT_TTL};
use tracing::{debug, warn};

use crate::AdapterError;

pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";
pub const CACHE_TTL_SECS_RANGE: RangeInclusive<u64> = 1..=3_600;

pub const ENV_HTTP_BIND: &str = "PALLET_HTTP_BIND";
pub const ENV_DATA_DIR: &str = "PALLET_DATA_DIR";
pub const ENV_JSON_FILE: &str = "PALLET_JSON_FILE";
pub const ENV_TXT_FILE: &str = "PALLET_TXT_FILE";
pub const ENV_CACHE_TTL_SECS: &str = "PALLET_CACHE_TTL_SECS";
pub const ENV_SHARE_URL_BASE: &str = "PALLET_SHARE_URL_BASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub http_bind: String,
    pub data_dir: PathBuf,
    pub structured_file: String,
    pub line_file: String,
    pub cache_ttl: Duration,
    pub share_url_base: Option<String>,
}

impl AdapterConfig {
    pub fn mvp_v1() -> Self {
        Self {
            http_bind: DEFAULT_HTTP_BIND.to_string(),
            data_dir: PathBuf::from("."),
            structured_file: DEFAULT_STRUCTURED_FILE.to_string(),
            line_file: DEFAULT_LINE_FILE.to_string(),
            cache_ttl: DEFAULT_SNAPSHOT_TTL,
            share_url_base: None,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_var_map(|key| env::var(key).ok())
    }

    /// Unset, blank or out-of-range values fall back to the `mvp_v1` defaults.
    pub fn from_env_var_map<F>(mut env_getter: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::mvp_v1();
        Self {
            http_bind: non_blank(&mut env_getter, ENV_HTTP_BIND).unwrap_or(defaults.http_bind),
            data_dir: non_blank(&mut env_getter, ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            structured_file: non_blank(&mut env_getter, ENV_JSON_FILE)
                .unwrap_or(defaults.structured_file),
            line_file: non_blank(&mut env_getter, ENV_TXT_FILE).unwrap_or(defaults.line_file),
            cache_ttl: non_blank(&mut env_getter, ENV_CACHE_TTL_SECS)
                .and_then(|raw| parse_cache_ttl(&raw))
                .unwrap_or(defaults.cache_ttl),
            share_url_base: non_blank(&mut env_getter, ENV_SHARE_URL_BASE),
        }
    }

    pub fn http_bind_addr(&self) -> Result<SocketAddr, AdapterError> {
        self.http_bind
            .parse()
            .map_err(|source| AdapterError::InvalidBind {
                value: self.http_bind.clone(),
                source,
            })
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::in_dir(&self.data_dir, &self.structured_file, &self.line_file)
    }

    pub fn traceability_config(&self) -> TraceabilityConfig {
        TraceabilityConfig {
            snapshot_ttl: self.cache_ttl,
            share_url_base: self.share_url_base.clone(),
        }
    }
}

fn non_blank<F>(env_getter: &mut F, key: &str) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let value = env_getter(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if value.is_none() {
        debug!("{key} not set, using default");
    }
    value
}

fn parse_cache_ttl(raw: &str) -> Option<Duration> {
    match raw
        .parse::<u64>()
        .ok()
        .filter(|secs| CACHE_TTL_SECS_RANGE.contains(secs))
    {
        Some(secs) => Some(Duration::from_secs(secs)),
        None => {
            warn!("invalid {ENV_CACHE_TTL_SECS} value {raw:?}, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_config_01_unset_env_yields_defaults() {
        let config = AdapterConfig::from_env_var_map(|_| None);
        assert_eq!(config, AdapterConfig::mvp_v1());
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(
            config.data_source().structured_path(),
            PathBuf::from(".").join("dados_rastreabilidade.json")
        );
    }

    #[test]
    fn at_config_02_overrides_are_trimmed_and_applied() {
        let config = AdapterConfig::from_env_var_map(|key| match key {
            ENV_HTTP_BIND => Some("0.0.0.0:9090".to_string()),
            ENV_DATA_DIR => Some(" /srv/rastreio ".to_string()),
            ENV_TXT_FILE => Some("export.txt".to_string()),
            ENV_CACHE_TTL_SECS => Some("60".to_string()),
            ENV_SHARE_URL_BASE => Some("https://rastreio.example.com".to_string()),
            _ => None,
        });
        assert_eq!(config.http_bind_addr().unwrap().port(), 9090);
        assert_eq!(
            config.data_source().line_path(),
            PathBuf::from("/srv/rastreio/export.txt")
        );
        assert_eq!(config.structured_file, DEFAULT_STRUCTURED_FILE);
        let traceability = config.traceability_config();
        assert_eq!(traceability.snapshot_ttl, Duration::from_secs(60));
        assert_eq!(
            traceability.share_url_base.as_deref(),
            Some("https://rastreio.example.com")
        );
    }

    #[test]
    fn at_config_03_ttl_outside_range_falls_back() {
        for raw in ["0", "3601", "five", "-1"] {
            let config = AdapterConfig::from_env_var_map(|key| {
                (key == ENV_CACHE_TTL_SECS).then(|| raw.to_string())
            });
            assert_eq!(config.cache_ttl, DEFAULT_SNAPSHOT_TTL, "ttl {raw}");
        }
        let config = AdapterConfig::from_env_var_map(|key| {
            (key == ENV_CACHE_TTL_SECS).then(|| "3600".to_string())
        });
        assert_eq!(config.cache_ttl, Duration::from_secs(3_600));
    }

    #[test]
    fn at_config_04_invalid_bind_is_reported() {
        let config = AdapterConfig::from_env_var_map(|key| {
            (key == ENV_HTTP_BIND).then(|| "localhost-no-port".to_string())
        });
        let err = config.http_bind_addr().unwrap_err();
        assert!(err.to_string().contains("localhost-no-port"));
    }
}
