#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use pallet_contracts::MonotonicTimeNs;
use pallet_engines::view::share_url;
use pallet_engines::RecordView;
use pallet_os::{route, LandingStatus, PageRoute, QrDownload, TraceOutcome, TraceabilityService};
use pallet_storage::{LoadOutcome, SourceFormat};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;

pub use config::AdapterConfig;

pub const NOT_FOUND_MESSAGE: &str = "pallet not found";
pub const NO_CODE_MESSAGE: &str = "please provide the pallet code";
pub const NO_DATA_FILE_MESSAGE: &str = "traceability data file not found, run the export first";
pub const QR_NOT_AVAILABLE_MESSAGE: &str = "QR code not available";
pub const LANDING_HINT: &str = "scan the QR code on the pallet label or type the code manually";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid bind address {value:?}: {source}")]
    InvalidBind {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Logs go to stderr so `pallet_lookup` keeps stdout for its JSON.
pub fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TraceQuery {
    pub palete: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SearchRequest {
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AdapterHealthResponse {
    pub status: String,
    pub outcome: String,
    pub format: Option<SourceFormat>,
    pub source_path: Option<String>,
    pub record_count: usize,
    pub content_digest: Option<String>,
    pub diagnostics_count: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TraceAdapterResponse {
    pub status: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pallet_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_files_present: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl TraceAdapterResponse {
    fn landing(landing: LandingStatus) -> Self {
        let message = if landing.data_files_present {
            LANDING_HINT
        } else {
            NO_DATA_FILE_MESSAGE
        };
        Self {
            status: "ok".to_string(),
            outcome: "LANDING".to_string(),
            reason_code: None,
            pallet_code: None,
            message: Some(message.to_string()),
            data_files_present: Some(landing.data_files_present),
            record: None,
            redirect_to: None,
        }
    }

    fn rejected(
        outcome: &str,
        reason_code: Option<u32>,
        code: Option<String>,
        message: &str,
    ) -> Self {
        Self {
            status: "error".to_string(),
            outcome: outcome.to_string(),
            reason_code,
            pallet_code: code,
            message: Some(message.to_string()),
            data_files_present: None,
            record: None,
            redirect_to: None,
        }
    }
}

/// Holds the traceability service and the start-up instant that monotonic
/// time is measured from. Handlers in the HTTP binary delegate here.
pub struct AdapterRuntime {
    service: TraceabilityService,
    started_at: Instant,
}

impl AdapterRuntime {
    pub fn new(service: TraceabilityService) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(TraceabilityService::from_files(
            config.data_source(),
            config.traceability_config(),
        ))
    }

    pub fn health_report(&self, now_ns: Option<u64>) -> AdapterHealthResponse {
        match self.service.snapshot(self.now(now_ns)).as_ref() {
            LoadOutcome::Loaded(snapshot) => AdapterHealthResponse {
                status: "ok".to_string(),
                outcome: "LOADED".to_string(),
                format: Some(snapshot.format),
                source_path: Some(snapshot.source_path.display().to_string()),
                record_count: snapshot.record_count(),
                content_digest: Some(snapshot.content_digest.clone()),
                diagnostics_count: snapshot.diagnostics.len(),
            },
            LoadOutcome::NoData => AdapterHealthResponse {
                status: "ok".to_string(),
                outcome: "NO_DATA".to_string(),
                format: None,
                source_path: None,
                record_count: 0,
                content_digest: None,
                diagnostics_count: 0,
            },
        }
    }

    pub fn trace(
        &self,
        palete: Option<&str>,
        now_ns: Option<u64>,
    ) -> (StatusCode, TraceAdapterResponse) {
        match route(palete) {
            PageRoute::Landing => (
                StatusCode::OK,
                TraceAdapterResponse::landing(self.service.landing_status()),
            ),
            PageRoute::Record(raw) => {
                trace_response(self.service.lookup(&raw, self.now(now_ns)))
            }
        }
    }

    /// Manual code entry. Carries the normalized code so the caller can move to
    /// the shareable `?palete=` address.
    pub fn search(
        &self,
        request: SearchRequest,
        now_ns: Option<u64>,
    ) -> (StatusCode, TraceAdapterResponse) {
        let raw = request.code.unwrap_or_default();
        let (status, mut response) =
            trace_response(self.service.lookup(&raw, self.now(now_ns)));
        response.redirect_to = response
            .pallet_code
            .as_deref()
            .map(|code| share_url(None, code));
        (status, response)
    }

    pub fn qr_download(
        &self,
        palete: Option<&str>,
        now_ns: Option<u64>,
    ) -> Result<QrDownload, (StatusCode, TraceAdapterResponse)> {
        let PageRoute::Record(raw) = route(palete) else {
            return Err((
                StatusCode::BAD_REQUEST,
                TraceAdapterResponse::rejected("NO_CODE", None, None, NO_CODE_MESSAGE),
            ));
        };
        self.service.qr_png(&raw, self.now(now_ns)).ok_or_else(|| {
            debug!(code = %raw, "no embedded QR image");
            (
                StatusCode::NOT_FOUND,
                TraceAdapterResponse::rejected(
                    "QR_NOT_AVAILABLE",
                    None,
                    Some(raw.clone()),
                    QR_NOT_AVAILABLE_MESSAGE,
                ),
            )
        })
    }

    fn now(&self, now_ns: Option<u64>) -> MonotonicTimeNs {
        MonotonicTimeNs(now_ns.unwrap_or_else(|| {
            u64::try_from(self.started_at.elapsed().as_nanos()).unwrap_or(u64::MAX)
        }))
    }
}

fn trace_response(outcome: TraceOutcome) -> (StatusCode, TraceAdapterResponse) {
    let reason_code = Some(outcome.reason_code().0);
    match outcome {
        TraceOutcome::Found { code, view, .. } => (
            StatusCode::OK,
            TraceAdapterResponse {
                status: "ok".to_string(),
                outcome: "FOUND".to_string(),
                reason_code,
                pallet_code: Some(code.as_str().to_string()),
                message: None,
                data_files_present: Some(true),
                record: Some(view),
                redirect_to: None,
            },
        ),
        TraceOutcome::NotFound { code } => (
            StatusCode::NOT_FOUND,
            TraceAdapterResponse::rejected(
                "NOT_FOUND",
                reason_code,
                Some(code.as_str().to_string()),
                NOT_FOUND_MESSAGE,
            ),
        ),
        TraceOutcome::DataUnavailable { code } => (
            StatusCode::NOT_FOUND,
            TraceAdapterResponse::rejected(
                "NO_DATA",
                reason_code,
                Some(code.as_str().to_string()),
                NOT_FOUND_MESSAGE,
            ),
        ),
        TraceOutcome::NoCodeSupplied => (
            StatusCode::BAD_REQUEST,
            TraceAdapterResponse::rejected("NO_CODE", reason_code, None, NO_CODE_MESSAGE),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use pallet_engines::lookup::reason_codes;

    fn temp_dir(name: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(1);
        let base = std::env::temp_dir().join(format!("pallet-adapter-test-{name}-{suffix}"));
        fs::create_dir_all(&base).unwrap();
        base
    }

    fn runtime_in(dir: &PathBuf) -> AdapterRuntime {
        let config = AdapterConfig {
            data_dir: dir.clone(),
            ..AdapterConfig::mvp_v1()
        };
        AdapterRuntime::from_config(&config)
    }

    fn write_structured(dir: &PathBuf) {
        fs::write(
            dir.join("dados_rastreabilidade.json"),
            r#"{"paletes": {
                "PAL-001": {"lote_codigo": "L1", "latitude": -3.1, "longitude": -60.0,
                            "qr_code_url": "data:image/png;base64,iVBORw0KGgo="},
                "PAL-002": {"lote_codigo": "L2"}
            }}"#,
        )
        .unwrap();
    }

    #[test]
    fn at_adapter_01_health_reports_loaded_snapshot() {
        let dir = temp_dir("health");
        write_structured(&dir);
        let runtime = runtime_in(&dir);
        let health = runtime.health_report(Some(0));
        assert_eq!(health.status, "ok");
        assert_eq!(health.outcome, "LOADED");
        assert_eq!(health.format, Some(SourceFormat::Structured));
        assert_eq!(health.record_count, 2);
        assert_eq!(health.content_digest.as_deref().map(str::len), Some(64));
        assert_eq!(health.diagnostics_count, 0);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_02_health_reports_no_data() {
        let dir = temp_dir("health-empty");
        let health = runtime_in(&dir).health_report(Some(0));
        assert_eq!(health.outcome, "NO_DATA");
        assert_eq!(health.record_count, 0);
        assert_eq!(health.format, None);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_03_blank_query_is_landing() {
        let dir = temp_dir("landing");
        let runtime = runtime_in(&dir);
        let (status, body) = runtime.trace(None, Some(0));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.outcome, "LANDING");
        assert_eq!(body.data_files_present, Some(false));
        assert_eq!(body.message.as_deref(), Some(NO_DATA_FILE_MESSAGE));

        write_structured(&dir);
        let (status, body) = runtime.trace(Some("   "), Some(0));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.data_files_present, Some(true));
        assert_eq!(body.message.as_deref(), Some(LANDING_HINT));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_04_found_and_not_found_statuses() {
        let dir = temp_dir("trace");
        write_structured(&dir);
        let runtime = runtime_in(&dir);

        let (status, body) = runtime.trace(Some("pal-001"), Some(0));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.outcome, "FOUND");
        assert_eq!(body.pallet_code.as_deref(), Some("PAL-001"));
        assert_eq!(body.record.map(|view| view.lot_code), Some("L1".to_string()));

        let (status, body) = runtime.trace(Some("PAL-404"), Some(0));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message.as_deref(), Some(NOT_FOUND_MESSAGE));
        assert_eq!(
            body.reason_code,
            Some(reason_codes::PALLET_LOOKUP_NOT_FOUND.0)
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_05_missing_data_is_not_found_with_distinct_reason() {
        let dir = temp_dir("nodata");
        let (status, body) = runtime_in(&dir).trace(Some("PAL-001"), Some(0));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.outcome, "NO_DATA");
        assert_eq!(body.message.as_deref(), Some(NOT_FOUND_MESSAGE));
        assert_eq!(
            body.reason_code,
            Some(reason_codes::PALLET_LOOKUP_DATA_UNAVAILABLE.0)
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_06_search_rejects_blank_and_redirects_normalized() {
        let dir = temp_dir("search");
        write_structured(&dir);
        let runtime = runtime_in(&dir);

        let search = |code: &str| {
            runtime.search(
                SearchRequest {
                    code: Some(code.to_string()),
                },
                Some(0),
            )
        };

        let (status, body) = search("  ");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message.as_deref(), Some(NO_CODE_MESSAGE));
        assert_eq!(body.redirect_to, None);

        let (status, body) = runtime.search(SearchRequest::default(), Some(0));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.outcome, "NO_CODE");

        let (status, body) = search(" pal-002 ");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.redirect_to.as_deref(), Some("?palete=PAL-002"));

        let (status, body) = search("pal-9");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.redirect_to.as_deref(), Some("?palete=PAL-9"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_07_qr_download_only_for_embedded_png() {
        let dir = temp_dir("qr");
        write_structured(&dir);
        let runtime = runtime_in(&dir);

        let download = runtime.qr_download(Some("PAL-001"), Some(0)).unwrap();
        assert_eq!(download.file_name, "PAL-001_qr.png");
        assert_eq!(&download.png[1..4], b"PNG");

        let (status, body) = runtime.qr_download(Some("PAL-002"), Some(0)).unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.outcome, "QR_NOT_AVAILABLE");

        let (status, _) = runtime.qr_download(None, Some(0)).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_08_response_json_omits_absent_fields() {
        let dir = temp_dir("json");
        let (_, body) = runtime_in(&dir).trace(None, Some(0));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["outcome"], "LANDING");
        assert!(json.get("record").is_none());
        assert!(json.get("reason_code").is_none());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn at_adapter_09_search_redirect_round_trips_reserved_characters() {
        let dir = temp_dir("redirect");
        fs::write(
            dir.join("dados_rastreabilidade.json"),
            r#"{"paletes": {
                "PAL+1": {"lote_codigo": "plus"},
                "PAL 1": {"lote_codigo": "space"},
                "LOTE A&B": {"lote_codigo": "amp"}
            }}"#,
        )
        .unwrap();
        let runtime = runtime_in(&dir);

        for (typed, expected_lot) in [("pal+1", "plus"), ("lote a&b", "amp")] {
            let (status, body) = runtime.search(
                SearchRequest {
                    code: Some(typed.to_string()),
                },
                Some(0),
            );
            assert_eq!(status, StatusCode::OK);
            let redirect = body.redirect_to.unwrap();
            let palete = url::form_urlencoded::parse(redirect.trim_start_matches('?').as_bytes())
                .find(|(key, _)| key == "palete")
                .map(|(_, value)| value.into_owned())
                .unwrap();

            let (status, followed) = runtime.trace(Some(&palete), Some(0));
            assert_eq!(status, StatusCode::OK, "redirect {redirect}");
            assert_eq!(followed.pallet_code, body.pallet_code);
            assert_eq!(
                followed.record.map(|view| view.lot_code).as_deref(),
                Some(expected_lot)
            );
        }
        fs::remove_dir_all(dir).unwrap();
    }
}
