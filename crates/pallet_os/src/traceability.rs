#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use pallet_contracts::{MonotonicTimeNs, PalletCode, PalletRecord, ReasonCodeId};
use pallet_engines::lookup::{lookup, reason_codes, LookupOutcome};
use pallet_engines::qr::QrReference;
use pallet_engines::view::{qr_download_name, RecordView};
use pallet_storage::{
    DataSource, FileSnapshotLoader, LoadOutcome, SnapshotCache, SnapshotLoader,
    DEFAULT_SNAPSHOT_TTL,
};
use tracing::{debug, info};

pub type SharedSnapshotCache = Arc<SnapshotCache<DataSource, LoadOutcome>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceabilityConfig {
    pub snapshot_ttl: Duration,
    pub share_url_base: Option<String>,
}

impl TraceabilityConfig {
    pub fn mvp_v1() -> Self {
        Self {
            snapshot_ttl: DEFAULT_SNAPSHOT_TTL,
            share_url_base: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRoute {
    Landing,
    Record(String),
}

/// Absent or blank `palete` parameter goes to the landing view.
pub fn route(query_param: Option<&str>) -> PageRoute {
    match query_param.map(str::trim) {
        Some(code) if !code.is_empty() => PageRoute::Record(code.to_string()),
        _ => PageRoute::Landing,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandingStatus {
    pub data_files_present: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceOutcome {
    Found {
        code: PalletCode,
        record: PalletRecord,
        view: RecordView,
    },
    NotFound {
        code: PalletCode,
    },
    NoCodeSupplied,
    DataUnavailable {
        code: PalletCode,
    },
}

impl TraceOutcome {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            TraceOutcome::Found { .. } => reason_codes::PALLET_LOOKUP_OK_FOUND,
            TraceOutcome::NotFound { .. } => reason_codes::PALLET_LOOKUP_NOT_FOUND,
            TraceOutcome::NoCodeSupplied => reason_codes::PALLET_LOOKUP_NO_CODE_SUPPLIED,
            TraceOutcome::DataUnavailable { .. } => reason_codes::PALLET_LOOKUP_DATA_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrDownload {
    pub file_name: String,
    pub png: Vec<u8>,
}

pub struct TraceabilityService<L = FileSnapshotLoader> {
    source: DataSource,
    loader: L,
    cache: SharedSnapshotCache,
    config: TraceabilityConfig,
}

impl TraceabilityService<FileSnapshotLoader> {
    pub fn from_files(source: DataSource, config: TraceabilityConfig) -> Self {
        Self::new(source, FileSnapshotLoader, Arc::new(SnapshotCache::new()), config)
    }
}

impl<L: SnapshotLoader> TraceabilityService<L> {
    pub fn new(
        source: DataSource,
        loader: L,
        cache: SharedSnapshotCache,
        config: TraceabilityConfig,
    ) -> Self {
        Self {
            source,
            loader,
            cache,
            config,
        }
    }

    pub fn snapshot(&self, now: MonotonicTimeNs) -> Arc<LoadOutcome> {
        self.cache
            .get_or_load(&self.source, self.config.snapshot_ttl, now, |source| {
                self.loader.load(source)
            })
    }

    pub fn landing_status(&self) -> LandingStatus {
        LandingStatus {
            data_files_present: self.source.any_file_present(),
        }
    }

    pub fn lookup(&self, raw_code: &str, now: MonotonicTimeNs) -> TraceOutcome {
        let Some(code) = PalletCode::parse(raw_code) else {
            debug!("lookup without a pallet code");
            return TraceOutcome::NoCodeSupplied;
        };

        let loaded = self.snapshot(now);
        let Some(snapshot) = loaded.snapshot() else {
            info!(%code, "lookup with no traceability data loaded");
            return TraceOutcome::DataUnavailable { code };
        };

        let outcome = lookup(&snapshot.store, code.as_str());
        let reason_code = outcome.reason_code().0;
        match outcome {
            LookupOutcome::Found { code, record } => {
                let view =
                    RecordView::build(&code, &record, self.config.share_url_base.as_deref());
                debug!(%code, reason_code, "pallet found");
                TraceOutcome::Found { code, record, view }
            }
            LookupOutcome::NotFound { code } => {
                info!(%code, reason_code, "pallet not found");
                TraceOutcome::NotFound { code }
            }
            LookupOutcome::NoCodeSupplied => TraceOutcome::NoCodeSupplied,
        }
    }

    /// PNG bytes embedded in the record's QR reference, if it carries any.
    pub fn qr_png(&self, raw_code: &str, now: MonotonicTimeNs) -> Option<QrDownload> {
        let TraceOutcome::Found { record, view, .. } = self.lookup(raw_code, now) else {
            return None;
        };
        let qr = QrReference::parse(record.qr_code_url.as_deref()?)?;
        let png = qr.png_bytes()?.to_vec();
        Some(QrDownload {
            file_name: qr_download_name(&view.pallet_code_display),
            png,
        })
    }
}
