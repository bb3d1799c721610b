#![forbid(unsafe_code)]

pub mod traceability;

pub use traceability::{
    route, LandingStatus, PageRoute, QrDownload, SharedSnapshotCache, TraceOutcome,
    TraceabilityConfig, TraceabilityService,
};
