#![forbid(unsafe_code)]

pub mod date_format;
pub mod lookup;
pub mod qr;
pub mod view;

pub use date_format::format_display_date;
pub use lookup::{lookup, LookupOutcome};
pub use qr::QrReference;
pub use view::RecordView;
