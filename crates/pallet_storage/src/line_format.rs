#![forbid(unsafe_code)]

//! Line-oriented fallback format.
//!
//! ```text
//! # comment
//! PALETE: PAL-20251111-010
//! lote_codigo: L-0042
//! latitude: -3.1019
//! ```
//!
//! A `PALETE:` line opens a record; every following `name: value` line belongs to
//! it until the next `PALETE:` line. A block is only kept if it carried at least
//! one field.

use pallet_contracts::pallet::fields;
use pallet_contracts::{FieldValue, PalletCode, PalletRecord, PalletStore};
use tracing::debug;

use crate::diagnostics::{DiagnosticKind, LoadDiagnostic};

pub const RECORD_START_MARKER: &str = "PALETE:";
pub const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineParse {
    pub store: PalletStore,
    pub diagnostics: Vec<LoadDiagnostic>,
}

struct PendingRecord {
    code: PalletCode,
    record: PalletRecord,
    field_count: usize,
    opened_at_line: usize,
}

pub fn parse_line_oriented(raw: &str) -> LineParse {
    let mut out = LineParse::default();
    let mut pending: Option<PendingRecord> = None;

    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        if let Some(rest) = line.strip_prefix(RECORD_START_MARKER) {
            commit(pending.take(), &mut out);
            match PalletCode::parse(rest) {
                Some(code) => {
                    pending = Some(PendingRecord {
                        code,
                        record: PalletRecord::new(),
                        field_count: 0,
                        opened_at_line: line_no,
                    });
                }
                None => out.diagnostics.push(LoadDiagnostic::at_line(
                    DiagnosticKind::EmptyPalletCode,
                    line_no,
                    "record marker without a code; fields ignored until the next marker",
                )),
            }
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            out.diagnostics.push(LoadDiagnostic::at_line(
                DiagnosticKind::MissingSeparator,
                line_no,
                "line has no ':' separator",
            ));
            continue;
        };
        let Some(current) = pending.as_mut() else {
            out.diagnostics.push(LoadDiagnostic::at_line(
                DiagnosticKind::FieldOutsideRecord,
                line_no,
                "field appears before any record marker",
            ));
            continue;
        };

        let name = name.trim().to_lowercase();
        if name.is_empty() {
            out.diagnostics.push(LoadDiagnostic::at_line(
                DiagnosticKind::EmptyFieldName,
                line_no,
                "field name is empty",
            ));
            continue;
        }

        let value = FieldValue::Text(value.trim().to_string());
        if fields::is_coordinate(&name) && value.as_coordinate().is_none() {
            out.diagnostics.push(LoadDiagnostic::at_line(
                DiagnosticKind::CoordinateUnparseable,
                line_no,
                format!("{name} of {} kept as absent", current.code),
            ));
        }
        current.record.set_field(&name, value);
        current.field_count += 1;
    }
    commit(pending, &mut out);

    out
}

fn commit(pending: Option<PendingRecord>, out: &mut LineParse) {
    let Some(pending) = pending else {
        return;
    };
    if pending.field_count == 0 {
        debug!(code = %pending.code, "dropping record block without fields");
        out.diagnostics.push(LoadDiagnostic::at_line(
            DiagnosticKind::RecordWithoutFields,
            pending.opened_at_line,
            format!("{} has no fields", pending.code),
        ));
        return;
    }
    let code = pending.code.clone();
    match out.store.insert(pending.code, pending.record) {
        Ok(Some(_)) => out.diagnostics.push(LoadDiagnostic::at_line(
            DiagnosticKind::DuplicatePalletCode,
            pending.opened_at_line,
            format!("{code} replaces an earlier block"),
        )),
        Ok(None) => {}
        Err(violation) => out.diagnostics.push(LoadDiagnostic::at_line(
            DiagnosticKind::RecordRejected,
            pending.opened_at_line,
            format!("{code}: {violation}"),
        )),
    }
}
