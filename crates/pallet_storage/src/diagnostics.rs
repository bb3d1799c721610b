#![forbid(unsafe_code)]

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    StructuredParseFailed,
    LineFileUnreadable,
    EntryNotAnObject,
    EmptyPalletCode,
    DuplicatePalletCode,
    FieldOutsideRecord,
    MissingSeparator,
    EmptyFieldName,
    CoordinateUnparseable,
    RecordWithoutFields,
    RecordRejected,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::StructuredParseFailed => "STRUCTURED_PARSE_FAILED",
            DiagnosticKind::LineFileUnreadable => "LINE_FILE_UNREADABLE",
            DiagnosticKind::EntryNotAnObject => "ENTRY_NOT_AN_OBJECT",
            DiagnosticKind::EmptyPalletCode => "EMPTY_PALLET_CODE",
            DiagnosticKind::DuplicatePalletCode => "DUPLICATE_PALLET_CODE",
            DiagnosticKind::FieldOutsideRecord => "FIELD_OUTSIDE_RECORD",
            DiagnosticKind::MissingSeparator => "MISSING_SEPARATOR",
            DiagnosticKind::EmptyFieldName => "EMPTY_FIELD_NAME",
            DiagnosticKind::CoordinateUnparseable => "COORDINATE_UNPARSEABLE",
            DiagnosticKind::RecordWithoutFields => "RECORD_WITHOUT_FIELDS",
            DiagnosticKind::RecordRejected => "RECORD_REJECTED",
        }
    }
}

/// Something the loader skipped or degraded past. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadDiagnostic {
    pub kind: DiagnosticKind,
    /// 1-based, only for the line-oriented format.
    pub line: Option<usize>,
    pub detail: String,
}

impl LoadDiagnostic {
    pub fn new(kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            detail: detail.into(),
        }
    }

    pub fn at_line(kind: DiagnosticKind, line: usize, detail: impl Into<String>) -> Self {
        Self {
            kind,
            line: Some(line),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line}): {}", self.kind.as_str(), self.detail),
            None => write!(f, "{}: {}", self.kind.as_str(), self.detail),
        }
    }
}
