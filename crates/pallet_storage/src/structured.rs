#![forbid(unsafe_code)]

use pallet_contracts::pallet::fields;
use pallet_contracts::{FieldValue, PalletCode, PalletRecord, PalletStore};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::diagnostics::{DiagnosticKind, LoadDiagnostic};
use crate::LoadError;

#[derive(Debug, Deserialize)]
struct StructuredDocument {
    paletes: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredParse {
    pub store: PalletStore,
    pub diagnostics: Vec<LoadDiagnostic>,
}

/// Parses `{"paletes": {"<code>": {<field>: <scalar>, ...}, ...}}`.
///
/// A document that is not shaped like that is an error; individual entries that
/// are not objects are skipped with a diagnostic.
pub fn parse_structured(raw: &str) -> Result<StructuredParse, LoadError> {
    let doc: StructuredDocument = serde_json::from_str(raw)?;
    let mut out = StructuredParse::default();

    for (raw_code, entry) in doc.paletes {
        let Some(code) = PalletCode::parse(&raw_code) else {
            out.diagnostics.push(LoadDiagnostic::new(
                DiagnosticKind::EmptyPalletCode,
                "entry keyed by a blank code",
            ));
            continue;
        };
        let Value::Object(entry_fields) = entry else {
            out.diagnostics.push(LoadDiagnostic::new(
                DiagnosticKind::EntryNotAnObject,
                format!("{code} is not an object"),
            ));
            continue;
        };
        if out.store.contains(&code) {
            out.diagnostics.push(LoadDiagnostic::new(
                DiagnosticKind::DuplicatePalletCode,
                format!("{raw_code} normalizes to {code} which is already loaded; kept the first"),
            ));
            continue;
        }

        let mut record = PalletRecord::new();
        for (name, value) in entry_fields {
            let value = field_value(&name, value);
            record.set_field(&name, value);
        }
        if let Err(violation) = out.store.insert(code.clone(), record) {
            out.diagnostics.push(LoadDiagnostic::new(
                DiagnosticKind::RecordRejected,
                format!("{code}: {violation}"),
            ));
        }
    }

    Ok(out)
}

// Only coordinates go through f64; other numbers keep their JSON text.
fn field_value(name: &str, value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Absent,
        Value::String(s) => FieldValue::Text(s),
        Value::Number(n) if fields::is_coordinate(name) => n
            .as_f64()
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Absent),
        Value::Number(n) => FieldValue::Text(n.to_string()),
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => FieldValue::Text(nested.to_string()),
    }
}
