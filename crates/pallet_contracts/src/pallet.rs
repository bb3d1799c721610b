#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{ContractViolation, Validate};

/// Field names understood by [`PalletRecord::set_field`]. Anything else lands in
/// [`PalletRecord::extra`].
pub mod fields {
    pub const PALLET_CODE: &str = "palete_codigo";
    pub const CREATED_AT: &str = "data_criacao";
    pub const LOT_CODE: &str = "lote_codigo";
    pub const HARVESTED_AT: &str = "data_corte";
    pub const VARIETY: &str = "variedade_nome_unificado";
    pub const PLOT_NAME: &str = "talhao_nome";
    pub const PLOT_CODE: &str = "talhao_codigo";
    pub const PLOT_DESCRIPTION: &str = "talhao_descricao";
    pub const COMPANY_NAME: &str = "empresa_nome";
    pub const COMPANY_CITY: &str = "empresa_cidade";
    pub const COMPANY_STATE: &str = "empresa_estado";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const QR_CODE_URL: &str = "qr_code_url";

    pub fn is_coordinate(name: &str) -> bool {
        name == LATITUDE || name == LONGITUDE
    }
}

/// Normalized pallet identifier: trimmed, upper-cased, never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PalletCode(String);

impl PalletCode {
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    pub fn new(raw: &str) -> Result<Self, ContractViolation> {
        let code = Self(Self::normalize(raw));
        code.validate()?;
        Ok(code)
    }

    /// Returns `None` when nothing is left after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::new(raw).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PalletCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Validate for PalletCode {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "pallet_code",
                reason: "must not be empty",
            });
        }
        if Self::normalize(&self.0) != self.0 {
            return Err(ContractViolation::InvalidValue {
                field: "pallet_code",
                reason: "must be trimmed and upper-cased",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Absent,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Absent => None,
        }
    }

    /// Best-effort float coercion; non-finite values count as absent.
    pub fn as_coordinate(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Absent => return None,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PalletRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palete_codigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_criacao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lote_codigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_corte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variedade_nome_unificado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talhao_nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talhao_codigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talhao_descricao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa_nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa_cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa_estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, FieldValue>,
}

impl PalletRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a named value into its typed slot, coercing where needed.
    /// Unrecognized names are kept verbatim in `extra`.
    pub fn set_field(&mut self, name: &str, value: FieldValue) {
        if fields::is_coordinate(name) {
            let coordinate = value.as_coordinate();
            if name == fields::LATITUDE {
                self.latitude = coordinate;
            } else {
                self.longitude = coordinate;
            }
            return;
        }
        let slot = match name {
            fields::PALLET_CODE => &mut self.palete_codigo,
            fields::CREATED_AT => &mut self.data_criacao,
            fields::LOT_CODE => &mut self.lote_codigo,
            fields::HARVESTED_AT => &mut self.data_corte,
            fields::VARIETY => &mut self.variedade_nome_unificado,
            fields::PLOT_NAME => &mut self.talhao_nome,
            fields::PLOT_CODE => &mut self.talhao_codigo,
            fields::PLOT_DESCRIPTION => &mut self.talhao_descricao,
            fields::COMPANY_NAME => &mut self.empresa_nome,
            fields::COMPANY_CITY => &mut self.empresa_cidade,
            fields::COMPANY_STATE => &mut self.empresa_estado,
            fields::QR_CODE_URL => &mut self.qr_code_url,
            _ => {
                self.extra.insert(name.to_string(), value);
                return;
            }
        };
        *slot = value.as_text();
    }
}

impl Validate for PalletRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.latitude.is_some_and(|v| !v.is_finite()) {
            return Err(ContractViolation::NotFinite {
                field: "pallet_record.latitude",
            });
        }
        if self.longitude.is_some_and(|v| !v.is_finite()) {
            return Err(ContractViolation::NotFinite {
                field: "pallet_record.longitude",
            });
        }
        Ok(())
    }
}

/// All records of one load, keyed by normalized code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PalletStore {
    records: BTreeMap<PalletCode, PalletRecord>,
}

impl PalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record previously held under `code`, if any. Nothing is
    /// stored when the code or the record fails validation.
    pub fn insert(
        &mut self,
        code: PalletCode,
        record: PalletRecord,
    ) -> Result<Option<PalletRecord>, ContractViolation> {
        code.validate()?;
        record.validate()?;
        Ok(self.records.insert(code, record))
    }

    pub fn get(&self, code: &PalletCode) -> Option<&PalletRecord> {
        self.records.get(code)
    }

    pub fn contains(&self, code: &PalletCode) -> bool {
        self.records.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
