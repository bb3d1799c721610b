#![forbid(unsafe_code)]

use pallet_contracts::{PalletCode, PalletRecord, PalletStore, ReasonCodeId};

pub mod reason_codes {
    use pallet_contracts::ReasonCodeId;

    pub const PALLET_LOOKUP_OK_FOUND: ReasonCodeId = ReasonCodeId(0x504C_0001);

    pub const PALLET_LOOKUP_NOT_FOUND: ReasonCodeId = ReasonCodeId(0x504C_00F1);
    pub const PALLET_LOOKUP_NO_CODE_SUPPLIED: ReasonCodeId = ReasonCodeId(0x504C_00F2);
    pub const PALLET_LOOKUP_DATA_UNAVAILABLE: ReasonCodeId = ReasonCodeId(0x504C_00F3);
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found {
        code: PalletCode,
        record: PalletRecord,
    },
    NotFound {
        code: PalletCode,
    },
    NoCodeSupplied,
}

impl LookupOutcome {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            LookupOutcome::Found { .. } => reason_codes::PALLET_LOOKUP_OK_FOUND,
            LookupOutcome::NotFound { .. } => reason_codes::PALLET_LOOKUP_NOT_FOUND,
            LookupOutcome::NoCodeSupplied => reason_codes::PALLET_LOOKUP_NO_CODE_SUPPLIED,
        }
    }
}

/// Exact match on the normalized code; no prefix or fuzzy matching.
pub fn lookup(store: &PalletStore, raw_code: &str) -> LookupOutcome {
    let Some(code) = PalletCode::parse(raw_code) else {
        return LookupOutcome::NoCodeSupplied;
    };
    match store.get(&code) {
        Some(record) => LookupOutcome::Found {
            record: record.clone(),
            code,
        },
        None => LookupOutcome::NotFound { code },
    }
}
