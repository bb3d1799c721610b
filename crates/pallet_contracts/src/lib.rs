#![forbid(unsafe_code)]

pub mod common;
pub mod pallet;

pub use common::{ContractViolation, MonotonicTimeNs, ReasonCodeId, Validate};
pub use pallet::{FieldValue, PalletCode, PalletRecord, PalletStore};
