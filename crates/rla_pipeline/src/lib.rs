//! rla_pipeline: deterministic verification of one report
//! (load → extract → margins → risk per contest → compare with reported p).
//!
//! This crate stays format-agnostic: parsing and hashing are delegated to
//! `rla_io`, arithmetic to `rla_algo`. Presentation lives in `rla_report`.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod compare;
pub mod extract;
pub mod verify;

pub use compare::{reported_p_value, PValueCheck};
pub use verify::{
    verify_lines, verify_path, verify_report, AuditMethod, AuditStatus, ContestVerification,
    RiskCheck, Verification,
};

/// Engine identifiers echoed into machine-readable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMeta {
    pub name: String,
    pub version: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        name: "rla-verify".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Single error surface for verifying one file.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] rla_io::IoError),

    /// A column or key the computation needs is absent.
    #[error("{section}: missing field {key:?}")]
    MissingField { section: &'static str, key: String },

    /// A field is present but not a valid number for its role.
    #[error("{section}: field {key:?} has invalid value {value:?}")]
    Number { section: &'static str, key: String, value: String },

    #[error(transparent)]
    Margin(#[from] rla_algo::MarginError),

    #[error(transparent)]
    Algo(#[from] rla_algo::AlgoError),
}
