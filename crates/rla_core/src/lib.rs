//! rla_core: Core types, audit parameters, and the seedable phantom RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! verifier (`rla_io`, `rla_algo`, `rla_pipeline`, `rla_report`, `rla_cli`).
//!
//! - Typed report entities: `Contest`, `Candidate`, `AuditSettings`,
//!   `SampledBallot`, `Round`, `ElectionInfo`
//! - Audit methodology tags: `AuditType`
//! - Tunables with safe defaults: `VerifyParams`, `ComparisonParams`,
//!   `PhantomPolicy`
//! - Seedable RNG (ChaCha20) for **phantom simulation only**
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors;
pub mod entities;
pub mod variables;
pub mod rng;

pub use errors::CoreError;
pub use entities::{
    AuditSettings, AuditType, Candidate, Contest, ElectionInfo, Round, SampledBallot,
    TicketColumn, AUDITED_FLAG, CONTEST_NOT_ON_BALLOT,
};
pub use rng::PhantomRng;
pub use variables::{ComparisonParams, PhantomPolicy, VerifyParams};
