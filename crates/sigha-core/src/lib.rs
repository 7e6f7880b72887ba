//! # sigha-core — Foundational Types for the SIGHA Trace Accumulator
//!
//! This crate is the bedrock of the SIGHA workspace. It defines the
//! type-system primitives shared by every other crate; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `AgentId` and `SessionId`
//!    are newtypes with validated constructors. No bare strings for
//!    identifiers.
//!
//! 2. **One structured error hierarchy.** Every fallible operation in the
//!    workspace surfaces a `SighaError`. Verification *outcomes* are not
//!    errors — a failed path check is a value, not an `Err`.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with seconds
//!    precision so that metadata attached to seals and snapshots is
//!    byte-stable across hosts.
//!
//! 4. **Fixed-width digests.** `Digest32` is the only digest currency in
//!    the workspace; it renders as lowercase hex and round-trips through
//!    serde as a hex string.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sigha-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`.

pub mod digest;
pub mod error;
pub mod identity;
pub mod meta;
pub mod temporal;

pub use digest::Digest32;
pub use error::{Result, SighaError};
pub use identity::{AgentId, SessionId, MAX_AGENT_ID_BYTES};
pub use meta::HolographicMeta;
pub use temporal::Timestamp;
