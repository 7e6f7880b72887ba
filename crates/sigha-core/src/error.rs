//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error surface of the SIGHA workspace. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Errors are *reported*, never retried internally on behalf of the
//!   caller. The one internal retry loop (prime sampling during context
//!   generation) is bounded and surfaces `WeakParameters` on exhaustion.
//! - A failed verification (wrong path, wrong seal) is NOT an error — it
//!   is a negative verdict value. Errors are reserved for malformed
//!   inputs, broken invariants, and unusable state.

use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, SighaError>;

/// Top-level error type for the SIGHA workspace.
#[derive(Error, Debug)]
pub enum SighaError {
    /// Malformed input: empty identifier, non-positive bit length,
    /// string not parseable as a big integer.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Parameter generation retries exhausted, requested parameters too
    /// small, or imported group elements fail the context invariants.
    #[error("weak parameters: {0}")]
    WeakParameters(String),

    /// Lookup of an unknown agent id on a read-only path.
    #[error("agent not registered: {0:?}")]
    NotRegistered(String),

    /// A state evolution produced a fingerprint outside the working
    /// group. The update is rolled back.
    #[error("degenerate state: {0}")]
    DegenerateState(String),

    /// Mutation attempted on a sealed accumulator.
    #[error("accumulator is sealed")]
    Sealed,

    /// Malformed serialized state blob: bad magic, truncation, or
    /// digest mismatch.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}
