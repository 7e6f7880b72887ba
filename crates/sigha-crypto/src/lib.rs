//! # sigha-crypto — The Holographic Trace Accumulator
//!
//! Maintains a constant-size cryptographic fingerprint encoding the
//! identity and topology of activity across a network of cooperating
//! agents. Each agent action, and each structural event (parallel
//! fan-out/fan-in, hierarchical sub-task entry/exit), mutates a single
//! accumulator value in the multiplicative group modulo a composite `M`.
//! Forging a consistent fingerprint for a path the prover did not execute
//! reduces to the Strong RSA assumption.
//!
//! ## Architecture
//!
//! - **BigInt backend** (`bigint.rs`): checked modular arithmetic and the
//!   canonical decimal codec used on every serialization boundary.
//!
//! - **Prime utilities** (`primes.rs`): Miller–Rabin, safe-prime search,
//!   and the deterministic `hash_to_prime` identity mapping.
//!
//! - **CryptoContext** (`context.rs`): generation and validation of
//!   `(M, G, T₀)` with subgroup-safety invariants; the factorization is
//!   scrubbed after derivation.
//!
//! - **PrimeRegistry** (`registry.rs`): shared, compute-once cache from
//!   agent ids to registry primes.
//!
//! - **SnapshotAccumulator** (`accumulator.rs`): the evolution rule
//!   `T ← T^p · G^{H_exp(d)}`, depth tracking, and snapshot folding.
//!
//! - **Scopes** (`scopes.rs`): `SwarmScope` (ordered sub-trace) and
//!   `ParallelScope` (commutative fan-out/fan-in).
//!
//! - **Verifier / Sealer** (`inspect.rs`, `seal.rs`): path replay with
//!   equality check, and payload-anchored sealing.
//!
//! - **Wire format** (`wire.rs`): the length-prefixed state blob.
//!
//! ## Crate Policy
//!
//! - Depends only on `sigha-core` internally.
//! - No mocking of cryptographic operations in tests — all tests run
//!   real Miller–Rabin, real SHA-256, real group arithmetic.
//! - Verification failures are verdict values, not errors.
//! - No `unsafe` code; no `panic!()` or `.unwrap()` outside tests.

pub mod accumulator;
pub mod bigint;
pub mod context;
pub mod inspect;
pub mod primes;
pub mod registry;
pub mod scopes;
pub mod seal;
pub mod wire;

pub use accumulator::{Phase, SnapshotAccumulator, SnapshotBundle, SnapshotRecord};
pub use context::{ContextParams, CryptoContext};
pub use inspect::{TraceInspector, Verdict};
pub use registry::PrimeRegistry;
pub use scopes::{compute_branch, ParallelScope, SwarmScope};
pub use seal::{Seal, StateSealer};
pub use wire::{decode_state, encode_state};
