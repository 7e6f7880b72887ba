//! # trace Subcommand
//!
//! Runs a sequence of agent updates on a fresh accumulator and prints
//! the resulting state. `--out` exports the serialized state blob for
//! later `verify` and `seal` runs.

use std::path::PathBuf;

use clap::Args;

use sigha_core::AgentId;
use sigha_crypto::bigint::to_decimal;
use sigha_crypto::{encode_state, PrimeRegistry, SnapshotAccumulator};

use crate::params::build_context;

/// Arguments for the trace subcommand.
#[derive(Args, Debug)]
pub struct TraceArgs {
    /// Agent ids to record, in order.
    #[arg(required = true)]
    pub agents: Vec<String>,

    /// Modulus size in bits (even, >= 256).
    #[arg(long, default_value_t = 2048)]
    pub bit_length: u32,

    /// Fold threshold.
    #[arg(long, default_value_t = 10)]
    pub max_depth: u32,

    /// Skip the safe-prime requirement.
    #[arg(long)]
    pub no_safe_primes: bool,

    /// Deterministic PRNG seed; omit for OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Verify group membership after every update.
    #[arg(long)]
    pub checked: bool,

    /// Write the serialized state blob to this path.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Run the trace and print the final state as JSON.
pub fn run(args: TraceArgs) -> anyhow::Result<()> {
    let ctx = build_context(args.bit_length, args.max_depth, args.no_safe_primes, args.seed)?;
    let registry = PrimeRegistry::new(&ctx);
    let mut acc = SnapshotAccumulator::new(&ctx);

    for raw in &args.agents {
        let id = AgentId::new(raw.clone())?;
        if args.checked {
            acc.update_with_check(&registry, &id)?;
        } else {
            acc.update(&registry, &id)?;
        }
        tracing::debug!(agent = %id, depth = acc.depth(), "recorded");
    }

    if let Some(path) = &args.out {
        std::fs::write(path, encode_state(&acc))?;
        tracing::info!(path = %path.display(), "state blob written");
    }

    let out = serde_json::json!({
        "session_id": acc.session_id().to_string(),
        "context_digest": ctx.digest().to_hex(),
        "fingerprint": to_decimal(acc.current_t()),
        "depth": acc.depth(),
        "snapshots": acc.snapshot_chain().len(),
        "registered_agents": registry.len(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
