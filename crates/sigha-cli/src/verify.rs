//! # verify Subcommand
//!
//! Replays a claimed agent path against an exported state blob. The
//! replay starts from the context's `T₀`, so the blob's fingerprint is
//! confirmed iff the claimed path is the one that produced it.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;

use sigha_core::AgentId;
use sigha_crypto::{decode_state, PrimeRegistry, TraceInspector};

/// Arguments for the verify subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the exported state blob.
    #[arg(long)]
    pub state: PathBuf,

    /// The claimed agent path, in order.
    #[arg(required = true)]
    pub agents: Vec<String>,
}

/// Replay the claimed path and report the verdict.
pub fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let blob = std::fs::read(&args.state)
        .with_context(|| format!("reading state blob {}", args.state.display()))?;
    let acc = decode_state(&blob)?;
    let ctx = acc.context();

    let path: Vec<AgentId> = args
        .agents
        .iter()
        .map(|raw| AgentId::new(raw.clone()))
        .collect::<Result<_, _>>()?;

    let registry = PrimeRegistry::new(ctx);
    let inspector = TraceInspector::new(ctx, &registry);
    let verdict = inspector.verify_path(acc.current_t(), &path, ctx.seed_t0(), 0)?;

    let out = serde_json::json!({
        "ok": verdict.ok,
        "reason": verdict.reason,
        "path_length": path.len(),
        "context_digest": ctx.digest().to_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    if !verdict.ok {
        anyhow::bail!("path verification failed: {}", verdict.reason);
    }
    Ok(())
}
