//! # seal / check-seal Subcommands
//!
//! Binds an exported accumulator state to a payload file and checks the
//! resulting seal. Seals are JSON documents carrying the session
//! metadata, the sealed state, and the anchor.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;

use sigha_crypto::{decode_state, Seal, StateSealer};

/// Arguments for the seal subcommand.
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Path to the exported state blob.
    #[arg(long)]
    pub state: PathBuf,

    /// Path to the payload file to anchor.
    #[arg(long)]
    pub payload: PathBuf,

    /// Where to write the seal JSON (stdout if omitted).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the check-seal subcommand.
#[derive(Args, Debug)]
pub struct CheckSealArgs {
    /// Path to the seal JSON.
    #[arg(long)]
    pub seal: PathBuf,

    /// Path to the payload file to check against.
    #[arg(long)]
    pub payload: PathBuf,
}

/// Seal the state over the payload and emit the seal JSON.
pub fn run_seal(args: SealArgs) -> anyhow::Result<()> {
    let blob = std::fs::read(&args.state)
        .with_context(|| format!("reading state blob {}", args.state.display()))?;
    let payload = std::fs::read(&args.payload)
        .with_context(|| format!("reading payload {}", args.payload.display()))?;

    let mut acc = decode_state(&blob)?;
    let seal = StateSealer::seal(&mut acc, &payload)?;
    let json = serde_json::to_string_pretty(&seal)?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!(path = %path.display(), "seal written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Check a seal against a payload file.
pub fn run_check(args: CheckSealArgs) -> anyhow::Result<()> {
    let seal_json = std::fs::read_to_string(&args.seal)
        .with_context(|| format!("reading seal {}", args.seal.display()))?;
    let payload = std::fs::read(&args.payload)
        .with_context(|| format!("reading payload {}", args.payload.display()))?;

    let seal: Seal = serde_json::from_str(&seal_json).context("parsing seal JSON")?;
    let ok = StateSealer::verify(&seal, &payload);

    let out = serde_json::json!({
        "ok": ok,
        "session_id": seal.meta.session_id.to_string(),
        "payload_digest": seal.payload_digest.to_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    if !ok {
        anyhow::bail!("seal verification failed");
    }
    Ok(())
}
