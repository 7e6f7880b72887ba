//! # sigha CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// SIGHA — holographic trace accumulator toolchain.
///
/// Generates group parameters, runs agent traces, verifies claimed
/// paths, and seals accumulator state against payloads.
#[derive(Parser, Debug)]
#[command(name = "sigha", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate a cryptographic context and print its parameters.
    GenParams(sigha_cli::params::GenParamsArgs),
    /// Run an agent trace and optionally export the state blob.
    Trace(sigha_cli::trace::TraceArgs),
    /// Replay a claimed path against an exported state blob.
    Verify(sigha_cli::verify::VerifyArgs),
    /// Seal an exported state against a payload file.
    Seal(sigha_cli::seal::SealArgs),
    /// Check a seal against a payload file.
    CheckSeal(sigha_cli::seal::CheckSealArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::GenParams(args) => sigha_cli::params::run(args),
        Commands::Trace(args) => sigha_cli::trace::run(args),
        Commands::Verify(args) => sigha_cli::verify::run(args),
        Commands::Seal(args) => sigha_cli::seal::run_seal(args),
        Commands::CheckSeal(args) => sigha_cli::seal::run_check(args),
    }
}
