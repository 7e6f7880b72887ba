//! # gen-params Subcommand
//!
//! Context generation: samples `(M, G, T₀)` and prints the parameters
//! as JSON. A fixed `--seed` makes the output reproducible for demos
//! and test vectors.

use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sigha_crypto::bigint::to_decimal;
use sigha_crypto::{ContextParams, CryptoContext};

/// Arguments for the gen-params subcommand.
#[derive(Args, Debug)]
pub struct GenParamsArgs {
    /// Modulus size in bits (even, >= 256).
    #[arg(long, default_value_t = 2048)]
    pub bit_length: u32,

    /// Fold threshold for accumulators using this context.
    #[arg(long, default_value_t = 10)]
    pub max_depth: u32,

    /// Skip the safe-prime requirement (faster, weaker subgroup claim).
    #[arg(long)]
    pub no_safe_primes: bool,

    /// Deterministic PRNG seed; omit for OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Build a context from CLI arguments.
pub fn build_context(
    bit_length: u32,
    max_depth: u32,
    no_safe_primes: bool,
    seed: Option<u64>,
) -> anyhow::Result<CryptoContext> {
    let params = ContextParams {
        bit_length,
        max_depth,
        safe_primes: !no_safe_primes,
        ..ContextParams::default()
    };
    let ctx = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            CryptoContext::generate_with_rng(params, &mut rng)?
        }
        None => CryptoContext::generate(params)?,
    };
    Ok(ctx)
}

/// Generate a context and print its parameters as JSON.
pub fn run(args: GenParamsArgs) -> anyhow::Result<()> {
    tracing::info!(bit_length = args.bit_length, "generating context");
    let ctx = build_context(args.bit_length, args.max_depth, args.no_safe_primes, args.seed)?;

    let out = serde_json::json!({
        "bit_length": ctx.bit_length(),
        "max_depth": ctx.max_depth(),
        "prime_bits": ctx.prime_bits(),
        "safe_primes": ctx.safe_primes(),
        "context_digest": ctx.digest().to_hex(),
        "modulus": to_decimal(ctx.modulus()),
        "generator": to_decimal(ctx.generator()),
        "seed_t0": to_decimal(ctx.seed_t0()),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
