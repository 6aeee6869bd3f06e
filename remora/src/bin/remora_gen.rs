use clap::Parser;
use eyre::{Result, WrapErr};
use halyard::AesRng;
use log::info;
use rand::SeedableRng;
use remora::config::{
    Params, DEFAULT_FEATURES, DEFAULT_ITEMS, DEFAULT_QUERIES, DEFAULT_USERS,
};
use remora::queries;
use std::path::PathBuf;

/// Generate initial matrix shares and correlated query files for one session.
#[derive(Parser)]
#[command(name = "remora_gen")]
struct Cli {
    /// Output directory.
    #[arg(long, default_value = "data")]
    dir: PathBuf,

    /// Number of users (rows of U).
    #[arg(long, default_value_t = DEFAULT_USERS)]
    users: u32,

    /// Number of items (rows of V).
    #[arg(long, default_value_t = DEFAULT_ITEMS)]
    items: u32,

    /// Number of features (columns of U and V).
    #[arg(long, default_value_t = DEFAULT_FEATURES)]
    features: u32,

    /// Number of queries in the session.
    #[arg(long, default_value_t = DEFAULT_QUERIES)]
    queries: u32,

    /// Optional RNG seed for reproducible sessions.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Cli::parse();
    let params = Params {
        users: args.users,
        items: args.items,
        features: args.features,
        queries: args.queries,
    };

    let mut rng = match args.seed {
        Some(seed) => {
            let mut bytes = [0u8; 16];
            bytes[..8].copy_from_slice(&seed.to_le_bytes());
            AesRng::from_seed(bytes)
        }
        None => AesRng::new(),
    };

    std::fs::create_dir_all(&args.dir)
        .wrap_err_with(|| format!("creating {}", args.dir.display()))?;
    info!(
        "generating session files for m={} n={} k={} q={}",
        params.users, params.items, params.features, params.queries
    );
    let dataset = queries::generate(&params, &mut rng);
    dataset.write_to(&args.dir)?;
    info!("wrote share and query files to {}", args.dir.display());
    Ok(())
}
