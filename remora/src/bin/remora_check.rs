use clap::Parser;
use eyre::Result;
use log::info;
use remora::check;
use remora::config::{
    Params, DEFAULT_FEATURES, DEFAULT_ITEMS, DEFAULT_QUERIES, DEFAULT_USERS,
};
use std::path::PathBuf;

const MAX_REPORTED: usize = 10;

/// Compare the protocol's updated shares against a cleartext replay of the
/// update rule. Exits 0 on full agreement, 1 on any mismatch.
#[derive(Parser)]
#[command(name = "remora_check")]
struct Cli {
    /// Directory holding the session files.
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

    info!(
        "checking {} against m={} n={} k={} q={}",
        args.dir.display(),
        params.users,
        params.items,
        params.features,
        params.queries
    );
    let mismatches = check::run(&args.dir, &params)?;

    if mismatches.is_empty() {
        println!("SUCCESS: protocol output matches the cleartext update rule.");
        return Ok(());
    }

    for m in mismatches.iter().take(MAX_REPORTED) {
        eprintln!(
            "mismatch in {}[{}][{}]: protocol = {}, cleartext = {}, difference = {}",
            m.matrix,
            m.row,
            m.col,
            m.protocol,
            m.cleartext,
            m.protocol as i64 - m.cleartext as i64
        );
    }
    if mismatches.len() > MAX_REPORTED {
        eprintln!(
            "({} further mismatches not shown)",
            mismatches.len() - MAX_REPORTED
        );
    }
    println!("FAILURE: {} mismatching cells.", mismatches.len());
    std::process::exit(1);
}
