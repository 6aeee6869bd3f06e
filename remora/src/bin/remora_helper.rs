use clap::Parser;
use eyre::{bail, Result, WrapErr};
use halyard::{AesRng, Channel};
use log::info;
use remora::config::{
    Params, DEFAULT_FEATURES, DEFAULT_HELPER_ADDR, DEFAULT_ITEMS, DEFAULT_QUERIES, DEFAULT_USERS,
};
use remora::helper;
use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};

type TcpChannel = Channel<BufReader<TcpStream>, BufWriter<TcpStream>>;

/// The correlated-randomness helper. Accepts both servers, then deals one
/// batch of materials per query.
#[derive(Parser)]
#[command(name = "remora_helper")]
struct Cli {
    /// Address to listen on for both servers.
    #[arg(long, default_value = DEFAULT_HELPER_ADDR)]
    listen: String,

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

    let listener = TcpListener::bind(&args.listen)
        .wrap_err_with(|| format!("binding helper address {}", args.listen))?;
    info!("helper listening on {}", args.listen);

    let mut channels: [Option<TcpChannel>; 2] = [None, None];
    while channels.iter().any(|c| c.is_none()) {
        let (stream, addr) = listener.accept()?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        let mut channel = Channel::new(reader, BufWriter::new(stream));
        let role = helper::read_role(&mut channel)?;
        info!("server {} connected from {}", role, addr);
        let slot = &mut channels[role.index()];
        if slot.is_some() {
            bail!("two servers both announced role {}", role);
        }
        *slot = Some(channel);
    }
    let [ch0, ch1] = channels;
    let (mut ch0, mut ch1) = (ch0.unwrap(), ch1.unwrap());

    let mut rng = AesRng::new();
    helper::serve(&mut ch0, &mut ch1, &params, &mut rng)?;
    Ok(())
}
