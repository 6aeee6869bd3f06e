use clap::Parser;
use eyre::{Result, WrapErr};
use halyard::{AbstractChannel, Channel, TrackChannel};
use log::{info, warn};
use remora::config::{
    self, Params, DEFAULT_FEATURES, DEFAULT_HELPER_ADDR, DEFAULT_ITEMS, DEFAULT_PEER_ADDR,
    DEFAULT_QUERIES, DEFAULT_USERS,
};
use remora::server::ServerSession;
use remora::{matrix, queries, Role};
use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

type TcpChannel = Channel<BufReader<TcpStream>, BufWriter<TcpStream>>;

/// One of the two compute servers.
#[derive(Parser)]
#[command(name = "remora_server")]
struct Cli {
    /// Protocol role: 0 or 1.
    #[arg(long)]
    role: u8,

    /// Peer link address: where P1 listens and P0 connects.
    #[arg(long, default_value = DEFAULT_PEER_ADDR)]
    peer_addr: String,

    /// Helper address.
    #[arg(long, default_value = DEFAULT_HELPER_ADDR)]
    helper_addr: String,

    /// Directory holding the share and query files.
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

fn connect_with_retry(addr: &str) -> Result<TcpStream> {
    loop {
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(_) => std::thread::sleep(Duration::from_millis(100)),
        }
    }
}

fn channel_from(stream: TcpStream) -> Result<TcpChannel> {
    let reader = BufReader::new(stream.try_clone()?);
    let writer = BufWriter::new(stream);
    Ok(Channel::new(reader, writer))
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Cli::parse();
    let role = Role::try_from(args.role).wrap_err("role must be 0 or 1")?;
    let params = Params {
        users: args.users,
        items: args.items,
        features: args.features,
        queries: args.queries,
    };

    let stream = connect_with_retry(&args.helper_addr)?;
    let mut helper = channel_from(stream)?;
    helper.write_u8(role.index() as u8)?;
    helper.flush()?;
    info!("{}: connected to helper at {}", role, args.helper_addr);

    let stream = match role {
        Role::P0 => {
            info!("{}: connecting to peer at {}", role, args.peer_addr);
            connect_with_retry(&args.peer_addr)?
        }
        Role::P1 => {
            info!("{}: waiting for peer on {}", role, args.peer_addr);
            let listener = TcpListener::bind(&args.peer_addr)
                .wrap_err_with(|| format!("binding peer address {}", args.peer_addr))?;
            let (stream, addr) = listener.accept()?;
            info!("{}: peer connected from {}", role, addr);
            stream
        }
    };
    stream.set_nodelay(true)?;
    let mut peer = TrackChannel::new(channel_from(stream)?);

    let users = matrix::load(
        &config::user_share_path(&args.dir, role),
        params.users as usize,
        params.features as usize,
    )
    .wrap_err("loading U shares")?;
    let items = matrix::load(
        &config::item_share_path(&args.dir, role),
        params.items as usize,
        params.features as usize,
    )
    .wrap_err("loading V shares")?;
    let query_list =
        queries::read_queries(&config::query_path(&args.dir, role)).wrap_err("loading queries")?;
    info!("{}: loaded shares and {} queries", role, query_list.len());
    if query_list.len() != params.queries as usize {
        warn!(
            "{}: query file holds {} queries but --queries is {}; the helper must agree with the file",
            role,
            query_list.len(),
            params.queries
        );
    }

    let mut session = ServerSession::new(role, users, items)?;
    let report = session.run(&mut peer, &mut helper, &query_list)?;
    info!("{}: all queries processed", role);

    let (users, items) = session.into_shares();
    matrix::save(&config::updated_user_share_path(&args.dir, role), &users)
        .wrap_err("saving updated U shares")?;
    matrix::save(&config::updated_item_share_path(&args.dir, role), &items)
        .wrap_err("saving updated V shares")?;
    info!("{}: saved updated shares", role);

    if role == Role::P0 {
        info!(
            "m={} n={} k={} q={}",
            params.users, params.items, params.features, params.queries
        );
        info!(
            "average user profile update time: {:.9}s",
            report.average_user_seconds()
        );
        info!(
            "average item profile update time: {:.9}s",
            report.average_item_seconds()
        );
    }
    info!(
        "{}: peer communication: {:.2} kb",
        role,
        peer.total_kilobits()
    );
    Ok(())
}
