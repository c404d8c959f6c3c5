use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod bitmap;
mod chunkserver;
mod error;
mod expander;
mod grammar;
mod orchestrator;
mod region;
mod router;
mod wire;
mod worker;

use error::{Error, Result};
use grammar::Grammar;
use orchestrator::Orchestrator;
use wire::MAX_PACKET_SIZE;

/// UDP port the orchestrator binds for worker traffic.
const SERVER_PORT: u16 = 5000;

/// Coordinates quadrant rendering workers over a custom UDP protocol,
/// driving an L-system expansion from a grammar file to completion.
#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
struct Cli {
    /// Path to the L-system grammar file.
    lsystem_file: PathBuf,

    /// Increase log verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn run() -> Result<()> {
    let cli = Cli::try_parse()?;
    init_logging(cli.verbose);

    let grammar = Grammar::load(&cli.lsystem_file)?;
    log::info!(
        "grammar loaded: axiom={:?} angle={} iterations={}",
        grammar.axiom,
        grammar.angle,
        grammar.iterations
    );

    let string = expander::expand(&grammar);
    if string.is_empty() {
        return Err(Error::EmptyExpansion);
    }
    let preview: String = string.chars().take(60).collect();
    log::info!(
        "expanded string length={} preview={:?}{}",
        string.len(),
        preview,
        if string.len() > 60 { "..." } else { "" }
    );

    let bind_addr: SocketAddr = ([0, 0, 0, 0], SERVER_PORT).into();
    let socket = UdpSocket::bind(bind_addr).map_err(|e| Error::Bind(bind_addr, e))?;
    log::info!("listening on {bind_addr}");

    let mut orch = Orchestrator::new(&grammar, string);
    let mut buf = [0u8; MAX_PACKET_SIZE];

    loop {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("recv_from failed: {e}");
                continue;
            }
        };
        let outbound = orch.handle_datagram(src, &buf[..len]);
        for reply in outbound {
            if let Err(e) = socket.send_to(&reply.bytes, reply.to) {
                log::warn!("failed to send to {}: {e}", reply.to);
            }
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be initialized yet if argument parsing itself
            // failed, so the fatal error is always also written to stderr.
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
