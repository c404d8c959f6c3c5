use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the orchestrator.
///
/// Startup-fatal variants (`Io`, `Bind`, `Grammar`, `Cli`, `EmptyExpansion`) are the only ones that
/// ever reach `main`; everything else is caught and logged at the dispatch
/// boundary in [`crate::orchestrator::Orchestrator::handle_datagram`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind orchestrator socket on {0}: {1}")]
    Bind(std::net::SocketAddr, #[source] std::io::Error),

    #[error("could not read grammar file {path}: {source}")]
    Grammar {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Cli(#[from] clap::Error),

    #[error("L-system string is empty")]
    EmptyExpansion,

    #[error("datagram too short to hold a header ({len} bytes)")]
    Truncated { len: usize },

    #[error("datagram truncated mid-payload: expected {expected} bytes, got {got}")]
    PayloadTruncated { expected: usize, got: usize },

    #[error("unknown message type 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("malformed payload for message type 0x{0:02x}: {1}")]
    Malformed(u8, &'static str),
}
