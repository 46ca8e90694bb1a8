//! Error types for RCON exchanges.

use thiserror::Error;

/// Result type alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to an RCON server.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket failure, including read/write timeouts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered the login packet with request id -1
    #[error("authentication failed: the server rejected the RCON password")]
    AuthenticationFailed,

    /// Command payload exceeds what the server will accept
    #[error("command is {len} bytes, the server accepts at most {max}")]
    CommandTooLong {
        /// Payload length in bytes
        len: usize,
        /// Largest accepted payload
        max: usize,
    },

    /// Malformed or unexpected packet
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Address is not `host` or `host:port`
    #[error("invalid address {0:?}: expected host or host:port")]
    InvalidAddress(String),
}
