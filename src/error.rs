//! Error types shared by every layer of the transfer core.
//!
//! The library never prints and never exits. Fatal-versus-recoverable
//! decisions belong to the binary; the server's accept loop decides
//! which of these end a session and which end the process.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Peer hung up before a full frame crossed the wire.
    #[error("connection closed by peer mid-frame")]
    ConnectionClosed,

    /// Socket or file syscall failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Could not bind a listening socket for a reason other than the
    /// port being taken.
    #[error("cannot bind port {port}: {source}")]
    Bind { port: u16, source: io::Error },

    /// Every candidate data port in the search window was taken.
    #[error("no free data port after {attempts} attempts from {base}")]
    PortExhausted { base: u16, attempts: u16 },

    /// Control frame did not carry a recognized command.
    #[error("unrecognized command {0:?}")]
    UnknownCommand(String),

    /// The port announcement frame was not a decimal port number.
    #[error("malformed port announcement {0:?}")]
    BadPortFrame(String),

    /// Local file missing. Recoverable in-band on the GET path (the
    /// server answers with a sentinel payload), fatal on the SEND path.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Connect retries were exhausted without reaching the peer.
    #[error("gave up connecting to {0}")]
    ConnectTimedOut(String),
}

pub type Result<T> = std::result::Result<T, TransferError>;
