//! dcftp: a minimal two-phase file transfer protocol over TCP.
//!
//! A control channel negotiates a command (`GET` or `SEND`) and a
//! filename; a freshly opened data channel then carries exactly one
//! fixed-length payload frame. Everything on the wire is an 80-byte
//! frame, read and written to exact length.

pub mod cmd;
pub mod error;
pub mod files;
pub mod frame;
pub mod network;
pub mod protocol;

pub use error::{Result, TransferError};
pub use protocol::{client_get, client_send, run_server, Command};
