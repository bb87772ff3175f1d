//! Socket construction: the control listener, the per-session data
//! port negotiation, and bounded connect retry for the client side.

use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use log::debug;
use net2::TcpBuilder;

use crate::error::{Result, TransferError};

const LISTEN_BACKLOG: i32 = 5;

/// Builds the long-lived control listener. SO_REUSEADDR is set so a
/// restarted server can rebind its well-known port immediately.
pub fn build_control_listener(port: u16) -> Result<TcpListener> {
    let builder = TcpBuilder::new_v4()?;
    builder.reuse_address(true)?;
    builder
        .bind(("0.0.0.0", port))
        .map_err(|e| TransferError::Bind { port, source: e })?;
    let listener = builder
        .listen(LISTEN_BACKLOG)
        .map_err(|e| TransferError::Bind { port, source: e })?;
    Ok(listener)
}

/// Finds a free data port by scanning upward from `base`: address-in-use
/// advances to the next candidate, any other bind failure is fatal to
/// the session. The scan is capped at `max_attempts` candidates and then
/// fails with `PortExhausted` rather than walking the whole port space.
pub fn bind_data_port(base: u16, max_attempts: u16) -> Result<(TcpListener, u16)> {
    let mut port = base;
    for _ in 0..max_attempts {
        let builder = TcpBuilder::new_v4()?;
        match builder.bind(("0.0.0.0", port)) {
            Ok(bound) => {
                let listener = bound
                    .listen(LISTEN_BACKLOG)
                    .map_err(|e| TransferError::Bind { port, source: e })?;
                debug!("data channel bound on port {}", port);
                return Ok((listener, port));
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                debug!("port {} is busy, trying {}", port, port.wrapping_add(1));
                port = port.checked_add(1).ok_or(TransferError::PortExhausted {
                    base,
                    attempts: max_attempts,
                })?;
            }
            Err(e) => return Err(TransferError::Bind { port, source: e }),
        }
    }
    Err(TransferError::PortExhausted {
        base,
        attempts: max_attempts,
    })
}

/// Connects to `host:port`, sleeping and doubling the backoff after each
/// refused attempt. Covers the window where the peer has announced a
/// port but not yet reached accept; anything other than a refusal
/// propagates immediately.
pub fn connect_with_retry(
    host: &str,
    port: u16,
    attempts: u32,
    first_backoff: Duration,
) -> Result<TcpStream> {
    let mut backoff = first_backoff;
    for attempt in 1..=attempts {
        match TcpStream::connect((host, port)) {
            Ok(stream) => return Ok(stream),
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                if attempt == attempts {
                    break;
                }
                debug!(
                    "connect to {}:{} refused (attempt {}), retrying in {:?}",
                    host, port, attempt, backoff
                );
                thread::sleep(backoff);
                backoff *= 2;
            }
            Err(e) => return Err(TransferError::Io(e)),
        }
    }
    Err(TransferError::ConnectTimedOut(format!("{}:{}", host, port)))
}
