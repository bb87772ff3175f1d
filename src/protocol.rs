//! The two-phase session state machine.
//!
//! One control connection negotiates a command and filename, then a
//! freshly opened data connection carries exactly one payload frame in
//! the direction the command dictates. Server sessions walk
//! AwaitingCommand, AwaitingFilename, DataChannelSetup, Transferring,
//! Closed; the client mirrors that sequence from the other end.

use std::net::TcpStream;
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::{Result, TransferError};
use crate::files::{read_payload, write_payload};
use crate::frame::{frame_text, read_exact_frame, trim_frame, trim_padding, write_frame};
use crate::network::{bind_data_port, build_control_listener, connect_with_retry};

pub const DEFAULT_CONTROL_PORT: u16 = 7005;
/// Data-port search restarts here for every session; the counter never
/// drifts upward across sessions.
pub const DATA_PORT_BASE: u16 = 7006;
pub const MAX_BIND_ATTEMPTS: u16 = 100;
/// In-band payload a GET receives when the server has no such file. The
/// client's fixed-length read must complete either way, so the miss is
/// carried as content rather than a torn connection.
pub const NOT_FOUND_SENTINEL: &[u8] = b"404";

const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_BACKOFF_START: Duration = Duration::from_millis(25);

/// The two operations a control channel can negotiate. Matching is
/// exact and case-sensitive, newline terminator included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Server-to-client transfer.
    Get,
    /// Client-to-server transfer.
    Send,
}

impl Command {
    pub fn as_frame(self) -> &'static [u8] {
        match self {
            Command::Get => b"GET\n",
            Command::Send => b"SEND\n",
        }
    }

    pub fn parse(frame: &[u8]) -> Result<Command> {
        match trim_padding(frame) {
            b"GET\n" => Ok(Command::Get),
            b"SEND\n" => Ok(Command::Send),
            other => Err(TransferError::UnknownCommand(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

/// Accepts clients forever, one session at a time. A failed session is
/// logged and discarded; it never takes the listener down with it.
pub fn run_server(port: u16) -> Result<()> {
    let listener = build_control_listener(port)?;
    // the data search base tracks the control port so the two-port
    // pairing (7005/7006 by default) holds wherever the server runs
    let data_base = port.checked_add(1).unwrap_or(DATA_PORT_BASE);
    info!("server listening on port {}", port);

    loop {
        let (control, peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(e) => {
                warn!("accept failed: {}", e);
                continue;
            }
        };
        info!("control connection from {}", peer);
        if let Err(e) = handle_session(control, data_base) {
            warn!("session with {} failed: {}", peer, e);
        }
        // control stream drops here; the listener lives on
    }
}

/// Drives one server-side session over an accepted control stream.
pub fn handle_session(mut control: TcpStream, data_base: u16) -> Result<()> {
    // AwaitingCommand
    let command = Command::parse(&read_exact_frame(&mut control)?)?;
    debug!("command: {:?}", command);

    // AwaitingFilename: bind the data channel, announce its port as a
    // decimal frame, then collect the filename
    let (data_listener, data_port) = bind_data_port(data_base, MAX_BIND_ATTEMPTS)?;
    write_frame(&mut control, data_port.to_string().as_bytes())?;
    info!("data channel on port {}", data_port);

    let filename = frame_text(&read_exact_frame(&mut control)?);
    debug!("filename: {:?}", filename);

    // DataChannelSetup: exactly one data connection per session
    let (mut data, data_peer) = data_listener.accept()?;
    debug!("data connection from {}", data_peer);

    // Transferring
    match command {
        Command::Get => {
            let payload = match read_payload(&filename) {
                Ok(payload) => payload,
                Err(TransferError::FileNotFound(_)) => {
                    info!("{:?} not found, sending sentinel", filename);
                    NOT_FOUND_SENTINEL.to_vec()
                }
                Err(e) => return Err(e),
            };
            write_frame(&mut data, &payload)?;
            info!("sent {} bytes for {:?}", payload.len(), filename);
        }
        Command::Send => {
            let frame = read_exact_frame(&mut data)?;
            let payload = trim_frame(&frame);
            write_payload(&filename, payload)?;
            info!("stored {} bytes into {:?}", payload.len(), filename);
        }
    }

    // Closed: the data socket drops first, the control stream is
    // dropped by the caller
    Ok(())
}

/// Client side of GET: negotiate, pull one payload frame over the data
/// channel, return its trimmed content. Storing the payload (and
/// interpreting the not-found sentinel) is the caller's business.
pub fn client_get(host: &str, port: u16, filename: &str) -> Result<Vec<u8>> {
    let mut control = connect_with_retry(host, port, CONNECT_ATTEMPTS, CONNECT_BACKOFF_START)?;
    write_frame(&mut control, Command::Get.as_frame())?;

    let data_port = parse_port_frame(&read_exact_frame(&mut control)?)?;
    info!("server opened port {} for file transfer", data_port);
    write_frame(&mut control, filename.as_bytes())?;

    let mut data = connect_with_retry(host, data_port, CONNECT_ATTEMPTS, CONNECT_BACKOFF_START)?;
    let frame = read_exact_frame(&mut data)?;
    Ok(trim_frame(&frame).to_vec())
}

/// Client side of SEND: push one local file to the server. The file is
/// read before anything touches the network, so a missing file aborts
/// with no traffic and the server never sees a half-negotiated session.
pub fn client_send(host: &str, port: u16, filename: &str) -> Result<()> {
    let payload = read_payload(filename)?;

    let mut control = connect_with_retry(host, port, CONNECT_ATTEMPTS, CONNECT_BACKOFF_START)?;
    write_frame(&mut control, Command::Send.as_frame())?;

    let data_port = parse_port_frame(&read_exact_frame(&mut control)?)?;
    info!("server opened port {} for file transfer", data_port);
    write_frame(&mut control, filename.as_bytes())?;

    let mut data = connect_with_retry(host, data_port, CONNECT_ATTEMPTS, CONNECT_BACKOFF_START)?;
    write_frame(&mut data, &payload)?;
    info!("sent {} bytes of {:?}", payload.len(), filename);
    Ok(())
}

fn parse_port_frame(frame: &[u8]) -> Result<u16> {
    let text = frame_text(frame);
    text.parse::<u16>()
        .map_err(|_| TransferError::BadPortFrame(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FRAME_LEN;

    fn framed(text: &[u8]) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[..text.len()].copy_from_slice(text);
        frame
    }

    #[test]
    fn commands_parse_exactly() {
        assert_eq!(Command::parse(&framed(b"GET\n")).unwrap(), Command::Get);
        assert_eq!(Command::parse(&framed(b"SEND\n")).unwrap(), Command::Send);
    }

    #[test]
    fn command_frames_round_trip() {
        for command in [Command::Get, Command::Send] {
            assert_eq!(Command::parse(&framed(command.as_frame())).unwrap(), command);
        }
    }

    #[test]
    fn unknown_commands_are_rejected() {
        for bad in [&b"PUT\n"[..], b"get\n", b"GET", b"GET \n", b""] {
            match Command::parse(&framed(bad)) {
                Err(TransferError::UnknownCommand(_)) => {}
                other => panic!("{:?} should be rejected, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn port_frame_parses_decimal_text() {
        assert_eq!(parse_port_frame(&framed(b"7006")).unwrap(), 7006);
        assert!(matches!(
            parse_port_frame(&framed(b"seven")),
            Err(TransferError::BadPortFrame(_))
        ));
        assert!(matches!(
            parse_port_frame(&framed(b"70000")),
            Err(TransferError::BadPortFrame(_))
        ));
    }
}
