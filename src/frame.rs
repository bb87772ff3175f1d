//! Exact-length frame I/O.
//!
//! Every message in this protocol, control or payload, is a fixed
//! [`FRAME_LEN`]-byte block. A send or receive is not complete until
//! exactly that many bytes have crossed the wire, no matter how the
//! transport fragments them. Text frames are newline-terminated and
//! zero-padded; payload frames are caller-bounded data, zero-padded.

use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransferError};

/// Wire size of every frame, control and payload alike.
pub const FRAME_LEN: usize = 80;

/// Reads exactly one frame, or fails. A zero-byte read means the peer
/// closed and terminates the loop with `ConnectionClosed`; a partial
/// frame is never returned.
pub fn read_exact_frame<R: Read>(stream: &mut R) -> Result<[u8; FRAME_LEN]> {
    let mut buf = [0u8; FRAME_LEN];
    let mut filled = 0;
    while filled < FRAME_LEN {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Err(TransferError::ConnectionClosed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransferError::Io(e)),
        }
    }
    Ok(buf)
}

/// Pads `payload` with zero bytes to [`FRAME_LEN`] and writes the whole
/// frame. Content past the frame length does not fit on the wire and is
/// dropped; the frame is the transfer unit.
pub fn write_frame<W: Write>(stream: &mut W, payload: &[u8]) -> Result<()> {
    let take = payload.len().min(FRAME_LEN);
    let mut buf = [0u8; FRAME_LEN];
    buf[..take].copy_from_slice(&payload[..take]);

    let mut written = 0;
    while written < FRAME_LEN {
        match stream.write(&buf[written..]) {
            Ok(0) => return Err(TransferError::ConnectionClosed),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransferError::Io(e)),
        }
    }
    Ok(())
}

/// Strips only the trailing zero padding, keeping any terminator the
/// sender wrote. Command parsing needs the newline intact.
pub fn trim_padding(frame: &[u8]) -> &[u8] {
    let end = frame.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &frame[..end]
}

/// Strips trailing padding and control bytes (NUL, CR, TAB, LF) from a
/// received frame, recovering the logical content.
pub fn trim_frame(frame: &[u8]) -> &[u8] {
    let end = frame
        .iter()
        .rposition(|&b| !matches!(b, 0 | b'\r' | b'\t' | b'\n'))
        .map_or(0, |i| i + 1);
    &frame[..end]
}

/// Trimmed frame content as text, for the port and filename frames.
pub fn frame_text(frame: &[u8]) -> String {
    String::from_utf8_lossy(trim_frame(frame)).into_owned()
}
