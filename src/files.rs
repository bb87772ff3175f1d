//! File store adapter: named file to bounded payload and back.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransferError};
use crate::frame::FRAME_LEN;

/// Strips trailing CR/TAB/LF left over from line input or frame
/// decoding before the name touches the filesystem.
pub fn sanitize_name(name: &str) -> &str {
    name.trim_end_matches(|c| c == '\r' || c == '\t' || c == '\n')
}

/// Reads at most one frame's worth of a file. Longer content is
/// truncated; the frame is the transfer unit. A missing file is the
/// one failure callers handle specially, so it gets its own variant.
pub fn read_payload(name: &str) -> Result<Vec<u8>> {
    let name = sanitize_name(name);
    let file = match File::open(name) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(TransferError::FileNotFound(name.to_string()))
        }
        Err(e) => return Err(TransferError::Io(e)),
    };
    let mut payload = Vec::with_capacity(FRAME_LEN);
    file.take(FRAME_LEN as u64).read_to_end(&mut payload)?;
    Ok(payload)
}

/// Creates or overwrites `name` with the received payload.
pub fn write_payload(name: &str, payload: &[u8]) -> Result<()> {
    let name = sanitize_name(name);
    let mut file = File::create(name)?;
    file.write_all(payload)?;
    Ok(())
}
