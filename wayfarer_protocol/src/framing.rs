// Length-delimited framing over any byte stream.
//
// Each frame is a 4-byte big-endian length prefix followed by the payload.
// `write_frame` / `read_frame` are payload-agnostic; `write_path` /
// `read_path` wrap them around the `wire.rs` encoding so a stream can carry
// a sequence of path results.
//
// `MAX_FRAME_SIZE` (16 MB) protects against unbounded allocation from a
// malformed length prefix. `wire::MAX_EDGES` is derived from it, so any
// path `encode` accepts can be written as a single frame.

use crate::WireError;
use crate::wire;
use std::io::{Read, Write};
use wayfarer_nav::PathResult;

/// Maximum allowed frame payload size (16 MB).
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Write one frame: 4-byte big-endian length, then payload.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), WireError> {
    let len = payload.len();
    let len = u32::try_from(len)
        .ok()
        .filter(|&n| n <= MAX_FRAME_SIZE)
        .ok_or(WireError::FrameTooLarge(len))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame.
///
/// Returns `WireError::Io` with `UnexpectedEof` if the stream ends before
/// or during a frame, and `FrameTooLarge` for an oversized length prefix.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge(len as usize));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Encode `path` and write it as one frame.
pub fn write_path<W: Write>(writer: &mut W, path: &PathResult) -> Result<(), WireError> {
    let payload = wire::encode(path)?;
    write_frame(writer, &payload)
}

/// Read one frame and decode it as a path.
pub fn read_path<R: Read>(reader: &mut R) -> Result<PathResult, WireError> {
    let payload = read_frame(reader)?;
    let path = wire::decode(&payload)?;
    tracing::trace!(bytes = payload.len(), edges = path.len(), "decoded path frame");
    Ok(path)
}
