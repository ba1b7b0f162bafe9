// Binary encoding of a `PathResult`.
//
// Layout, little-endian, no padding:
//
//   u8   already_at_goal   0 or 1
//   u32  edge_count
//   edge_count × {
//     i32 from.x, i32 from.y, i32 to.x, i32 to.y, u32 edge_type
//   }
//
// Each edge is 20 bytes. The cursor of a `PathResult` is not encoded; a
// decoded result starts at its first edge.

use crate::WireError;
use crate::framing::MAX_FRAME_SIZE;
use std::io::{Read, Write};
use wayfarer_nav::{EdgeTypeId, PathEdge, PathResult, TilePoint};

/// Upper bound on `edge_count`: the most edges whose encoding still fits in
/// one frame.
pub const MAX_EDGES: u32 = (MAX_FRAME_SIZE - HEADER_SIZE as u32) / EDGE_SIZE as u32;

/// Encoded size of one edge.
pub const EDGE_SIZE: usize = 20;

/// Encoded size of the header (flag + count).
pub const HEADER_SIZE: usize = 5;

/// Serialize `path` into a new buffer.
pub fn encode(path: &PathResult) -> Result<Vec<u8>, WireError> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + path.len() * EDGE_SIZE);
    encode_into(&mut buf, path)?;
    Ok(buf)
}

/// Serialize `path` into any writer.
pub fn encode_into<W: Write>(writer: &mut W, path: &PathResult) -> Result<(), WireError> {
    let count = u32::try_from(path.len())
        .ok()
        .filter(|&n| n <= MAX_EDGES)
        .ok_or(WireError::TooManyEdges(u32::try_from(path.len()).unwrap_or(u32::MAX)))?;
    writer.write_all(&[u8::from(path.is_already_at_goal())])?;
    writer.write_all(&count.to_le_bytes())?;
    for edge in path.edges() {
        writer.write_all(&edge.from.x.to_le_bytes())?;
        writer.write_all(&edge.from.y.to_le_bytes())?;
        writer.write_all(&edge.to.x.to_le_bytes())?;
        writer.write_all(&edge.to.y.to_le_bytes())?;
        writer.write_all(&edge.edge_type.0.to_le_bytes())?;
    }
    Ok(())
}

/// Deserialize a `PathResult` from a complete buffer. Trailing bytes are
/// ignored.
pub fn decode(mut bytes: &[u8]) -> Result<PathResult, WireError> {
    decode_from(&mut bytes)
}

/// Deserialize a `PathResult` from any reader.
pub fn decode_from<R: Read>(reader: &mut R) -> Result<PathResult, WireError> {
    let already_at_goal = match read_u8(reader)? {
        0 => false,
        1 => true,
        flag => return Err(WireError::InvalidFlag(flag)),
    };
    let count = read_u32(reader)?;
    if count > MAX_EDGES {
        return Err(WireError::TooManyEdges(count));
    }

    // Grow as bytes actually arrive rather than trusting the count.
    let mut edges = Vec::with_capacity((count as usize).min(1024));
    for _ in 0..count {
        let from = TilePoint::new(read_i32(reader)?, read_i32(reader)?);
        let to = TilePoint::new(read_i32(reader)?, read_i32(reader)?);
        let edge_type = EdgeTypeId(read_u32(reader)?);
        edges.push(PathEdge { from, to, edge_type });
    }
    Ok(PathResult::from_parts(already_at_goal, edges))
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8, WireError> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, WireError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, WireError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}
