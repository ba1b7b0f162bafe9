// wayfarer_protocol — binary transport for path results.
//
// Hosts that run pathfinding out of process (a server computing paths for
// networked clients, or a tool dumping paths to disk) need a compact,
// stable byte form of a `PathResult`. This crate provides it and nothing
// else; it does not know about handles, navmeshes or threads.
//
// Module overview:
// - `wire.rs`:    Fixed little-endian layout of one `PathResult`.
// - `framing.rs`: Length-delimited frames over any `Read`/`Write` stream:
//                 4-byte big-endian length prefix, then payload.
//
// Design decisions:
// - **Hand-written layout, no serde.** The byte layout is part of the
//   contract with non-Rust consumers, so it is spelled out field by field
//   instead of delegated to a serializer whose format could drift.
// - **No async runtime.** Plain `std::io::Read`/`Write`, usable with
//   blocking sockets, files, or in-memory buffers.

pub mod framing;
pub mod wire;

pub use framing::{MAX_FRAME_SIZE, read_frame, read_path, write_frame, write_path};
pub use wire::{MAX_EDGES, decode, decode_from, encode, encode_into};

use std::io;

/// Errors from encoding, decoding or framing.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid already-at-goal flag {0} (expected 0 or 1)")]
    InvalidFlag(u8),
    #[error("edge count {0} exceeds maximum {max}", max = MAX_EDGES)]
    TooManyEdges(u32),
    #[error("frame of {0} bytes exceeds maximum {max}", max = MAX_FRAME_SIZE)]
    FrameTooLarge(usize),
}
