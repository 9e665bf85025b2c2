//! Wire protocol for streaming scenes to a renderer.
//!
//! The protocol is a one-way stream of [`Frame`]s. Each frame is a kind
//! tag and a payload rendered as `KIND:::payload</>`; structured payloads
//! are JSON. A typical transmission is shape frames, then entity frames,
//! then a spawn instruction per entity, closed by a beacon. Encoded frames
//! are split into chunks of at most [`MAX_CHUNK_BYTES`] for the transport.
//!
//! Packaging is deterministic: identical inputs produce byte-identical
//! frames, which keeps transmissions diffable and testable.

mod chunk;
mod error;
mod frame;
mod package;

pub use chunk::{chunk_bytes, chunk_frame, chunk_frames, MAX_CHUNK_BYTES};
pub use error::{WireError, WireResult};
pub use frame::{Frame, FrameKind, FRAME_SEPARATOR, FRAME_TERMINATOR};
pub use package::{
    document_frame, frames_to_json_pretty, package, package_scene, package_shape, package_update,
    stream_frames,
};
