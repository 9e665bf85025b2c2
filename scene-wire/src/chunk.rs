//! Splitting encoded frames into transport-sized chunks.
//!
//! Mesh-heavy entity frames routinely exceed what one transport message
//! may carry. An encoded frame is split into chunks of at most
//! [`MAX_CHUNK_BYTES`]; the receiver concatenates chunks in order until it
//! sees the frame terminator, so no extra framing is needed. Splits land
//! at byte offsets, which is safe because the envelope is ASCII-delimited
//! and reassembly happens before any UTF-8 interpretation.

use crate::frame::Frame;

/// Maximum size of one transport chunk.
pub const MAX_CHUNK_BYTES: usize = 1 << 20;

/// Split encoded frame bytes into chunks of at most `max` bytes.
///
/// Every chunk except the last is exactly `max` bytes. Empty input
/// produces no chunks.
#[must_use]
pub fn chunk_bytes(encoded: &[u8], max: usize) -> Vec<Vec<u8>> {
    encoded.chunks(max).map(<[u8]>::to_vec).collect()
}

/// Encode a frame and split it into transport chunks of the default size.
#[must_use]
pub fn chunk_frame(frame: &Frame) -> Vec<Vec<u8>> {
    chunk_bytes(frame.encode().as_bytes(), MAX_CHUNK_BYTES)
}

/// Encode a sequence of frames into one contiguous chunk stream.
///
/// Frames are concatenated before splitting, so a chunk may end with the
/// tail of one frame and begin with the head of the next.
#[must_use]
pub fn chunk_frames(frames: &[Frame], max: usize) -> Vec<Vec<u8>> {
    let mut encoded = Vec::new();
    for frame in frames {
        encoded.extend_from_slice(frame.encode().as_bytes());
    }
    chunk_bytes(&encoded, max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::frame::FrameKind;

    #[test]
    fn small_frames_fit_in_one_chunk() {
        let frame = Frame::beacon();
        let chunks = chunk_frame(&frame);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], frame.encode().as_bytes());
    }

    #[test]
    fn oversized_payloads_split_at_the_limit() {
        let payload = "x".repeat(MAX_CHUNK_BYTES);
        let frame = Frame::new(FrameKind::Data, payload);
        let chunks = chunk_frame(&frame);

        // Envelope overhead pushes the total just past one chunk.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), MAX_CHUNK_BYTES);
        assert!(chunks[1].len() < MAX_CHUNK_BYTES);
    }

    #[test]
    fn chunk_count_matches_ceiling_division() {
        let data = vec![0u8; 2500];
        let chunks = chunk_bytes(&data, 1000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[1].len(), 1000);
        assert_eq!(chunks[2].len(), 500);
    }

    #[test]
    fn reassembly_restores_the_stream() {
        let frames = vec![Frame::spawn("arm"), Frame::beacon()];
        let chunks = chunk_frames(&frames, 7);

        let mut rebuilt = Vec::new();
        for chunk in &chunks {
            rebuilt.extend_from_slice(chunk);
        }
        let expected: String = frames.iter().map(Frame::encode).collect();
        assert_eq!(rebuilt, expected.as_bytes());
    }

    #[test]
    fn empty_input_produces_no_chunks() {
        assert!(chunk_bytes(&[], 100).is_empty());
    }
}
