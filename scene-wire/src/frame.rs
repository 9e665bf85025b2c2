//! Typed frames and the wire envelope.
//!
//! A frame is a kind tag plus a UTF-8 payload. On the wire it is rendered
//! as `KIND:::payload</>`; the receiver splits on the terminator and then
//! on the first separator. Payloads are JSON for structured frames and
//! bare strings for control frames.

use std::fmt;

/// Separator between the kind tag and the payload.
pub const FRAME_SEPARATOR: &str = ":::";

/// Terminator closing each frame on the wire.
pub const FRAME_TERMINATOR: &str = "</>";

/// Payload of the end-of-stream beacon.
const BEACON_PAYLOAD: &str = "Done";

/// Frame kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A complete robot scene.
    Entity,
    /// Mesh fragments belonging to a shape.
    Mesh,
    /// A standalone shape-table entry.
    Shape,
    /// A pose/state update for an existing entity.
    Update,
    /// End-of-stream marker.
    Beacon,
    /// Instruction to instantiate a previously sent entity.
    Spawn,
    /// Free-form auxiliary data.
    Data,
}

impl FrameKind {
    /// Wire tag of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "ENTITY",
            Self::Mesh => "MESH",
            Self::Shape => "SHAPE",
            Self::Update => "UPDATE",
            Self::Beacon => "BEACON",
            Self::Spawn => "SPAWN",
            Self::Data => "DATA",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Kind tag.
    pub kind: FrameKind,
    /// Payload text; JSON for structured kinds.
    pub payload: String,
}

impl Frame {
    /// Create a frame from a kind and payload.
    #[must_use]
    pub fn new(kind: FrameKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// The end-of-stream beacon frame.
    #[must_use]
    pub fn beacon() -> Self {
        Self::new(FrameKind::Beacon, BEACON_PAYLOAD)
    }

    /// A spawn instruction for the named entity.
    #[must_use]
    pub fn spawn(entity: impl Into<String>) -> Self {
        Self::new(FrameKind::Spawn, entity)
    }

    /// Render this frame into its wire envelope.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}{FRAME_SEPARATOR}{}{FRAME_TERMINATOR}",
            self.kind, self.payload
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_layout() {
        let frame = Frame::new(FrameKind::Entity, r#"{"name":"arm"}"#);
        assert_eq!(frame.encode(), r#"ENTITY:::{"name":"arm"}</>"#);
    }

    #[test]
    fn control_frames() {
        assert_eq!(Frame::beacon().encode(), "BEACON:::Done</>");
        assert_eq!(Frame::spawn("arm").encode(), "SPAWN:::arm</>");
    }

    #[test]
    fn kind_tags_are_uppercase() {
        assert_eq!(FrameKind::Mesh.as_str(), "MESH");
        assert_eq!(FrameKind::Data.to_string(), "DATA");
    }
}
