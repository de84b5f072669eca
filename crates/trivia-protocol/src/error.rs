//! Error types for the protocol layer.
//!
//! Everything here is local to one message or one command: a
//! `ProtocolError` never means the connection is broken. Whether the caller
//! may carry on depends on the [`ErrorKind`].

use crate::TAG_WIDTH;

/// Coarse classification of a [`ProtocolError`].
///
/// Callers branch on this rather than on individual variants:
///
/// | Kind | Meaning | Caller reaction |
/// |---|---|---|
/// | `Encoding` | outbound message cannot be put on the wire | reject the command |
/// | `Validation` | command is missing or has a mistyped field | reject the command |
/// | `Framing` | inbound message shorter than the tag | treat the stream as broken |
/// | `Payload` | inbound tag or body unreadable | drop the message |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Encoding,
    Validation,
    Framing,
    Payload,
}

/// Errors that can occur while encoding, decoding or validating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The tag text does not fit the fixed-width tag field.
    /// It is rejected, never truncated.
    #[error("tag {tag:?} is {len} bytes, the tag field holds {}", TAG_WIDTH)]
    TagTooLong { tag: String, len: usize },

    /// The tag text contains non-ASCII characters.
    #[error("tag {0:?} is not ASCII")]
    TagNotAscii(String),

    /// Serializing the body failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Fewer bytes than a full tag field were received.
    #[error("frame truncated: {len} bytes, need at least {}", TAG_WIDTH)]
    Truncated { len: usize },

    /// The tag field of an inbound frame is not ASCII text.
    #[error("malformed tag field")]
    MalformedTag,

    /// Nothing but whitespace follows the tag.
    #[error("frame has no payload")]
    EmptyPayload,

    /// The body is not valid JSON.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A command field is missing or has the wrong type.
    #[error("invalid field `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl ProtocolError {
    /// Shorthand for a [`ProtocolError::Validation`].
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Which category this error falls into.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TagTooLong { .. } | Self::TagNotAscii(_) | Self::Encode(_) => {
                ErrorKind::Encoding
            }
            Self::Truncated { .. } => ErrorKind::Framing,
            Self::MalformedTag | Self::EmptyPayload | Self::Decode(_) => {
                ErrorKind::Payload
            }
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// The offending field name, for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_truncated_is_framing() {
        let err = ProtocolError::Truncated { len: 3 };
        assert_eq!(err.kind(), ErrorKind::Framing);
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn test_kind_tag_errors_are_encoding() {
        let long = ProtocolError::TagTooLong {
            tag: "X".repeat(40),
            len: 40,
        };
        assert_eq!(long.kind(), ErrorKind::Encoding);
        assert_eq!(
            ProtocolError::TagNotAscii("é".into()).kind(),
            ErrorKind::Encoding
        );
    }

    #[test]
    fn test_validation_names_field() {
        let err = ProtocolError::validation("gameId", "required for JOIN");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("gameId"));
        assert_eq!(
            err.to_string(),
            "invalid field `gameId`: required for JOIN"
        );
    }
}
