//! Core protocol types: the tag, the envelope, and inbound classification.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ProtocolError;

/// Width of the tag field in bytes. Every frame starts with exactly this
/// many bytes of tag.
pub const TAG_WIDTH: usize = 32;

/// The byte used to right-pad tags to [`TAG_WIDTH`] (ASCII space).
pub const TAG_PAD: u8 = b' ';

/// Tag texts spoken by the client and the game server.
pub mod tags {
    // -- Client → Server --
    pub const HELO: &str = "HELO";
    pub const GAME_REQ: &str = "GAME_REQ";
    pub const GAMEPLAY: &str = "GAMEPLAY";
    pub const BEGIN_GAME: &str = "BEGIN_GAME";
    pub const NEXT_ROUND: &str = "NEXT_ROUND";

    // -- Server → Client --
    pub const INIT: &str = "INIT";
    pub const GAMES: &str = "GAMES";
    pub const START_WAIT: &str = "START_WAIT";
    pub const START_ROUND: &str = "START_ROUND";
    pub const QUESTION_RESPONSE: &str = "QUESTION_RESPONSE";
    pub const BUZZED: &str = "BUZZED";
    pub const WHEEL_SPUN: &str = "WHEEL_SPUN";
    pub const PLAYER_SELECTED: &str = "PLAYER_SELECTED";
    pub const ANSWER_RESPONSE: &str = "ANSWER_RESPONSE";
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// The message-class label at the front of every frame.
///
/// Holds the tag text *without* padding. Construction enforces the wire
/// invariants (ASCII, at most [`TAG_WIDTH`] bytes), so any `Tag` can be
/// padded onto the wire as-is.
///
/// Comparisons against `&str` ignore trailing padding on the other side, so
/// `tag == "GAMEPLAY"` and `tag == "GAMEPLAY    "` agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Validates `text` as a tag.
    ///
    /// # Errors
    /// [`ProtocolError::TagNotAscii`] or [`ProtocolError::TagTooLong`].
    pub fn new(text: impl Into<String>) -> Result<Self, ProtocolError> {
        let text = text.into();
        if !text.is_ascii() {
            return Err(ProtocolError::TagNotAscii(text));
        }
        if text.len() > TAG_WIDTH {
            let len = text.len();
            return Err(ProtocolError::TagTooLong { tag: text, len });
        }
        Ok(Self(text))
    }

    /// Reads a tag out of a raw tag field, dropping trailing padding.
    pub(crate) fn from_field(field: &[u8]) -> Result<Self, ProtocolError> {
        if !field.is_ascii() {
            return Err(ProtocolError::MalformedTag);
        }
        let text = std::str::from_utf8(field)
            .map_err(|_| ProtocolError::MalformedTag)?
            .trim_end_matches(TAG_PAD as char);
        Ok(Self(text.to_string()))
    }

    /// The tag text, without padding.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag as it appears on the wire: exactly [`TAG_WIDTH`] bytes.
    pub fn padded(&self) -> [u8; TAG_WIDTH] {
        let mut field = [TAG_PAD; TAG_WIDTH];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.trim_end_matches(TAG_PAD as char)
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

// ---------------------------------------------------------------------------
// InboundKind
// ---------------------------------------------------------------------------

/// What kind of server message an inbound [`Envelope`] carries.
///
/// Unknown tags map to [`InboundKind::Other`] and are still delivered; the
/// client has no opinion about server messages it doesn't recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Welcome after a successful handshake.
    Init,
    /// The list of open games.
    Games,
    /// A game is waiting for players.
    StartWait,
    /// A round has started.
    StartRound,
    /// The selected question.
    QuestionResponse,
    /// Another player buzzed.
    Buzzed,
    /// Someone spun the wheel.
    WheelSpun,
    /// A player won the buzz and must answer.
    PlayerSelected,
    /// Result of an answer.
    AnswerResponse,
    /// Any other tag.
    Other(String),
}

impl InboundKind {
    /// Classifies a tag.
    pub fn from_tag(tag: &Tag) -> Self {
        match tag.as_str() {
            tags::INIT => Self::Init,
            tags::GAMES => Self::Games,
            tags::START_WAIT => Self::StartWait,
            tags::START_ROUND => Self::StartRound,
            tags::QUESTION_RESPONSE => Self::QuestionResponse,
            tags::BUZZED => Self::Buzzed,
            tags::WHEEL_SPUN => Self::WheelSpun,
            tags::PLAYER_SELECTED => Self::PlayerSelected,
            tags::ANSWER_RESPONSE => Self::AnswerResponse,
            other => Self::Other(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// One complete wire message: a tag and its JSON body.
///
/// ```text
/// ┌──────────────────────────────────┬────────────────────────────┐
/// │ "GAMEPLAY" + 24 spaces (32 bytes) │ {"req":"BUZZ","gameId":…}  │
/// └──────────────────────────────────┴────────────────────────────┘
/// ```
///
/// Outbound bodies are always JSON objects. Inbound bodies can be any JSON
/// value; the server sends the game list as a bare array.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub tag: Tag,
    pub payload: Value,
}

impl Envelope {
    /// Builds an envelope from a tag and an already-built body.
    pub fn new(tag: Tag, payload: Value) -> Self {
        Self { tag, payload }
    }

    /// Classifies the tag.
    pub fn kind(&self) -> InboundKind {
        InboundKind::from_tag(&self.tag)
    }

    /// Encodes this envelope into wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        crate::encode(self.tag.as_str(), &self.payload)
    }

    /// Deserializes the body into a concrete type.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] if the body doesn't have the expected shape.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        T::deserialize(&self.payload).map_err(ProtocolError::Decode)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_tag_new_accepts_exactly_32_bytes() {
        let text = "A".repeat(TAG_WIDTH);
        let tag = Tag::new(text.clone()).expect("32 bytes fits");
        assert_eq!(tag.as_str(), text);
    }

    #[test]
    fn test_tag_new_rejects_33_bytes() {
        let err = Tag::new("B".repeat(TAG_WIDTH + 1)).unwrap_err();
        assert!(matches!(err, ProtocolError::TagTooLong { len: 33, .. }));
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_tag_new_rejects_non_ascii() {
        let err = Tag::new("JOGO_É").unwrap_err();
        assert!(matches!(err, ProtocolError::TagNotAscii(_)));
    }

    #[test]
    fn test_tag_padded_is_space_filled() {
        let tag = Tag::new("GAMEPLAY").unwrap();
        let field = tag.padded();
        assert_eq!(&field[..8], b"GAMEPLAY");
        assert!(field[8..].iter().all(|b| *b == b' '));
    }

    #[test]
    fn test_tag_comparison_is_padding_tolerant() {
        let tag = Tag::new("GAMES").unwrap();
        assert!(tag == "GAMES");
        assert!(tag == "GAMES                           ");
        assert!(tag != "GAME");
    }

    #[test]
    fn test_tag_from_field_trims_padding() {
        let tag = Tag::from_field(b"START_WAIT                      ").unwrap();
        assert_eq!(tag.as_str(), "START_WAIT");
    }

    #[test]
    fn test_tag_from_field_rejects_binary() {
        let mut field = [b' '; TAG_WIDTH];
        field[0] = 0xff;
        assert!(matches!(
            Tag::from_field(&field),
            Err(ProtocolError::MalformedTag)
        ));
    }

    #[test]
    fn test_inbound_kind_known_and_unknown() {
        let known = Tag::new(tags::ANSWER_RESPONSE).unwrap();
        assert_eq!(InboundKind::from_tag(&known), InboundKind::AnswerResponse);

        let unknown = Tag::new("CONFETTI").unwrap();
        assert_eq!(
            InboundKind::from_tag(&unknown),
            InboundKind::Other("CONFETTI".into())
        );
    }

    #[test]
    fn test_envelope_kind_follows_tag() {
        let env = Envelope::new(
            Tag::new(tags::START_WAIT).unwrap(),
            serde_json::json!({ "gameId": "g1" }),
        );
        assert_eq!(env.kind(), InboundKind::StartWait);
    }

    #[test]
    fn test_envelope_payload_as_typed_struct() {
        #[derive(serde::Deserialize)]
        struct Buzzed {
            #[serde(rename = "playerId")]
            player_id: String,
            delay: u32,
        }

        let env = Envelope::new(
            Tag::new(tags::BUZZED).unwrap(),
            serde_json::json!({ "playerId": "p-1", "delay": 812 }),
        );
        let buzzed: Buzzed = env.payload_as().unwrap();
        assert_eq!(buzzed.player_id, "p-1");
        assert_eq!(buzzed.delay, 812);
    }

    #[test]
    fn test_envelope_payload_as_wrong_shape_is_payload_error() {
        let env = Envelope::new(
            Tag::new(tags::GAMES).unwrap(),
            serde_json::json!([]),
        );
        let err = env.payload_as::<std::collections::HashMap<String, u32>>();
        assert_eq!(err.unwrap_err().kind(), ErrorKind::Payload);
    }
}
