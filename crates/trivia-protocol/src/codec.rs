//! Encoding and decoding of tag-framed JSON messages.
//!
//! The fixed-width tag is the only framing the protocol has. The JSON body
//! needs no length prefix because a JSON value terminates itself: a parser
//! knows where an object or array ends. That property is also what lets
//! [`decode_batch`] split several frames the server coalesced into a single
//! WebSocket message.

use serde::Serialize;
use serde_json::Value;

use crate::{Envelope, ProtocolError, Tag, TAG_WIDTH};

/// Prefix of the untagged error line the server sends when it rejects a
/// request.
pub const NOTICE_PREFIX: &str = "An error occured: ";

/// Encodes `tag` and `payload` into one wire frame.
///
/// # Errors
/// - [`ProtocolError::TagTooLong`] / [`ProtocolError::TagNotAscii`] if the tag
///   doesn't fit the tag field.
/// - [`ProtocolError::Encode`] if the payload can't be serialized as JSON
///   (e.g. a map with non-string keys).
pub fn encode<T: Serialize + ?Sized>(
    tag: &str,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let tag = Tag::new(tag)?;
    let mut frame = Vec::with_capacity(TAG_WIDTH + 64);
    frame.extend_from_slice(&tag.padded());
    serde_json::to_writer(&mut frame, payload).map_err(ProtocolError::Encode)?;
    tracing::trace!(%tag, len = frame.len(), "encoded frame");
    Ok(frame)
}

/// Decodes one wire frame.
///
/// The body must be exactly one JSON value (surrounding whitespace allowed).
///
/// # Errors
/// - [`ProtocolError::Truncated`] if fewer than [`TAG_WIDTH`] bytes arrived.
///   Only this variant is a framing error.
/// - [`ProtocolError::MalformedTag`], [`ProtocolError::EmptyPayload`] or
///   [`ProtocolError::Decode`] if the frame is long enough but unreadable.
pub fn decode(bytes: &[u8]) -> Result<Envelope, ProtocolError> {
    let (tag, body) = split_tag(bytes)?;
    if body.trim_ascii().is_empty() {
        return Err(ProtocolError::EmptyPayload);
    }
    let payload: Value =
        serde_json::from_slice(body).map_err(ProtocolError::Decode)?;
    Ok(Envelope { tag, payload })
}

/// Decodes every item in `bytes`.
///
/// The server flushes queued messages as one WebSocket message, joined by
/// newlines. Items are read back to back: either a frame (tag, one JSON
/// value) or a server error line running to the next newline, then
/// optional whitespace, then the next item.
///
/// # Errors
/// Same as [`decode`], for whichever frame fails first. A batch whose last
/// frame is cut short inside the tag field reports
/// [`ProtocolError::Truncated`].
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Inbound>, ProtocolError> {
    let mut items = Vec::new();
    let mut rest = bytes;

    loop {
        if let Some((notice, after)) = ServerNotice::split(rest) {
            items.push(Inbound::Notice(notice));
            rest = after.trim_ascii_start();
        } else {
            let (tag, body) = split_tag(rest)?;

            let mut values =
                serde_json::Deserializer::from_slice(body).into_iter::<Value>();
            let payload = match values.next() {
                Some(Ok(value)) => value,
                Some(Err(e)) => return Err(ProtocolError::Decode(e)),
                None => return Err(ProtocolError::EmptyPayload),
            };
            let consumed = values.byte_offset();
            items.push(Inbound::Frame(Envelope { tag, payload }));

            rest = body[consumed..].trim_ascii_start();
        }
        if rest.is_empty() {
            break;
        }
    }

    if items.len() > 1 {
        tracing::trace!(count = items.len(), "split coalesced message");
    }
    Ok(items)
}

fn split_tag(bytes: &[u8]) -> Result<(Tag, &[u8]), ProtocolError> {
    if bytes.len() < TAG_WIDTH {
        return Err(ProtocolError::Truncated { len: bytes.len() });
    }
    let (field, body) = bytes.split_at(TAG_WIDTH);
    Ok((Tag::from_field(field)?, body))
}

/// One item of a server message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame(Envelope),
    Notice(ServerNotice),
}

// ---------------------------------------------------------------------------
// ServerNotice
// ---------------------------------------------------------------------------

/// An untagged error line from the server, e.g.
/// `An error occured: Unknown gameId: g9`.
///
/// These lines don't follow the frame format at all, so they are recognized
/// by prefix before a tag is read. The reason ends at the first newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNotice {
    pub reason: String,
}

impl ServerNotice {
    /// Splits a leading error line off `bytes`, returning the notice and
    /// whatever follows its newline.
    fn split(bytes: &[u8]) -> Option<(Self, &[u8])> {
        let rest = bytes.strip_prefix(NOTICE_PREFIX.as_bytes())?;
        let end = rest.iter().position(|b| *b == b'\n').unwrap_or(rest.len());
        let reason = String::from_utf8_lossy(&rest[..end]).trim().to_string();
        Some((Self { reason }, &rest[end..]))
    }
}

// =========================================================================
// Tests
// =========================================================================
