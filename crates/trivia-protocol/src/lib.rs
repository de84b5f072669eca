//! Wire protocol for the trivia game client.
//!
//! This crate defines the "language" the client and the game server speak:
//!
//! - **Types** ([`Tag`], [`Envelope`], [`InboundKind`]): the message
//!   structures that travel on the wire.
//! - **Codec** ([`encode`], [`decode`], [`decode_batch`]): how a tag and a
//!   JSON body become bytes and back.
//! - **Commands** ([`Command`], [`CommandKind`], [`Fields`]): the closed
//!   catalog of requests the client may send, validated before encoding.
//! - **Errors** ([`ProtocolError`], [`ErrorKind`]): what can go wrong.
//!
//! # Wire format
//!
//! ```text
//! bytes[0..32]  tag, ASCII, right-padded with spaces to exactly 32 bytes
//! bytes[32..]   JSON body, UTF-8, self-delimiting
//! ```
//!
//! The layer is pure: it never touches a socket.
//!
//! ```text
//! Command → encode → Session (bytes) … Session (bytes) → decode → Envelope
//! ```

mod codec;
mod command;
mod error;
mod types;

pub use codec::{decode, decode_batch, encode, Inbound, ServerNotice, NOTICE_PREFIX};
pub use command::{
    BeginGame, Command, CommandKind, Fields, GameId, GameRequest,
    GameRequestKind, Gameplay, GameplayKind, Handshake, NextRound,
};
pub use error::{ErrorKind, ProtocolError};
pub use types::{tags, Envelope, InboundKind, Tag, TAG_PAD, TAG_WIDTH};
