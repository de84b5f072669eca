//! The command catalog: every request the client can send.
//!
//! A [`Command`] is a closed, validated description of "what the user asked
//! for". It knows its tag and how to lay out its body, and nothing about
//! sockets. Commands are built either through the typed constructors
//! ([`GameRequest::new`], [`Gameplay::buzz`], …) or from loosely typed text
//! input with [`Command::from_fields`], which is what a menu or a script
//! hands over.
//!
//! Every constructor validates before anything is encoded, and
//! [`Command::encode`] validates again, so an invalid command can't reach
//! the wire.
//!
//! # Body layout
//!
//! | Tag | Body |
//! |---|---|
//! | `HELO` | `clientId`, `key` |
//! | `GAME_REQ` | `action` (`CREATE`/`JOIN`/`LEAVE`), `gameId` unless `CREATE` |
//! | `GAMEPLAY` | `req`, `gameId`, plus per-`req` fields |
//! | `BEGIN_GAME` | `gameId`, `questionCount` |
//! | `NEXT_ROUND` | `gameId` |

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::{codec, tags, Envelope, ProtocolError, Tag};

// ---------------------------------------------------------------------------
// GameId
// ---------------------------------------------------------------------------

/// Identifier of a game on the server. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// Validates `id` (surrounding whitespace is dropped).
    pub fn new(id: &str) -> Result<Self, ProtocolError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ProtocolError::validation("gameId", "must not be empty"));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// The `HELO` body: who the client is and the shared credential.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    client_id: String,
    key: String,
}

impl Handshake {
    pub fn new(client_id: &str, key: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            client_id: required("clientId", client_id)?,
            key: required("key", key)?,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// The credential is secret material; keep it out of logs.
impl fmt::Debug for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("client_id", &self.client_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// GameRequest
// ---------------------------------------------------------------------------

/// Game lifecycle requests (`GAME_REQ`).
///
/// `#[serde(tag = "action")]` puts the variant name into the body next to
/// the fields: `Join { game_id }` becomes
/// `{"action":"JOIN","gameId":"…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "action",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum GameRequest {
    /// Host a new game.
    Create,
    /// Join an existing game.
    Join { game_id: GameId },
    /// Leave a game.
    Leave { game_id: GameId },
}

impl GameRequest {
    /// Builds a request from an action and an optional game id.
    ///
    /// # Errors
    /// [`ProtocolError::Validation`] on `gameId` when `JOIN`/`LEAVE` come
    /// without one.
    pub fn new(
        action: GameRequestKind,
        game_id: Option<&str>,
    ) -> Result<Self, ProtocolError> {
        let require_id = || {
            let id = game_id.ok_or_else(|| {
                ProtocolError::validation(
                    "gameId",
                    format!("required for {}", action.as_str()),
                )
            })?;
            GameId::new(id)
        };
        Ok(match action {
            GameRequestKind::Create => Self::Create,
            GameRequestKind::Join => Self::Join { game_id: require_id()? },
            GameRequestKind::Leave => Self::Leave { game_id: require_id()? },
        })
    }

    pub fn kind(&self) -> GameRequestKind {
        match self {
            Self::Create => GameRequestKind::Create,
            Self::Join { .. } => GameRequestKind::Join,
            Self::Leave { .. } => GameRequestKind::Leave,
        }
    }
}

/// The `action` of a [`GameRequest`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameRequestKind {
    Create,
    Join,
    Leave,
}

impl GameRequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Join => "JOIN",
            Self::Leave => "LEAVE",
        }
    }
}

// ---------------------------------------------------------------------------
// Gameplay
// ---------------------------------------------------------------------------

/// In-game actions (`GAMEPLAY`).
///
/// `expired` and `answer_index` are text on the wire even though they read
/// like a flag and a number. The server expects them that way.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "req",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Gameplay {
    QuestionSelect {
        game_id: GameId,
        category: String,
        point_value: u32,
    },
    Buzz {
        game_id: GameId,
        delay: u32,
        expired: String,
    },
    Answer {
        game_id: GameId,
        answer_index: String,
    },
    WheelSpin {
        game_id: GameId,
        spin_value: f64,
    },
}

impl Gameplay {
    pub fn question_select(
        game_id: &str,
        category: &str,
        point_value: u32,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::QuestionSelect {
            game_id: GameId::new(game_id)?,
            category: required("category", category)?,
            point_value,
        })
    }

    pub fn buzz(
        game_id: &str,
        delay: u32,
        expired: &str,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::Buzz {
            game_id: GameId::new(game_id)?,
            delay,
            expired: required("expired", expired)?,
        })
    }

    pub fn answer(game_id: &str, answer_index: &str) -> Result<Self, ProtocolError> {
        Ok(Self::Answer {
            game_id: GameId::new(game_id)?,
            answer_index: required("answerIndex", answer_index)?,
        })
    }

    pub fn wheel_spin(game_id: &str, spin_value: f64) -> Result<Self, ProtocolError> {
        check_finite("spinValue", spin_value)?;
        Ok(Self::WheelSpin {
            game_id: GameId::new(game_id)?,
            spin_value,
        })
    }

    pub fn kind(&self) -> GameplayKind {
        match self {
            Self::QuestionSelect { .. } => GameplayKind::QuestionSelect,
            Self::Buzz { .. } => GameplayKind::Buzz,
            Self::Answer { .. } => GameplayKind::Answer,
            Self::WheelSpin { .. } => GameplayKind::WheelSpin,
        }
    }

    pub fn game_id(&self) -> &GameId {
        match self {
            Self::QuestionSelect { game_id, .. }
            | Self::Buzz { game_id, .. }
            | Self::Answer { game_id, .. }
            | Self::WheelSpin { game_id, .. } => game_id,
        }
    }

    /// Re-checks the fields a caller could have set directly on the enum.
    fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::QuestionSelect { category, .. } => {
                required("category", category).map(drop)
            }
            Self::Buzz { expired, .. } => required("expired", expired).map(drop),
            Self::Answer { answer_index, .. } => {
                required("answerIndex", answer_index).map(drop)
            }
            Self::WheelSpin { spin_value, .. } => {
                check_finite("spinValue", *spin_value)
            }
        }
    }
}

/// The `req` of a [`Gameplay`] action, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameplayKind {
    QuestionSelect,
    Buzz,
    Answer,
    WheelSpin,
}

impl GameplayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuestionSelect => "QUESTION_SELECT",
            Self::Buzz => "BUZZ",
            Self::Answer => "ANSWER",
            Self::WheelSpin => "WHEEL_SPIN",
        }
    }
}

// ---------------------------------------------------------------------------
// Round control
// ---------------------------------------------------------------------------

/// `BEGIN_GAME`: the host starts a game with a number of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginGame {
    pub game_id: GameId,
    pub question_count: u8,
}

impl BeginGame {
    pub fn new(game_id: &str, question_count: u8) -> Result<Self, ProtocolError> {
        let begin = Self {
            game_id: GameId::new(game_id)?,
            question_count,
        };
        begin.validate()?;
        Ok(begin)
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.question_count == 0 {
            return Err(ProtocolError::validation(
                "questionCount",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// `NEXT_ROUND`: move a game on to its next round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRound {
    pub game_id: GameId,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Everything the client can send.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Handshake(Handshake),
    GameRequest(GameRequest),
    Gameplay(Gameplay),
    BeginGame(BeginGame),
    NextRound(NextRound),
}

impl Command {
    /// The tag this command travels under.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Handshake(_) => tags::HELO,
            Self::GameRequest(_) => tags::GAME_REQ,
            Self::Gameplay(_) => tags::GAMEPLAY,
            Self::BeginGame(_) => tags::BEGIN_GAME,
            Self::NextRound(_) => tags::NEXT_ROUND,
        }
    }

    /// Checks the invariants the typed constructors establish.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::Gameplay(action) => action.validate(),
            Self::BeginGame(begin) => begin.validate(),
            Self::Handshake(_) | Self::GameRequest(_) | Self::NextRound(_) => {
                Ok(())
            }
        }
    }

    /// Validates and encodes this command into one wire frame.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        self.validate()?;
        match self {
            Self::Handshake(body) => codec::encode(self.tag(), body),
            Self::GameRequest(body) => codec::encode(self.tag(), body),
            Self::Gameplay(body) => codec::encode(self.tag(), body),
            Self::BeginGame(body) => codec::encode(self.tag(), body),
            Self::NextRound(body) => codec::encode(self.tag(), body),
        }
    }

    /// Validates this command and returns it as an [`Envelope`].
    pub fn to_envelope(&self) -> Result<Envelope, ProtocolError> {
        self.validate()?;
        let payload = match self {
            Self::Handshake(body) => serde_json::to_value(body),
            Self::GameRequest(body) => serde_json::to_value(body),
            Self::Gameplay(body) => serde_json::to_value(body),
            Self::BeginGame(body) => serde_json::to_value(body),
            Self::NextRound(body) => serde_json::to_value(body),
        }
        .map_err(ProtocolError::Encode)?;
        Ok(Envelope::new(Tag::new(self.tag())?, payload))
    }

    /// Builds a command from text fields keyed by their wire names.
    ///
    /// Each numeric field is parsed here, so a typo in `pointValue` is
    /// reported as a validation error on `pointValue` rather than as
    /// something the server chokes on.
    ///
    /// ```rust
    /// use trivia_protocol::{Command, CommandKind, Fields};
    ///
    /// let fields = Fields::new()
    ///     .with("gameId", "g1")
    ///     .with("category", "Science")
    ///     .with("pointValue", "200");
    /// let cmd = Command::from_fields(CommandKind::SelectQuestion, &fields).unwrap();
    /// assert_eq!(cmd.tag(), "GAMEPLAY");
    ///
    /// let err = Command::from_fields(CommandKind::Join, &Fields::new()).unwrap_err();
    /// assert_eq!(err.field(), Some("gameId"));
    /// ```
    pub fn from_fields(
        kind: CommandKind,
        fields: &Fields,
    ) -> Result<Self, ProtocolError> {
        Ok(match kind {
            CommandKind::Create => Self::GameRequest(GameRequest::Create),
            CommandKind::Join => Self::GameRequest(GameRequest::new(
                GameRequestKind::Join,
                fields.get("gameId"),
            )?),
            CommandKind::Leave => Self::GameRequest(GameRequest::new(
                GameRequestKind::Leave,
                fields.get("gameId"),
            )?),
            CommandKind::SpinWheel => Self::Gameplay(Gameplay::wheel_spin(
                fields.require("gameId")?,
                fields.parse("spinValue")?,
            )?),
            CommandKind::SelectQuestion => {
                Self::Gameplay(Gameplay::question_select(
                    fields.require("gameId")?,
                    fields.require("category")?,
                    fields.parse("pointValue")?,
                )?)
            }
            CommandKind::Buzz => Self::Gameplay(Gameplay::buzz(
                fields.require("gameId")?,
                fields.parse("delay")?,
                fields.require("expired")?,
            )?),
            CommandKind::Answer => Self::Gameplay(Gameplay::answer(
                fields.require("gameId")?,
                fields.require("answerIndex")?,
            )?),
            CommandKind::BeginGame => Self::BeginGame(BeginGame::new(
                fields.require("gameId")?,
                fields.parse("questionCount")?,
            )?),
            CommandKind::NextRound => Self::NextRound(NextRound {
                game_id: GameId::new(fields.require("gameId")?)?,
            }),
        })
    }
}

impl From<GameRequest> for Command {
    fn from(req: GameRequest) -> Self {
        Self::GameRequest(req)
    }
}

impl From<Gameplay> for Command {
    fn from(action: Gameplay) -> Self {
        Self::Gameplay(action)
    }
}

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// The user-selectable commands, without their data.
///
/// The handshake is not here: the session sends it, never the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Create,
    Join,
    Leave,
    SpinWheel,
    SelectQuestion,
    Buzz,
    Answer,
    BeginGame,
    NextRound,
}

impl CommandKind {
    /// Every selectable command, in menu order.
    pub const ALL: [CommandKind; 9] = [
        Self::Create,
        Self::Join,
        Self::Leave,
        Self::SpinWheel,
        Self::SelectQuestion,
        Self::Buzz,
        Self::Answer,
        Self::BeginGame,
        Self::NextRound,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "create game",
            Self::Join => "join game",
            Self::Leave => "leave game",
            Self::SpinWheel => "spin wheel (gameplay)",
            Self::SelectQuestion => "select question (gameplay)",
            Self::Buzz => "buzz (gameplay)",
            Self::Answer => "answer question (gameplay)",
            Self::BeginGame => "begin game",
            Self::NextRound => "next round",
        }
    }

    /// Wire names of the fields [`Command::from_fields`] needs for this
    /// command, in prompt order.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Create => &[],
            Self::Join | Self::Leave | Self::NextRound => &["gameId"],
            Self::SpinWheel => &["gameId", "spinValue"],
            Self::SelectQuestion => &["gameId", "category", "pointValue"],
            Self::Buzz => &["gameId", "delay", "expired"],
            Self::Answer => &["gameId", "answerIndex"],
            Self::BeginGame => &["gameId", "questionCount"],
        }
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Loosely typed command input: field name → text as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(BTreeMap<String, String>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the field, or a validation error naming it.
    pub fn require(&self, name: &'static str) -> Result<&str, ProtocolError> {
        self.get(name)
            .ok_or_else(|| ProtocolError::validation(name, "missing"))
    }

    /// Parses the field, or returns a validation error naming it.
    pub fn parse<T>(&self, name: &'static str) -> Result<T, ProtocolError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.require(name)?.trim();
        raw.parse().map_err(|e: T::Err| {
            ProtocolError::validation(name, format!("{raw:?}: {e}"))
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ProtocolError> {
    if value.trim().is_empty() {
        return Err(ProtocolError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ProtocolError> {
    if !value.is_finite() {
        return Err(ProtocolError::validation(field, "must be a finite number"));
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
