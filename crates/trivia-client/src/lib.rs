//! # Trivia client
//!
//! Client side of the trivia game's WebSocket protocol.
//!
//! This crate ties the layers together: it loads [`ClientConfig`], opens a
//! [`Session`](trivia_session::Session) and runs the dispatch loop that turns
//! user selections into lock-step exchanges. Front-ends implement
//! [`CommandSource`] and [`ResponseSink`]; everything below them is shared.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trivia_client::prelude::*;
//!
//! // Implement CommandSource and ResponseSink for your front-end, then:
//! // let config = ClientConfig::from_env(Overrides::default())?;
//! // let session = connect(&config).await?;
//! // let summary = run(session, &mut source, &mut sink).await?;
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod dispatch;
mod error;

pub use config::{ClientConfig, ConfigError, Overrides, DEFAULT_ENDPOINT};
pub use dispatch::{
    connect, run, CommandSource, DispatchSummary, ResponseSink, Selection,
};
pub use error::ClientError;

pub use trivia_protocol as protocol;
pub use trivia_session as session;
pub use trivia_transport as transport;

/// Everything a front-end needs in one import.
pub mod prelude {
    pub use crate::{
        connect, run, ClientConfig, ClientError, CommandSource, DispatchSummary,
        Overrides, ResponseSink, Selection,
    };
    pub use trivia_protocol::{CommandKind, Envelope, Fields, ProtocolError};
    pub use trivia_session::{Session, SessionConfig, SessionError};
}
