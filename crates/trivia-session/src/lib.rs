//! Session layer for the trivia wire client.
//!
//! A [`Session`] owns one connection to the game server. It:
//!
//! 1. **Handshakes**: sends `HELO` with a fresh client ID and the shared
//!    credential, and waits a bounded time for the welcome frame.
//! 2. **Runs lock-step exchanges**: one request out, one response in, with
//!    a second `send` refused until the response has been read.
//! 3. **Classifies failures**: transport and framing errors kill the
//!    session, a malformed body or a server error line does not.
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatch loop (above)      ← drives one exchange per user selection
//!     ↕
//! Session (this crate)       ← handshake, lock-step, error classification
//!     ↕
//! Protocol + Transport       ← frames and the WebSocket
//! ```

mod error;
mod identity;
mod session;

pub use error::SessionError;
pub use identity::SessionIdentity;
pub use session::{Session, SessionConfig, SessionState};
