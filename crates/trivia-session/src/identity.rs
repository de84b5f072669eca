//! Who the client says it is during the handshake.

use std::fmt;

use trivia_protocol::{Command, Handshake, ProtocolError};

/// The client's identity for one session.
///
/// The client ID is a fresh UUID v4 per session. The credential is the
/// shared key the server checks on `HELO`; it comes from configuration and
/// never appears in `Debug` output.
#[derive(Clone)]
pub struct SessionIdentity {
    client_id: String,
    credential: String,
}

impl SessionIdentity {
    /// Creates an identity with a newly generated client ID.
    pub fn generate(credential: impl Into<String>) -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            credential: credential.into(),
        }
    }

    /// Creates an identity with a caller-chosen client ID.
    pub fn with_client_id(
        client_id: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            credential: credential.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Builds the `HELO` command for this identity.
    ///
    /// # Errors
    /// [`ProtocolError::Validation`] if the client ID or credential is blank.
    pub fn handshake(&self) -> Result<Command, ProtocolError> {
        Handshake::new(&self.client_id, &self.credential).map(Command::Handshake)
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("client_id", &self.client_id)
            .field("credential", &"<redacted>")
            .finish()
    }
}
