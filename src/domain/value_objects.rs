//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

/// API token credentials for one cluster.
///
/// The secret never leaves this type in readable form: `Debug` redacts it,
/// and there is deliberately no `Display`/serde support. Callers that need
/// to build an authorization header go through [`Credentials::header_value`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token_id: String,
    token_secret: String,
}

impl Credentials {
    /// Create credentials from a token id (`user@realm!tokenname`) and secret.
    ///
    /// Returns `None` when the token id is not in the expected form.
    pub fn new(token_id: impl Into<String>, token_secret: impl Into<String>) -> Option<Self> {
        let token_id = token_id.into();
        let (user, token_name) = token_id.split_once('!')?;
        if !user.contains('@') || token_name.is_empty() {
            return None;
        }
        Some(Self {
            token_id,
            token_secret: token_secret.into(),
        })
    }

    /// The full token id (`user@realm!tokenname`). Safe to log.
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    /// The `user@realm` part of the token id.
    pub fn user(&self) -> &str {
        // new() guarantees the separator is present
        self.token_id.split('!').next().unwrap_or(&self.token_id)
    }

    /// Value for the `Authorization` header of the cluster API.
    pub fn header_value(&self) -> String {
        format!("PVEAPIToken={}={}", self.token_id, self.token_secret)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token_id", &self.token_id)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}
