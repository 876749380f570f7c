use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::api::LoginResponse;
use crate::capabilities::{KeyNamespace, KvError, KvOperation, KvResult, TypedKvStore};

/// Stored as `session:auth`.
pub const SESSION_KEY: &str = "auth";

/// The signed-in user. The token never appears in `Debug` output.
#[derive(Debug)]
pub struct Session {
    token: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
}

impl Session {
    #[must_use]
    pub fn from_login(response: LoginResponse) -> Self {
        Self {
            token: SecretString::new(response.token),
            first_name: response.first_name,
            last_name: response.last_name,
            admin: response.admin,
        }
    }

    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    fn to_record(&self) -> LoginResponse {
        LoginResponse {
            token: self.token.expose_secret().clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            admin: self.admin,
        }
    }
}

#[derive(Debug, Default)]
pub enum SessionState {
    /// Waiting for the stored record on startup.
    #[default]
    Restoring,
    SignedOut,
    SigningIn,
    SignedIn(Session),
}

impl SessionState {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.session().map(Session::token)
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

fn store() -> TypedKvStore<LoginResponse> {
    TypedKvStore::new(KeyNamespace::Session)
}

pub fn load_operation() -> Result<KvOperation, KvError> {
    store().get_op(SESSION_KEY)
}

pub fn save_operation(session: &Session) -> Result<KvOperation, KvError> {
    store().set_op(SESSION_KEY, &session.to_record())
}

pub fn clear_operation() -> Result<KvOperation, KvError> {
    store().delete_op(SESSION_KEY)
}

/// Reads a stored session. Missing, corrupt or token-less records all mean signed out.
#[must_use]
pub fn restore(result: KvResult) -> Option<Session> {
    let parsed = result.and_then(|output| store().parse_value(output));
    match parsed {
        Ok(Some(record)) if !record.token.trim().is_empty() => Some(Session::from_login(record)),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "discarding unreadable stored session");
            None
        }
    }
}
