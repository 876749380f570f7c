#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod app;
pub mod cache;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod form;
pub mod model;
pub mod notifications;
pub mod session;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect, HttpReply, KvReply};
pub use crux_core::App as CruxApp;
pub use config::ApiConfig;
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

/// Digits required before a phone number counts as complete.
pub const MIN_PHONE_DIGITS: usize = 10;
/// Digits required before a citizen lookup is attempted.
pub const MIN_PHONE_LOOKUP_DIGITS: usize = 7;
pub const POSTAL_CODE_LENGTH: usize = 5;
pub const LOOKUP_CACHE_CAPACITY: usize = 256;
pub const LOOKUP_CACHE_TTL_MS: u64 = 5 * 60 * 1000;
/// Status assigned to every newly created pothole.
pub const STATUS_REPORTED: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    Server,
    Storage,
    Serialization,
    Deserialization,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Server => "SERVER_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Conflict | Self::Server | Self::Storage => {
                ErrorSeverity::Transient
            }

            Self::Serialization | Self::Deserialization | Self::Internal | Self::InvalidState => {
                ErrorSeverity::Fatal
            }

            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::Server | Self::Storage | Self::Conflict
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    /// Message from a structured backend error payload, shown verbatim.
    pub server_message: Option<String>,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            server_message: None,
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        if let Some(server_message) = &self.server_message {
            return server_message.clone();
        }

        match self.kind {
            ErrorKind::Network => {
                "Unable to reach the server. Please check your connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Authorization => "You don't have permission to perform this action.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Conflict => {
                "This action conflicts with a recent change. Please refresh and try again.".into()
            }
            ErrorKind::Storage => "Unable to access local storage.".into(),
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::InvalidState => "This action is not available right now.".into(),
            ErrorKind::Server | ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }

    /// Maps a non-2xx response, keeping the backend's `message` when the body carries one.
    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };

        let server_message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(|e| e.message)
            .filter(|m| !m.trim().is_empty());

        let mut error = Self::new(kind, format!("HTTP error: {status}"))
            .with_context("http_status", status.to_string());
        error.server_message = server_message;
        error
    }

    /// Raw description for the secondary error-detail view.
    #[must_use]
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(server) = &self.server_message {
            write!(f, ": {server}")?;
        }
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<capabilities::HttpError> for AppError {
    fn from(e: capabilities::HttpError) -> Self {
        use capabilities::HttpError;

        let kind = match &e {
            HttpError::ConnectionError { .. } => ErrorKind::Network,
            HttpError::InvalidResponse { .. } => ErrorKind::Deserialization,
            HttpError::SerializationError { .. } => ErrorKind::Serialization,
            _ => ErrorKind::Internal,
        };
        AppError::new(kind, "request failed").with_internal(e.to_string())
    }
}

impl From<capabilities::KvError> for AppError {
    fn from(e: capabilities::KvError) -> Self {
        AppError::new(ErrorKind::Storage, "storage operation failed").with_internal(e.to_string())
    }
}

impl From<form::FormError> for AppError {
    fn from(e: form::FormError) -> Self {
        AppError::new(ErrorKind::InvalidState, e.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

pub type AppResult<T> = Result<T, AppError>;

macro_rules! numeric_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl $name {
                #[must_use]
                pub const fn new(id: u64) -> Self {
                    Self(id)
                }

                #[must_use]
                pub const fn get(self) -> u64 {
                    self.0
                }
            }

            impl From<u64> for $name {
                fn from(id: u64) -> Self {
                    Self(id)
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

numeric_id!(
    StateId,
    MunicipalityId,
    LocalityId,
    StreetId,
    CategoryId,
    LocationId,
    CitizenId,
    PotholeId,
);

/// Identifies one open pothole dialog; replies for a closed dialog are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DialogId(pub uuid::Uuid);

impl DialogId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keeps ASCII digits only.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Display form of a stored phone number: trailing zeros trimmed, then a
/// `+52`/`+1` country prefix split off when present.
#[must_use]
pub fn format_phone_number(phone: &str) -> String {
    let trimmed = phone.trim().trim_end_matches('0');

    if let Some(rest) = trimmed.strip_prefix("52") {
        return format!("+52 {rest}");
    }

    if let Some(rest) = trimmed.strip_prefix('1') {
        return format!("+1 {rest}");
    }

    format!("+{trimmed}")
}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
