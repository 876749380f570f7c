//! Provenance-tagged postal code.
//!
//! A code is either typed by the user or derived from the selected location.
//! Only a user-authored code may drive a forward lookup, and a derived code
//! is only ever written by a reverse lookup. Keeping the two apart is what
//! stops the forward and reverse lookups from re-triggering each other.

use serde::{Deserialize, Serialize};

use crate::{digits_only, POSTAL_CODE_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostalCodeSource {
    Manual,
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum PostalCode {
    UserAuthored(String),
    Derived(String),
}

impl Default for PostalCode {
    fn default() -> Self {
        PostalCode::UserAuthored(String::new())
    }
}

impl PostalCode {
    pub fn value(&self) -> &str {
        match self {
            PostalCode::UserAuthored(value) | PostalCode::Derived(value) => value,
        }
    }

    pub fn source(&self) -> PostalCodeSource {
        match self {
            PostalCode::UserAuthored(_) => PostalCodeSource::Manual,
            PostalCode::Derived(_) => PostalCodeSource::Location,
        }
    }

    pub fn is_user_authored(&self) -> bool {
        matches!(self, PostalCode::UserAuthored(_))
    }

    pub fn is_complete(&self) -> bool {
        self.value().len() == POSTAL_CODE_LENGTH
    }
}

/// Digits only, at most five of them.
pub fn normalize(raw: &str) -> String {
    digits_only(raw).chars().take(POSTAL_CODE_LENGTH).collect()
}

/// Renders a numeric code from the backend with its leading zeros.
pub fn render(code: u32) -> String {
    format!("{code:0width$}", width = POSTAL_CODE_LENGTH)
}

/// The postal code plus the forward lookup it may have in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostalCodeField {
    code: PostalCode,
    forward_in_flight: Option<String>,
}

impl PostalCodeField {
    pub fn from_derived(value: impl Into<String>) -> Self {
        Self {
            code: PostalCode::Derived(value.into()),
            forward_in_flight: None,
        }
    }

    pub fn code(&self) -> &PostalCode {
        &self.code
    }

    pub fn value(&self) -> &str {
        self.code.value()
    }

    pub fn source(&self) -> PostalCodeSource {
        self.code.source()
    }

    pub fn forward_in_flight(&self) -> Option<&str> {
        self.forward_in_flight.as_deref()
    }

    /// User input. Returns the code to look up forward once it is complete.
    pub fn type_in(&mut self, raw: &str) -> Option<String> {
        let value = normalize(raw);
        self.code = PostalCode::UserAuthored(value.clone());
        self.forward_in_flight = None;

        if self.code.is_complete() {
            self.forward_in_flight = Some(value.clone());
            Some(value)
        } else {
            None
        }
    }

    /// Back to an empty user-authored value.
    pub fn reset(&mut self) {
        self.code = PostalCode::default();
        self.forward_in_flight = None;
    }

    /// Whether a reverse lookup result may overwrite the current value.
    pub fn accepts_derived(&self) -> bool {
        !self.code.is_user_authored() || self.forward_in_flight.is_none()
    }

    /// Stores a reverse lookup result. Returns whether the field changed.
    pub fn derive(&mut self, value: String) -> bool {
        if !self.accepts_derived() {
            return false;
        }
        let next = PostalCode::Derived(value);
        if self.code == next {
            return false;
        }
        self.code = next;
        true
    }

    /// Whether a forward lookup result for `value` still matches the field.
    pub fn awaits_forward(&self, value: &str) -> bool {
        self.code.is_user_authored() && self.code.value() == value
    }

    pub fn settle_forward(&mut self, value: &str) {
        if self.forward_in_flight.as_deref() == Some(value) {
            self.forward_in_flight = None;
        }
    }

    /// A forward lookup matched: the typed value now describes the selected location.
    pub fn adopt(&mut self) {
        if let PostalCode::UserAuthored(value) = &self.code {
            self.code = PostalCode::Derived(value.clone());
        }
        self.forward_in_flight = None;
    }
}
