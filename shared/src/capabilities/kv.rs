use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KvKey {
    namespace: KeyNamespace,
    key: String,
}

impl KvKey {
    pub fn new(namespace: KeyNamespace, key: impl Into<String>) -> Result<Self, KvError> {
        let key = key.into();
        Self::validate_key(&key)?;
        Ok(Self { namespace, key })
    }

    pub fn raw(&self) -> String {
        format!("{}:{}", self.namespace.prefix(), self.key)
    }

    pub fn namespace(&self) -> KeyNamespace {
        self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn validate_key(key: &str) -> Result<(), KvError> {
        if key.trim().is_empty() {
            return Err(KvError::InvalidKey {
                key: key.to_string(),
                reason: "key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(KvError::InvalidKey {
                key: key.chars().take(50).collect::<String>() + "...",
                reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
            });
        }

        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(KvError::InvalidKey {
                key: key.to_string(),
                reason: "key cannot contain path traversal sequences".to_string(),
            });
        }

        if key.chars().any(|c| c.is_control()) {
            return Err(KvError::InvalidKey {
                key: key.escape_default().to_string(),
                reason: "key contains invalid control characters".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyNamespace {
    Session,
}

impl KeyNamespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyNamespace::Session => "session",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOperation {
    Get { key: KvKey },
    Set { key: KvKey, value: Vec<u8> },
    Delete { key: KvKey },
}

impl KvOperation {
    pub fn get(namespace: KeyNamespace, key: impl Into<String>) -> Result<Self, KvError> {
        Ok(Self::Get {
            key: KvKey::new(namespace, key)?,
        })
    }

    pub fn set(
        namespace: KeyNamespace,
        key: impl Into<String>,
        value: Vec<u8>,
    ) -> Result<Self, KvError> {
        if value.len() > MAX_VALUE_SIZE {
            return Err(KvError::ValueTooLarge {
                size: value.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        Ok(Self::Set {
            key: KvKey::new(namespace, key)?,
            value,
        })
    }

    pub fn delete(namespace: KeyNamespace, key: impl Into<String>) -> Result<Self, KvError> {
        Ok(Self::Delete {
            key: KvKey::new(namespace, key)?,
        })
    }

    pub fn key(&self) -> &KvKey {
        match self {
            KvOperation::Get { key } | KvOperation::Set { key, .. } | KvOperation::Delete { key } => {
                key
            }
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message} (code: {code:?})")]
    Storage {
        code: StorageErrorCode,
        message: String,
    },

    #[error("serialization error: {message}")]
    Serialization { message: String, key: Option<String> },
}

impl KvError {
    pub fn storage(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageErrorCode {
    Unknown,
    Corrupted,
    PermissionDenied,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOutput {
    Value(Option<Vec<u8>>),
    Written,
    Deleted { existed: bool },
}

pub type KvResult = Result<KvOutput, KvError>;

/// Serializes one record type as JSON under a fixed namespace.
pub struct TypedKvStore<T> {
    namespace: KeyNamespace,
    _phantom: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> TypedKvStore<T> {
    pub fn new(namespace: KeyNamespace) -> Self {
        Self {
            namespace,
            _phantom: PhantomData,
        }
    }

    pub fn get_op(&self, key: impl Into<String>) -> Result<KvOperation, KvError> {
        KvOperation::get(self.namespace, key)
    }

    pub fn set_op(&self, key: impl Into<String>, value: &T) -> Result<KvOperation, KvError> {
        let key = key.into();
        let data = serde_json::to_vec(value).map_err(|e| KvError::Serialization {
            message: e.to_string(),
            key: Some(key.clone()),
        })?;
        KvOperation::set(self.namespace, key, data)
    }

    pub fn delete_op(&self, key: impl Into<String>) -> Result<KvOperation, KvError> {
        KvOperation::delete(self.namespace, key)
    }

    pub fn parse_value(&self, output: KvOutput) -> Result<Option<T>, KvError> {
        match output {
            KvOutput::Value(Some(bytes)) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| KvError::Serialization {
                    message: e.to_string(),
                    key: None,
                }),
            KvOutput::Value(None) => Ok(None),
            _ => Err(KvError::storage(
                StorageErrorCode::Unknown,
                "unexpected output type",
            )),
        }
    }
}
