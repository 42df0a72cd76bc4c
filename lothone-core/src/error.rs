//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Status class reported to the HTTP layer together with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Caller-correctable input problem
    BadInput,
    /// Lookup key absent
    NotFound,
    /// Duplicate key rejected
    Conflict,
    /// Operation not available for the protocol family
    Unsupported,
    /// Storage or external backend failure
    Internal,
}

/// Core layer error type
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Malformed input, rejected before any side effect
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Lookup key absent from the collection
    #[error("Account not found in {protocol} collection: {key}")]
    NotFound { protocol: String, key: String },

    /// Collection file does not exist
    #[error("Collection file missing: {path}")]
    CollectionMissing { path: String },

    /// Collection file could not be read or written
    #[error("Storage error on {path}: {detail}")]
    StorageIo { path: String, detail: String },

    /// Collection file exists but cannot be decoded
    #[error("Corrupt collection {path}: {detail}")]
    CorruptCollection { path: String, detail: String },

    /// Collection could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Duplicate key on create (only when duplicate rejection is enabled)
    #[error("Account already exists in {protocol} collection: {key}")]
    Conflict { protocol: String, key: String },

    /// External backend or supervisor call failed
    #[error("External service error: {service} - {detail}")]
    ExternalService { service: String, detail: String },

    /// Operation is not defined for this protocol family
    #[error("{operation} is not supported for {protocol} accounts")]
    UnsupportedProtocol { protocol: String, operation: String },
}

impl CoreError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether it is expected behavior (user input, missing key, unsupported
    /// protocol). Used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Conflict { .. }
            | Self::UnsupportedProtocol { .. } => true,
            Self::CollectionMissing { .. }
            | Self::StorageIo { .. }
            | Self::CorruptCollection { .. }
            | Self::Serialization(_)
            | Self::ExternalService { .. } => false,
        }
    }

    /// Status class for the HTTP layer.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation { .. } => ErrorClass::BadInput,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Conflict { .. } => ErrorClass::Conflict,
            Self::UnsupportedProtocol { .. } => ErrorClass::Unsupported,
            _ => ErrorClass::Internal,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_expected_bad_input() {
        let err = CoreError::validation("deviceId", "not a UUID");
        assert!(err.is_expected());
        assert_eq!(err.class(), ErrorClass::BadInput);
        assert_eq!(err.to_string(), "Invalid deviceId: not a UUID");
    }

    #[test]
    fn storage_errors_are_internal() {
        let err = CoreError::CorruptCollection {
            path: "/etc/v2ray/users.json".to_string(),
            detail: "expected value".to_string(),
        };
        assert!(!err.is_expected());
        assert_eq!(err.class(), ErrorClass::Internal);
    }

    #[test]
    fn serializes_with_code_tag() {
        let err = CoreError::NotFound {
            protocol: "vmess".to_string(),
            key: "abc".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NotFound");
        assert_eq!(json["details"]["key"], "abc");
    }
}
