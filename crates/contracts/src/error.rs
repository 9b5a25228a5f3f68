//! Layered error definitions
//!
//! Categorized by source: config / source / io

use thiserror::Error;

/// Unified configuration-level error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error raised by a `DataSource` implementation
///
/// The variant decides how a worker reacts: configuration and
/// initialization failures only end that worker, device failures while
/// running raise the shared cancellation flag.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Missing or invalid source parameter
    #[error("invalid configuration for source '{label}': {message}")]
    Config { label: String, message: String },

    /// Device or resource unavailable
    #[error("failed to initialize source '{label}': {message}")]
    Init { label: String, message: String },

    /// Failure while polling the device
    #[error("device error on source '{label}': {message}")]
    Device { label: String, message: String },
}

impl SourceError {
    /// Create configuration error
    pub fn config(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Create initialization error
    pub fn init(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Init {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Create device (runtime) error
    pub fn device(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Device {
            label: label.into(),
            message: message.into(),
        }
    }
}
