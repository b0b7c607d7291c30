//! Error Types for the Bitwarden App Extension
//!
//! Input classification never fails loudly; these errors cover the edges of a
//! session (settings, configuration, host hand-off) and the one user-visible
//! condition, a missing login in the main app.

use thiserror::Error;

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, ExtensionError>;

/// Main error type for the extension
#[derive(Error, Debug)]
pub enum ExtensionError {
    // ===== Session Errors =====
    /// The user is not logged in to the main app
    #[error("You must log into the main Bitwarden app before you can use the extension")]
    MustLogIn,

    /// The session already completed its request and released its services
    #[error("Extension session already completed")]
    SessionCompleted,

    /// An attachment payload could not be loaded
    #[error("Failed to load attachment payload for {0}")]
    PayloadLoadFailed(String),

    /// The host rejected the completed request
    #[error("Host completion failed: {0}")]
    HostCompletionFailed(String),

    // ===== Settings / Configuration Errors =====
    /// Shared settings store failure
    #[error("Settings error: {0}")]
    SettingsError(String),

    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request file for the binary was malformed
    #[error("Invalid extension request: {0}")]
    InvalidRequest(String),

    // ===== I/O Errors =====
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
