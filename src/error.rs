//! Error types for the console library.

use thiserror::Error;

/// Failure raised by a script engine while running user or bootstrap code.
///
/// Carries only the interpreter's human-readable message; that message is what
/// ends up in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScriptError {
    pub message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced to the host while configuring or starting a console.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("appear_speed must be a positive number, got {value}")]
    Speed { value: f32 },

    #[error("invalid theme colour `{value}`: {reason}")]
    Color { value: String, reason: String },

    #[error("bootstrap script failed: {0}")]
    Bootstrap(#[source] ScriptError),
}
