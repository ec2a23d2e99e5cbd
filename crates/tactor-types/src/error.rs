//! Error types for the tactor dispatch layer.

use std::io;

use crate::catalog;

/// Why an invocation was rejected before reaching the driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// The command name or code is not registered.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    /// The command exists but its arguments are missing or malformed.
    #[error("{command}: {message}")]
    BadArguments {
        command: &'static str,
        message: String,
    },
    /// The first input was neither a command string nor an 8-bit code.
    #[error("First argument must be a command string or uint8.")]
    InvalidToken,
}

/// Errors produced by the tactor dispatch layer.
#[derive(Debug, thiserror::Error)]
pub enum TactorError {
    /// Malformed invocation. `help` holds the usage text shown with it.
    #[error("{kind}")]
    Usage { kind: UsageError, help: String },

    /// The driver returned a negative result.
    #[error("{function} failed with error code: {code} ({description})")]
    Driver {
        function: &'static str,
        code: i32,
        description: &'static str,
    },

    /// `connect` while a device is already bound to the session.
    #[error("already connected to device {device_id}; close current connection first")]
    AlreadyConnected { device_id: i32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl TactorError {
    /// Build a driver error, resolving the description from the catalog.
    pub fn driver(function: &'static str, code: i32) -> Self {
        Self::Driver {
            function,
            code,
            description: catalog::describe(code),
        }
    }

    /// Build a usage error paired with its help text.
    pub fn usage(kind: UsageError, help: impl Into<String>) -> Self {
        Self::Usage {
            kind,
            help: help.into(),
        }
    }

    /// Identifier the host environment reports alongside the message.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Usage {
                kind: UsageError::UnknownCommand(_),
                ..
            } => "TDK:UnknownCommand",
            Self::Usage { .. } => "TDK:InputError",
            Self::Driver { .. } => "TDK:Error",
            Self::AlreadyConnected { .. } => "TDK:StateError",
            Self::Config(_) | Self::Io(_) | Self::TomlParse(_) => "TDK:ConfigError",
        }
    }

    /// Usage text attached to the error, if any.
    pub fn help(&self) -> Option<&str> {
        match self {
            Self::Usage { help, .. } => Some(help),
            _ => None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TactorError>;
