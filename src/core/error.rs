//! Error taxonomy for startup and dispatch failures.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for startup code.
pub type Result<T> = std::result::Result<T, SentinelError>;

/// Startup and configuration failures.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// A required device capability (network stack, GPIO line) is missing.
    #[error("[PS-1001] module failure in {module}: {details}")]
    ModuleFailure {
        module: &'static str,
        details: String,
    },

    #[error("[PS-2001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PS-2002] configuration parse failure in {path}: {details}")]
    ConfigParse { path: PathBuf, details: String },

    #[error("[PS-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SentinelError {
    /// Stable machine-parseable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ModuleFailure { .. } => "PS-1001",
            Self::InvalidConfig { .. } => "PS-2001",
            Self::ConfigParse { .. } => "PS-2002",
            Self::Io { .. } => "PS-3001",
        }
    }

    /// Module failures halt the device; there is nothing to retry.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ModuleFailure { .. })
    }

    pub fn module(module: &'static str, details: impl Into<String>) -> Self {
        Self::ModuleFailure {
            module,
            details: details.into(),
        }
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// The transport could not deliver the request to the remote end.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("stream I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// The remote end answered, but not with an acceptable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid status line: {line:?}")]
    InvalidStatusLine { line: String },

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("header block not terminated within {limit} bytes")]
    MalformedHeaders { limit: usize },

    #[error("health body is not a JSON object: {details}")]
    BadBody { details: String },
}

impl ProtocolError {
    /// A bad health body still counts as a delivered request.
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::BadBody { .. })
    }
}

/// Classified failure of a single dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl DispatchError {
    /// Whether the remote end received the request despite the error.
    pub const fn is_delivered(&self) -> bool {
        match self {
            Self::Transport(_) => false,
            Self::Protocol(err) => err.is_soft(),
        }
    }
}
