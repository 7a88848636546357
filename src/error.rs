//! Error taxonomy for command dispatch and pipeline stages.
//!
//! Components report failures with `anyhow`; the manager maps each failure to the
//! stage it happened in so the dispatcher can decide what is fatal to a command.
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmatchError {
    #[error("{message}")]
    Usage { message: String },

    #[error("configuration {locator}: {cause:#}")]
    Configuration {
        locator: String,
        cause: anyhow::Error,
    },

    #[error("capability unavailable: {message}")]
    CapabilityUnavailable { message: String },

    #[error("load {locator}: {cause:#}")]
    Load {
        locator: String,
        cause: anyhow::Error,
    },

    #[error("offline preprocessing: {cause:#}")]
    Processing { cause: anyhow::Error },

    #[error("online matching: {cause:#}")]
    Matching { cause: anyhow::Error },

    #[error("mapping filter: {cause:#}")]
    Filter { cause: anyhow::Error },

    #[error("render {locator}: {cause:#}")]
    Render {
        locator: String,
        cause: anyhow::Error,
    },

    #[error("wordnet cache: {cause:#}")]
    Cache { cause: anyhow::Error },
}

/// Coarse classification used for logging and exit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Configuration,
    CapabilityUnavailable,
    Load,
    Processing,
    Matching,
    Filter,
    Render,
    Cache,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Usage => "usage",
            ErrorKind::Configuration => "configuration",
            ErrorKind::CapabilityUnavailable => "capability_unavailable",
            ErrorKind::Load => "load",
            ErrorKind::Processing => "processing",
            ErrorKind::Matching => "matching",
            ErrorKind::Filter => "filter",
            ErrorKind::Render => "render",
            ErrorKind::Cache => "cache",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SmatchError {
    pub fn usage(message: impl Into<String>) -> Self {
        SmatchError::Usage {
            message: message.into(),
        }
    }

    pub fn configuration(locator: impl fmt::Display, cause: anyhow::Error) -> Self {
        SmatchError::Configuration {
            locator: locator.to_string(),
            cause,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        SmatchError::CapabilityUnavailable {
            message: message.into(),
        }
    }

    pub fn load(locator: &Path, cause: anyhow::Error) -> Self {
        SmatchError::Load {
            locator: locator.display().to_string(),
            cause,
        }
    }

    pub fn render(locator: &Path, cause: anyhow::Error) -> Self {
        SmatchError::Render {
            locator: locator.display().to_string(),
            cause,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SmatchError::Usage { .. } => ErrorKind::Usage,
            SmatchError::Configuration { .. } => ErrorKind::Configuration,
            SmatchError::CapabilityUnavailable { .. } => ErrorKind::CapabilityUnavailable,
            SmatchError::Load { .. } => ErrorKind::Load,
            SmatchError::Processing { .. } => ErrorKind::Processing,
            SmatchError::Matching { .. } => ErrorKind::Matching,
            SmatchError::Filter { .. } => ErrorKind::Filter,
            SmatchError::Render { .. } => ErrorKind::Render,
            SmatchError::Cache { .. } => ErrorKind::Cache,
        }
    }
}
