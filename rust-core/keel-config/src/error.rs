// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration error types for Keel adapters.
//
// Every configuration problem is reported before a backend is constructed.
// Callers at startup treat any of these as fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating adapter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is missing or holds an unusable value.
    #[error("invalid configuration parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter (e.g. `URL`, `Address`).
        parameter: String,
        /// Human-readable reason the value was rejected.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected shape.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidParameter`].
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// The rejected parameter name, if this is a parameter error.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::InvalidParameter { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}
