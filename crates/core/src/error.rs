// Copyright 2025 benchtrail Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for benchmark history operations.

use thiserror::Error;

/// Errors produced while building or mutating benchmark history.
#[derive(Debug, Error)]
pub enum Error {
    /// A value supplied by the caller is not acceptable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A measurement failed validation.
    #[error("Invalid measurement '{name}': {reason}")]
    InvalidMeasurement {
        /// Test name of the offending measurement.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A run would break the increasing-date order of its suite.
    #[error("Run dated {date} is older than the last run of suite '{suite}' ({last_date})")]
    OutOfOrder {
        /// Suite the run was appended to.
        suite: String,
        /// Date of the rejected run (epoch milliseconds).
        date: i64,
        /// Date of the last run already in the suite (epoch milliseconds).
        last_date: i64,
    },

    /// The named suite does not exist in the document.
    #[error("Unknown benchmark suite: {0}")]
    UnknownSuite(String),

    /// A commit timestamp could not be parsed.
    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        /// Raw timestamp text.
        value: String,
        /// Parser error.
        #[source]
        source: chrono::ParseError,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Shorthand for [`Error::InvalidMeasurement`].
    pub fn invalid_measurement(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidMeasurement {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for benchmark history operations.
pub type Result<T> = std::result::Result<T, Error>;
