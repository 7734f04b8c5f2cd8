// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the splitting engine.

use thiserror::Error;

use crate::timing::Micros;

/// Errors reported by the splitting engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// An event or clock advance went backwards in time
    #[error("timestamp {at}us precedes engine time {now}us")]
    OutOfOrder { at: Micros, now: Micros },

    /// Engine configuration is unusable
    #[error("invalid split configuration: {0}")]
    InvalidConfig(String),

    /// Input arrived after the session was finished
    #[error("split session already finished")]
    Finished,
}

pub type SplitResult<T> = std::result::Result<T, SplitError>;
