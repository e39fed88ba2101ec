// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::time::Duration;

use thiserror::Error;

/// Failure of the link to the device.
///
/// Never fatal to the interaction cycle: callers report it and carry on.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open {target}: {reason}")]
    Open { target: String, reason: String },

    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("link write timed out after {0:?}")]
    Timeout(Duration),

    #[error("link closed")]
    Closed,

    #[error("unsupported link: {0}")]
    Unsupported(String),
}

impl TransportError {
    pub fn open(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::Open {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the link is gone for good and needs reopening.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
