// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Facial-expression classifications and the vote that turns one sensing
//! window of per-frame verdicts into a single decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Expression read from a single camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Happy,
    Sad,
    #[serde(alias = "surprise")]
    Surprised,
}

impl Classification {
    pub const ALL: [Classification; 3] = [Self::Happy, Self::Sad, Self::Surprised];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprised => "surprised",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "sad" => Ok(Self::Sad),
            "surprised" | "surprise" => Ok(Self::Surprised),
            other => Err(format!(
                "unknown expression '{}' (expected one of: happy, sad, surprised)",
                other
            )),
        }
    }
}

/// How a [`Decision`] was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// At least one frame produced a classification.
    Majority,
    /// No frame produced a classification.
    Fallback,
}

/// Outcome of one sensing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub classification: Classification,
    pub source: DecisionSource,
    /// Frames that voted for the winning classification.
    pub votes: usize,
    /// Frames sampled in the window, including empty ones.
    pub frames: usize,
}

impl Decision {
    pub fn is_fallback(&self) -> bool {
        self.source == DecisionSource::Fallback
    }
}

/// Pick the most frequent classification among `samples`.
///
/// Counts keep first-occurrence order, and a later value only wins with a
/// strictly higher count, so ties go to whichever value showed up first.
/// A window with no classifications at all yields `fallback`.
pub fn decide(samples: &[Option<Classification>], fallback: Classification) -> Decision {
    let mut tally: Vec<(Classification, usize)> = Vec::with_capacity(Classification::ALL.len());
    for sample in samples.iter().flatten() {
        match tally.iter_mut().find(|(c, _)| c == sample) {
            Some((_, count)) => *count += 1,
            None => tally.push((*sample, 1)),
        }
    }

    let mut best: Option<(Classification, usize)> = None;
    for &(classification, count) in &tally {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((classification, count));
        }
    }

    match best {
        Some((classification, votes)) => Decision {
            classification,
            source: DecisionSource::Majority,
            votes,
            frames: samples.len(),
        },
        None => Decision {
            classification: fallback,
            source: DecisionSource::Fallback,
            votes: 0,
            frames: samples.len(),
        },
    }
}
