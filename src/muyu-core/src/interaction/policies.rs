// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fixed timing of the interaction cycle.

use std::time::Duration;

use super::machine::Phase;

/// Phase durations and loop cadence.
///
/// Every phase except Idle is bounded by its duration, measured from phase
/// entry. The tick interval must stay well below every phase duration so
/// phase boundaries are noticed promptly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub sensing: Duration,
    pub acting: Duration,
    pub cooling: Duration,
    /// Control-loop tick.
    pub tick: Duration,
    /// Minimum spacing between two sampler calls while sensing.
    pub frame_interval: Duration,
}

impl PhaseTimings {
    /// Timing used by the installation: 3 s sensing, 10 s performance,
    /// 2 s cooldown, 100 ms ticks, ~30 sampled frames per second.
    pub fn default_installation() -> Self {
        Self {
            sensing: Duration::from_secs(3),
            acting: Duration::from_secs(10),
            cooling: Duration::from_secs(2),
            tick: Duration::from_millis(100),
            frame_interval: Duration::from_millis(30),
        }
    }

    /// Timeout of `phase`, or `None` for Idle which has no timeout.
    pub fn duration(&self, phase: Phase) -> Option<Duration> {
        match phase {
            Phase::Idle => None,
            Phase::Sensing => Some(self.sensing),
            Phase::Acting => Some(self.acting),
            Phase::Cooling => Some(self.cooling),
        }
    }

    /// Length of one whole cycle from strike to return to Idle.
    pub fn cycle_length(&self) -> Duration {
        self.sensing + self.acting + self.cooling
    }
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self::default_installation()
    }
}
