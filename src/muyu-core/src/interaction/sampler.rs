// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::expression::Classification;

/// Source of per-frame expression verdicts.
///
/// Only called while the machine is sensing. `sample` is synchronous and may
/// return `None` as often as it likes (no face, low confidence). The sensing
/// duration bounds the window; individual calls are never cancelled.
pub trait ExpressionSampler: Send {
    /// Classify the next frame.
    fn sample(&mut self) -> Option<Classification>;

    /// Called on entry to a new sensing window.
    fn begin_window(&mut self) {}

    /// True once the sampler has no more frames for this window, which ends
    /// sensing early.
    fn finished(&self) -> bool {
        false
    }
}

/// Sampler for installations without a camera. Every cycle ends on the
/// fallback decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceSampler;

impl ExpressionSampler for NoFaceSampler {
    fn sample(&mut self) -> Option<Classification> {
        None
    }
}

/// Replays a fixed list of verdicts once per sensing window.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    script: Vec<Option<Classification>>,
    pos: usize,
}

impl ScriptedSampler {
    pub fn new(script: Vec<Option<Classification>>) -> Self {
        Self { script, pos: 0 }
    }
}

impl ExpressionSampler for ScriptedSampler {
    fn sample(&mut self) -> Option<Classification> {
        let verdict = self.script.get(self.pos).copied().flatten();
        if self.pos < self.script.len() {
            self.pos += 1;
        }
        verdict
    }

    fn begin_window(&mut self) {
        self.pos = 0;
    }

    fn finished(&self) -> bool {
        self.pos >= self.script.len()
    }
}
