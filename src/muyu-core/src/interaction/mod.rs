// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Interaction orchestrator components.
//!
//! The machine owns the phase and its clock, the sampler feeds it per-frame
//! verdicts while sensing, observers get notified about what it does, and
//! the policies carry its fixed timing.

pub mod events;
pub mod machine;
pub mod policies;
pub mod profile;
pub mod sampler;

pub use events::{InteractionObserver, ObserverRegistry};
pub use machine::{
    EventSource, InteractionMachine, InteractionStats, Phase, PhaseClock, TickOutcome,
};
pub use policies::PhaseTimings;
pub use profile::{AuxEffects, EffectProfile};
pub use sampler::{ExpressionSampler, NoFaceSampler, ScriptedSampler};
