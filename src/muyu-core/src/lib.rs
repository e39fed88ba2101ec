// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod device;
pub mod expression;
pub mod interaction;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use device::{DeviceCommand, EmotionEffect, HardwareEvent, RandomParams};
pub use expression::{decide, Classification, Decision, DecisionSource};
pub use interaction::{
    AuxEffects, EffectProfile, EventSource, ExpressionSampler, InteractionMachine,
    InteractionObserver, InteractionStats, NoFaceSampler, Phase, PhaseTimings, ScriptedSampler,
    TickOutcome,
};
