// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Observer notifications for the interaction machine.
//!
//! Observers see what the machine does without being able to change it:
//! the phase and its clock stay owned by the machine.

use std::sync::Arc;

use uuid::Uuid;

use crate::device::DeviceCommand;
use crate::expression::Decision;

use super::machine::Phase;

/// Trait for components that want to follow the interaction cycle.
///
/// All methods have default no-op implementations.
pub trait InteractionObserver: Send + Sync {
    /// Called after every phase transition. `cycle` identifies the strike
    /// that started the current cycle.
    fn on_phase_change(&self, _old: Phase, _new: Phase, _cycle: Option<Uuid>) {}

    /// Called when a sensing window has been reduced to a decision.
    fn on_decision(&self, _decision: &Decision, _cycle: Option<Uuid>) {}

    /// Called for every command the machine emits, before it is sent.
    fn on_command(&self, _command: &DeviceCommand) {}

    /// Called when a strike arrives outside Idle and is dropped.
    fn on_strike_debounced(&self, _phase: Phase) {}
}

/// Registered observers and the fan-out to them.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn InteractionObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn InteractionObserver>) {
        self.observers.push(observer);
    }

    pub fn notify_phase_change(&self, old: Phase, new: Phase, cycle: Option<Uuid>) {
        for observer in &self.observers {
            observer.on_phase_change(old, new, cycle);
        }
    }

    pub fn notify_decision(&self, decision: &Decision, cycle: Option<Uuid>) {
        for observer in &self.observers {
            observer.on_decision(decision, cycle);
        }
    }

    pub fn notify_command(&self, command: &DeviceCommand) {
        for observer in &self.observers {
            observer.on_command(command);
        }
    }

    pub fn notify_strike_debounced(&self, phase: Phase) {
        for observer in &self.observers {
            observer.on_strike_debounced(phase);
        }
    }
}
