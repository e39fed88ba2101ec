// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Interaction state machine.
//!
//! One strike starts a cycle: a time-boxed sensing window, a performance
//! chosen from what was sensed, a cooldown that switches everything off, and
//! back to idle. The machine is driven by [`InteractionMachine::tick`] with an
//! explicit `now`, so nothing in here sleeps or reads the wall clock on its
//! own, and it is the only thing that ever changes the phase.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::device::{DeviceCommand, HardwareEvent};
use crate::expression::{decide, Classification, Decision};

use super::events::{InteractionObserver, ObserverRegistry};
use super::policies::PhaseTimings;
use super::profile::EffectProfile;
use super::sampler::ExpressionSampler;

/// Stage of the interaction cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Idle,
    Sensing,
    Acting,
    Cooling,
}

impl Phase {
    /// Phase that follows this one in a cycle.
    pub fn next(self) -> Phase {
        match self {
            Self::Idle => Self::Sensing,
            Self::Sensing => Self::Acting,
            Self::Acting => Self::Cooling,
            Self::Cooling => Self::Idle,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Sensing => write!(f, "Sensing"),
            Self::Acting => write!(f, "Acting"),
            Self::Cooling => write!(f, "Cooling"),
        }
    }
}

/// Entry timestamp of the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseClock {
    entered_at: Instant,
}

impl PhaseClock {
    pub fn start(now: Instant) -> Self {
        Self { entered_at: now }
    }

    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }
}

/// Queue of decoded hardware events, consumed without blocking.
pub trait EventSource {
    /// Next queued event, or `None` when the queue is currently empty.
    fn next_event(&mut self) -> Option<HardwareEvent>;
}

impl EventSource for VecDeque<HardwareEvent> {
    fn next_event(&mut self) -> Option<HardwareEvent> {
        self.pop_front()
    }
}

impl EventSource for mpsc::Receiver<HardwareEvent> {
    fn next_event(&mut self) -> Option<HardwareEvent> {
        self.try_recv().ok()
    }
}

/// Counters kept across cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionStats {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub debounced_strikes: u64,
    pub fallback_decisions: u64,
    pub ignored_events: u64,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// `(old, new)` when the phase changed.
    pub transition: Option<(Phase, Phase)>,
    /// Decision reached at the end of sensing.
    pub decision: Option<Decision>,
    /// Commands to send, in order.
    pub commands: Vec<DeviceCommand>,
}

/// The interaction orchestrator.
pub struct InteractionMachine {
    phase: Phase,
    clock: PhaseClock,
    timings: PhaseTimings,
    profile: EffectProfile,
    fallback: Classification,
    sampler: Box<dyn ExpressionSampler>,
    samples: Vec<Option<Classification>>,
    last_sample_at: Option<Instant>,
    stop_all: Vec<DeviceCommand>,
    cycle: Option<Uuid>,
    observers: ObserverRegistry,
    stats: InteractionStats,
    transition_count: u64,
}

impl InteractionMachine {
    /// Create a machine in Idle with the default (empty) effect profile and
    /// a `Happy` fallback.
    pub fn new(timings: PhaseTimings, sampler: Box<dyn ExpressionSampler>) -> Self {
        let profile = EffectProfile::default();
        Self {
            phase: Phase::Idle,
            clock: PhaseClock::start(Instant::now()),
            timings,
            stop_all: profile.stop_all_commands(),
            profile,
            fallback: Classification::Happy,
            sampler,
            samples: Vec::new(),
            last_sample_at: None,
            cycle: None,
            observers: ObserverRegistry::new(),
            stats: InteractionStats::default(),
            transition_count: 0,
        }
    }

    pub fn with_profile(mut self, profile: EffectProfile) -> Self {
        self.stop_all = profile.stop_all_commands();
        self.profile = profile;
        self
    }

    pub fn with_fallback(mut self, fallback: Classification) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clock(&self) -> PhaseClock {
        self.clock
    }

    pub fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    pub fn stats(&self) -> InteractionStats {
        self.stats
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Identifier of the cycle in progress, `None` while idle.
    pub fn cycle_id(&self) -> Option<Uuid> {
        self.cycle
    }

    /// Commands sent on every cooldown entry.
    pub fn stop_all_commands(&self) -> &[DeviceCommand] {
        &self.stop_all
    }

    /// Time left in the active phase, `None` while idle.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.timings
            .duration(self.phase)
            .map(|d| d.saturating_sub(self.clock.elapsed(now)))
    }

    pub fn register_observer(&mut self, observer: Arc<dyn InteractionObserver>) {
        self.observers.register(observer);
    }

    /// Advance the machine by one control-loop tick.
    ///
    /// Idle consumes events until the first strike. Every other phase drains
    /// the queue and drops strikes, then checks its timeout. At most one
    /// transition happens per tick.
    pub fn tick<E: EventSource + ?Sized>(&mut self, now: Instant, events: &mut E) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if self.phase == Phase::Idle {
            while let Some(event) = events.next_event() {
                match event {
                    HardwareEvent::StrikeDetected => {
                        self.transition(self.phase.next(), now, &mut outcome);
                        break;
                    }
                    HardwareEvent::Unrecognized(raw) => {
                        trace!("Ignoring device line: {}", raw);
                        self.stats.ignored_events += 1;
                    }
                }
            }
            return outcome;
        }

        self.drain_debounced(events);
        let elapsed = self.clock.elapsed(now);

        match self.phase {
            Phase::Sensing => {
                let timed_out = elapsed >= self.timings.sensing;
                if !timed_out && !self.sampler.finished() && self.frame_due(now) {
                    let verdict = self.sampler.sample();
                    trace!("Frame verdict: {:?}", verdict);
                    self.samples.push(verdict);
                    self.last_sample_at = Some(now);
                }
                if timed_out || self.sampler.finished() {
                    if !timed_out {
                        debug!("Sampler finished after {} frames", self.samples.len());
                    }
                    let decision = decide(&self.samples, self.fallback);
                    self.samples.clear();
                    if decision.is_fallback() {
                        self.stats.fallback_decisions += 1;
                    }
                    self.observers.notify_decision(&decision, self.cycle);
                    outcome.decision = Some(decision);
                    self.transition(self.phase.next(), now, &mut outcome);
                }
            }
            Phase::Acting => {
                if elapsed >= self.timings.acting {
                    self.transition(self.phase.next(), now, &mut outcome);
                }
            }
            Phase::Cooling => {
                if elapsed >= self.timings.cooling {
                    self.transition(self.phase.next(), now, &mut outcome);
                }
            }
            Phase::Idle => {}
        }

        outcome
    }

    fn drain_debounced<E: EventSource + ?Sized>(&mut self, events: &mut E) {
        while let Some(event) = events.next_event() {
            if event.is_strike() {
                self.stats.debounced_strikes += 1;
                self.observers.notify_strike_debounced(self.phase);
            } else {
                self.stats.ignored_events += 1;
            }
        }
    }

    fn frame_due(&self, now: Instant) -> bool {
        self.last_sample_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.timings.frame_interval)
    }

    fn transition(&mut self, next: Phase, now: Instant, outcome: &mut TickOutcome) {
        let old = self.phase;
        match next {
            Phase::Sensing => {
                self.cycle = Some(Uuid::new_v4());
                self.samples.clear();
                self.last_sample_at = None;
                self.sampler.begin_window();
                self.stats.cycles_started += 1;
            }
            Phase::Acting => {
                if let Some(decision) = outcome.decision {
                    outcome
                        .commands
                        .extend(self.profile.performance_commands(decision.classification));
                }
            }
            Phase::Cooling => {
                outcome.commands.extend(self.stop_all.iter().cloned());
            }
            Phase::Idle => {
                self.stats.cycles_completed += 1;
            }
        }

        self.phase = next;
        self.clock = PhaseClock::start(now);
        self.transition_count += 1;
        outcome.transition = Some((old, next));

        let cycle = if next == Phase::Idle {
            self.cycle.take()
        } else {
            self.cycle
        };
        self.observers.notify_phase_change(old, next, cycle);
        for command in &outcome.commands {
            self.observers.notify_command(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::EmotionEffect;
    use crate::interaction::profile::AuxEffects;
    use crate::interaction::sampler::{NoFaceSampler, ScriptedSampler};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn timings() -> PhaseTimings {
        PhaseTimings {
            sensing: Duration::from_secs(3),
            acting: Duration::from_secs(10),
            cooling: Duration::from_secs(2),
            tick: ms(100),
            frame_interval: ms(30),
        }
    }

    fn strike() -> VecDeque<HardwareEvent> {
        VecDeque::from(vec![HardwareEvent::StrikeDetected])
    }

    /// Returns the given verdicts, then `None` forever. Never finishes, so
    /// only the sensing timeout ends the window.
    struct EndlessSampler {
        verdicts: VecDeque<Option<Classification>>,
        calls: Arc<AtomicUsize>,
    }

    impl ExpressionSampler for EndlessSampler {
        fn sample(&mut self) -> Option<Classification> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.verdicts.pop_front().flatten()
        }
    }

    fn endless(verdicts: Vec<Option<Classification>>) -> (Box<EndlessSampler>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let sampler = EndlessSampler {
            verdicts: verdicts.into(),
            calls: calls.clone(),
        };
        (Box::new(sampler), calls)
    }

    /// Runs ticks every 100 ms from `from` up to and including `until`.
    fn run_until(
        m: &mut InteractionMachine,
        from: Instant,
        until: Instant,
        queue: &mut VecDeque<HardwareEvent>,
    ) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        let mut now = from;
        while now <= until {
            outcomes.push(m.tick(now, queue));
            now += ms(100);
        }
        outcomes
    }

    #[test]
    fn test_phase_order_wraps_to_idle() {
        let mut phase = Phase::Idle;
        let mut seen = Vec::new();
        for _ in 0..4 {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![Phase::Sensing, Phase::Acting, Phase::Cooling, Phase::Idle]
        );
    }

    #[test]
    fn test_initial_phase_is_idle() {
        let m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.cycle_id(), None);
        assert_eq!(m.transition_count(), 0);
    }

    #[test]
    fn test_idle_stays_idle_without_strike() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let t0 = Instant::now();
        let mut queue = VecDeque::from(vec![HardwareEvent::Unrecognized("INFO: ready".into())]);
        let out = m.tick(t0 + Duration::from_secs(60), &mut queue);
        assert_eq!(out, TickOutcome::default());
        assert_eq!(m.phase(), Phase::Idle);
        assert!(queue.is_empty());
        assert_eq!(m.stats().ignored_events, 1);
    }

    #[test]
    fn test_strike_in_idle_starts_sensing_with_fresh_clock() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let now = Instant::now() + ms(500);
        let out = m.tick(now, &mut strike());
        assert_eq!(out.transition, Some((Phase::Idle, Phase::Sensing)));
        assert!(out.commands.is_empty());
        assert_eq!(m.phase(), Phase::Sensing);
        assert_eq!(m.clock().entered_at(), now);
        assert!(m.cycle_id().is_some());
    }

    #[test]
    fn test_scripted_window_ends_early_with_majority() {
        let sampler = ScriptedSampler::new(vec![
            Some(Classification::Happy),
            None,
            Some(Classification::Happy),
            Some(Classification::Surprised),
        ]);
        let mut m = InteractionMachine::new(timings(), Box::new(sampler));
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);

        for n in 1..=3 {
            let out = m.tick(t0 + ms(100 * n), &mut queue);
            assert_eq!(out.transition, None);
        }
        let out = m.tick(t0 + ms(400), &mut queue);
        assert_eq!(out.transition, Some((Phase::Sensing, Phase::Acting)));
        let decision = out.decision.expect("decision");
        assert_eq!(decision.classification, Classification::Happy);
        assert_eq!(decision.votes, 2);
        assert_eq!(decision.frames, 4);
        assert_eq!(
            out.commands,
            vec![
                DeviceCommand::SetEffect(EmotionEffect::Happy),
                DeviceCommand::SetLight(true),
            ]
        );
    }

    #[test]
    fn test_sensing_times_out_after_fixed_duration() {
        let (sampler, calls) = endless(vec![
            Some(Classification::Happy),
            None,
            Some(Classification::Happy),
            Some(Classification::Surprised),
        ]);
        let mut m = InteractionMachine::new(timings(), sampler);
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);

        let outcomes = run_until(&mut m, t0 + ms(100), t0 + ms(2900), &mut queue);
        assert!(outcomes.iter().all(|o| o.transition.is_none()));
        assert_eq!(m.phase(), Phase::Sensing);
        assert_eq!(calls.load(Ordering::Relaxed), 29);

        let out = m.tick(t0 + Duration::from_secs(3), &mut queue);
        assert_eq!(out.transition, Some((Phase::Sensing, Phase::Acting)));
        assert_eq!(
            out.decision.map(|d| d.classification),
            Some(Classification::Happy)
        );
        assert_eq!(calls.load(Ordering::Relaxed), 29);
    }

    #[test]
    fn test_empty_window_falls_back() {
        let sampler = ScriptedSampler::new(vec![None, None]);
        let mut m = InteractionMachine::new(timings(), Box::new(sampler));
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);
        m.tick(t0 + ms(100), &mut queue);
        let out = m.tick(t0 + ms(200), &mut queue);

        let decision = out.decision.expect("decision");
        assert!(decision.is_fallback());
        assert_eq!(decision.classification, Classification::Happy);
        assert_eq!(
            out.commands,
            vec![
                DeviceCommand::SetEffect(EmotionEffect::Happy),
                DeviceCommand::SetLight(true),
            ]
        );
        assert_eq!(m.stats().fallback_decisions, 1);
    }

    #[test]
    fn test_configured_fallback_is_used() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler))
            .with_fallback(Classification::Sad);
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);
        let out = m.tick(t0 + Duration::from_secs(3), &mut queue);
        assert_eq!(
            out.commands.first(),
            Some(&DeviceCommand::SetEffect(EmotionEffect::Sad))
        );
    }

    #[test]
    fn test_frames_are_paced() {
        let (sampler, calls) = endless(Vec::new());
        let mut m = InteractionMachine::new(timings(), sampler);
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);

        m.tick(t0 + ms(100), &mut queue);
        m.tick(t0 + ms(110), &mut queue);
        m.tick(t0 + ms(120), &mut queue);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        m.tick(t0 + ms(130), &mut queue);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_full_cycle_emits_stop_all_once_and_returns_to_idle() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);
        let acting_at = t0 + Duration::from_secs(3);
        m.tick(acting_at, &mut queue);
        assert_eq!(m.phase(), Phase::Acting);

        let outcomes = run_until(&mut m, acting_at + ms(100), acting_at + ms(9900), &mut queue);
        assert!(outcomes.iter().all(|o| o.commands.is_empty()));

        let cooling_at = acting_at + Duration::from_secs(10);
        let out = m.tick(cooling_at, &mut queue);
        assert_eq!(out.transition, Some((Phase::Acting, Phase::Cooling)));
        assert_eq!(
            out.commands,
            vec![
                DeviceCommand::SetEffect(EmotionEffect::Off),
                DeviceCommand::SetLight(false),
                DeviceCommand::SetMotor { pwm: 0, on: false },
                DeviceCommand::SetFog(false),
            ]
        );

        let outcomes = run_until(&mut m, cooling_at + ms(100), cooling_at + ms(1900), &mut queue);
        assert!(outcomes.iter().all(|o| o.commands.is_empty()));
        assert_eq!(m.phase(), Phase::Cooling);

        let out = m.tick(cooling_at + Duration::from_secs(2), &mut queue);
        assert_eq!(out.transition, Some((Phase::Cooling, Phase::Idle)));
        assert!(out.commands.is_empty());
        assert_eq!(m.cycle_id(), None);
        assert_eq!(m.stats().cycles_completed, 1);
        assert_eq!(m.transition_count(), 4);
    }

    #[test]
    fn test_strikes_outside_idle_are_debounced() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);
        m.tick(t0 + Duration::from_secs(3), &mut queue);
        assert_eq!(m.phase(), Phase::Acting);
        let cycle = m.cycle_id();

        queue.push_back(HardwareEvent::StrikeDetected);
        queue.push_back(HardwareEvent::StrikeDetected);
        let out = m.tick(t0 + Duration::from_secs(4), &mut queue);
        assert_eq!(out.transition, None);
        assert_eq!(m.phase(), Phase::Acting);
        assert_eq!(m.cycle_id(), cycle);
        assert!(queue.is_empty());
        assert_eq!(m.stats().debounced_strikes, 2);

        // A strike during cooldown does not start a new cycle afterwards.
        m.tick(t0 + Duration::from_secs(13), &mut queue);
        queue.push_back(HardwareEvent::StrikeDetected);
        m.tick(t0 + Duration::from_secs(15), &mut queue);
        assert_eq!(m.phase(), Phase::Idle);
        let out = m.tick(t0 + Duration::from_secs(16), &mut queue);
        assert_eq!(out.transition, None);
        assert_eq!(m.stats().cycles_started, 1);
        assert_eq!(m.stats().debounced_strikes, 3);
    }

    #[test]
    fn test_strikes_queued_behind_the_first_are_dropped() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let t0 = Instant::now();
        let mut queue = VecDeque::from(vec![
            HardwareEvent::StrikeDetected,
            HardwareEvent::StrikeDetected,
        ]);
        m.tick(t0, &mut queue);
        assert_eq!(queue.len(), 1);
        m.tick(t0 + ms(100), &mut queue);
        assert!(queue.is_empty());
        assert_eq!(m.stats().debounced_strikes, 1);
    }

    #[test]
    fn test_one_transition_per_tick() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);

        let late = t0 + Duration::from_secs(60);
        assert_eq!(
            m.tick(late, &mut queue).transition,
            Some((Phase::Sensing, Phase::Acting))
        );
        assert_eq!(
            m.tick(late, &mut queue).transition,
            None,
            "clock resets on entry"
        );
    }

    #[test]
    fn test_next_cycle_starts_fresh() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);
        let first = m.cycle_id();
        m.tick(t0 + Duration::from_secs(3), &mut queue);
        m.tick(t0 + Duration::from_secs(13), &mut queue);
        m.tick(t0 + Duration::from_secs(15), &mut queue);
        assert_eq!(m.phase(), Phase::Idle);

        let restart = t0 + Duration::from_secs(20);
        queue.push_back(HardwareEvent::StrikeDetected);
        m.tick(restart, &mut queue);
        assert_eq!(m.phase(), Phase::Sensing);
        assert_eq!(m.clock().entered_at(), restart);
        assert_ne!(m.cycle_id(), first);
        assert_eq!(m.stats().cycles_started, 2);
    }

    #[test]
    fn test_stop_all_is_identical_every_cooldown() {
        let profile = EffectProfile {
            surprised: AuxEffects {
                random: Some(Default::default()),
                ..AuxEffects::default()
            },
            ..EffectProfile::default()
        };
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler)).with_profile(profile);
        let mut queue = VecDeque::new();
        let mut now = Instant::now();
        let mut stop_sets = Vec::new();

        for _ in 0..2 {
            queue.push_back(HardwareEvent::StrikeDetected);
            m.tick(now, &mut queue);
            now += Duration::from_secs(3);
            m.tick(now, &mut queue);
            now += Duration::from_secs(10);
            stop_sets.push(m.tick(now, &mut queue).commands);
            now += Duration::from_secs(2);
            m.tick(now, &mut queue);
        }
        assert_eq!(stop_sets[0], stop_sets[1]);
        assert_eq!(stop_sets[0].len(), 5);
        assert_eq!(stop_sets[0], m.stop_all_commands());
    }

    #[test]
    fn test_remaining_time() {
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let t0 = Instant::now();
        assert_eq!(m.remaining(t0), None);
        m.tick(t0, &mut strike());
        assert_eq!(m.remaining(t0 + ms(1000)), Some(ms(2000)));
        assert_eq!(m.remaining(t0 + ms(5000)), Some(Duration::ZERO));
    }

    #[test]
    fn test_mpsc_receiver_is_an_event_source() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.try_send(HardwareEvent::Unrecognized("noise".into()))
            .expect("send");
        tx.try_send(HardwareEvent::StrikeDetected).expect("send");

        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        let out = m.tick(Instant::now(), &mut rx);
        assert_eq!(out.transition, Some((Phase::Idle, Phase::Sensing)));
        assert!(rx.next_event().is_none());
    }

    #[test]
    fn test_observers_follow_the_cycle() {
        #[derive(Default)]
        struct Recorder {
            phases: Mutex<Vec<(Phase, Phase)>>,
            commands: AtomicUsize,
            decisions: AtomicUsize,
        }

        impl InteractionObserver for Recorder {
            fn on_phase_change(&self, old: Phase, new: Phase, cycle: Option<Uuid>) {
                assert!(cycle.is_some());
                self.phases.lock().expect("lock").push((old, new));
            }

            fn on_decision(&self, _decision: &Decision, _cycle: Option<Uuid>) {
                self.decisions.fetch_add(1, Ordering::Relaxed);
            }

            fn on_command(&self, _command: &DeviceCommand) {
                self.commands.fetch_add(1, Ordering::Relaxed);
            }
        }

        let recorder = Arc::new(Recorder::default());
        let mut m = InteractionMachine::new(timings(), Box::new(NoFaceSampler));
        m.register_observer(recorder.clone());

        let t0 = Instant::now();
        let mut queue = strike();
        m.tick(t0, &mut queue);
        m.tick(t0 + Duration::from_secs(3), &mut queue);
        m.tick(t0 + Duration::from_secs(13), &mut queue);
        m.tick(t0 + Duration::from_secs(15), &mut queue);

        let phases = recorder.phases.lock().expect("lock").clone();
        assert_eq!(
            phases,
            vec![
                (Phase::Idle, Phase::Sensing),
                (Phase::Sensing, Phase::Acting),
                (Phase::Acting, Phase::Cooling),
                (Phase::Cooling, Phase::Idle),
            ]
        );
        assert_eq!(recorder.decisions.load(Ordering::Relaxed), 1);
        assert_eq!(recorder.commands.load(Ordering::Relaxed), 6);
    }
}
