// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Control loop driving the interaction machine and writing its commands.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use muyu_core::{
    Decision, DeviceCommand, HardwareEvent, InteractionMachine, InteractionObserver, Phase,
};
use muyu_protocol::encode;
use muyu_transport::{LineSink, WRITE_TIMEOUT};

/// Diagnostic that makes the board report a simulated strike.
pub const SELF_TEST_COMMAND: &str = "WOODFISH_TEST";

/// Changes to the link the control loop writes to.
pub enum LinkUpdate {
    /// Use this sink from now on, closing any previous one.
    Attach(Box<dyn LineSink>),
    /// Close the current sink and acknowledge once it is released.
    Detach(oneshot::Sender<()>),
}

pub struct InteractionTaskConfig {
    /// Control-loop period
    pub tick: Duration,
    /// Interval of progress messages during a performance
    pub progress_every: Duration,
    pub self_test_on_start: bool,
    pub stop_all_on_shutdown: bool,
}

/// Owns the sending half of the current link, if any.
struct CommandWriter {
    sink: Option<Box<dyn LineSink>>,
}

impl CommandWriter {
    fn new() -> Self {
        Self { sink: None }
    }

    async fn attach(&mut self, sink: Box<dyn LineSink>) {
        self.detach().await;
        info!("Device link attached");
        self.sink = Some(sink);
    }

    async fn detach(&mut self) {
        if let Some(mut old) = self.sink.take() {
            match tokio::time::timeout(WRITE_TIMEOUT, old.close()).await {
                Ok(Ok(())) => debug!("Device link released"),
                Ok(Err(e)) => debug!("Closing device link: {}", e),
                Err(_) => debug!("Closing device link timed out"),
            }
        }
    }

    /// Encode and send one command. Failures are logged, never returned.
    ///
    /// Any failed write gives up on the link: a partial line may be on the
    /// wire and further writes would only stall the loop.
    async fn send(&mut self, command: &DeviceCommand) {
        let line = encode(command);
        let Some(sink) = self.sink.as_mut() else {
            debug!("No device link, dropping '{}'", line.trim_end());
            return;
        };
        info!("Sending command: {}", line.trim_end());
        if let Err(e) = sink.send_line(&line).await {
            error!("Failed to send '{}': {}", line.trim_end(), e);
            warn!("Dropping device link; commands are discarded until it is reopened");
            self.detach().await;
        }
    }

    async fn send_all(&mut self, commands: &[DeviceCommand]) {
        for command in commands {
            self.send(command).await;
        }
    }

    fn is_attached(&self) -> bool {
        self.sink.is_some()
    }
}

/// Logs the orchestrator's activity.
pub struct TracingObserver;

impl InteractionObserver for TracingObserver {
    fn on_phase_change(&self, old: Phase, new: Phase, cycle: Option<Uuid>) {
        match cycle {
            Some(id) => info!("[{}] {} -> {}", id, old, new),
            None => info!("{} -> {}", old, new),
        }
    }

    fn on_decision(&self, decision: &Decision, cycle: Option<Uuid>) {
        let cycle = cycle.map(|id| id.to_string()).unwrap_or_default();
        if decision.is_fallback() {
            info!(
                "[{}] No expression recognized in {} frames, falling back to {}",
                cycle, decision.frames, decision.classification
            );
        } else {
            info!(
                "[{}] Expression: {} ({} of {} frames)",
                cycle, decision.classification, decision.votes, decision.frames
            );
        }
    }

    fn on_strike_debounced(&self, phase: Phase) {
        debug!("Strike ignored while {}", phase);
    }
}

/// Run the control loop until shutdown.
///
/// Every tick feeds the queued events to the machine and writes the commands
/// it returns. Link changes arrive on `link_rx`.
pub async fn run_interaction_task(
    mut machine: InteractionMachine,
    config: InteractionTaskConfig,
    mut events_rx: mpsc::Receiver<HardwareEvent>,
    mut link_rx: mpsc::Receiver<LinkUpdate>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut writer = CommandWriter::new();
    let mut ticker = interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_progress = Instant::now();
    let mut links_open = true;

    let timings = *machine.timings();
    info!(
        "Interaction loop started (sensing {:?}, acting {:?}, cooling {:?}, cycle {:?}, tick {:?})",
        timings.sensing,
        timings.acting,
        timings.cooling,
        timings.cycle_length(),
        config.tick
    );

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now().into_std();
                let outcome = machine.tick(now, &mut events_rx);
                writer.send_all(&outcome.commands).await;

                if outcome.transition.is_some() {
                    last_progress = Instant::now();
                }
                if machine.phase() == Phase::Acting
                    && last_progress.elapsed() >= config.progress_every
                {
                    last_progress = Instant::now();
                    if let Some(left) = machine.remaining(now) {
                        debug!("Performance running, {:.1}s left", left.as_secs_f32());
                    }
                }
            }
            update = link_rx.recv(), if links_open => {
                match update {
                    Some(LinkUpdate::Attach(sink)) => {
                        writer.attach(sink).await;
                        if config.self_test_on_start {
                            info!("Requesting self-test strike");
                            writer
                                .send(&DeviceCommand::RunDiagnostic(SELF_TEST_COMMAND.to_string()))
                                .await;
                        }
                    }
                    Some(LinkUpdate::Detach(ack)) => {
                        writer.detach().await;
                        let _ = ack.send(());
                    }
                    None => links_open = false,
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    if config.stop_all_on_shutdown && writer.is_attached() {
        info!("Switching all effects off");
        let stop_all = machine.stop_all_commands().to_vec();
        writer.send_all(&stop_all).await;
    }
    writer.detach().await;

    let stats = machine.stats();
    info!(
        "Interaction loop stopped in {} after {} transitions ({} cycles started, {} completed, {} strikes ignored, {} other device lines, {} fallback decisions)",
        machine.phase(),
        machine.transition_count(),
        stats.cycles_started,
        stats.cycles_completed,
        stats.debounced_strikes,
        stats.ignored_events,
        stats.fallback_decisions
    );
}
