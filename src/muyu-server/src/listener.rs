// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Event listener: turns lines from the board into queued hardware events.

use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use muyu_core::HardwareEvent;
use muyu_protocol::decode;
use muyu_transport::{LineSource, TransportError};

/// Poll `source` until shutdown, the link fails, or the queue is gone.
///
/// Only strikes are forwarded; other device output is logged and dropped.
/// A full queue drops the new event rather than blocking the link.
pub async fn run_event_listener(
    mut source: Box<dyn LineSource>,
    events_tx: mpsc::Sender<HardwareEvent>,
    poll_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), TransportError> {
    info!("Event listener started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let received = tokio::select! {
            received = source.try_receive_line() => received,
            changed = shutdown_rx.changed() => {
                match changed {
                    Ok(()) if *shutdown_rx.borrow() => break,
                    Ok(()) => continue,
                    Err(_) => break,
                }
            }
        };

        let Some(line) = received? else {
            tokio::time::sleep(poll_interval).await;
            continue;
        };

        debug!("Device: {}", line);
        match decode(&line) {
            HardwareEvent::StrikeDetected => {
                info!("Strike detected");
                match events_tx.try_send(HardwareEvent::StrikeDetected) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!("Event queue full, dropping strike");
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!("Event queue closed, listener exiting");
                        break;
                    }
                }
            }
            HardwareEvent::Unrecognized(raw) => {
                debug!("Ignoring device output: {}", raw);
            }
        }
    }
    info!("Event listener stopped");
    Ok(())
}
