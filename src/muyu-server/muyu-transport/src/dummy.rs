// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! In-process stand-in for the controller board.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tracing::{debug, warn};

use muyu_core::{DeviceCommand, EmotionEffect};
use muyu_protocol::parse_command;

use crate::framing::{LineReader, LineWriter};
use crate::Link;

const PIPE_CAPACITY: usize = 4096;
const GREETING: &str = "INFO: dummy wooden fish ready\n";
const STRIKE_REPLY: &str = "木鱼被敲击\n";

/// Effect state of the simulated board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyDeviceState {
    pub effect: EmotionEffect,
    pub light: bool,
    pub motor_pwm: u8,
    pub motor_on: bool,
    pub fog: bool,
    pub random: bool,
}

impl Default for DummyDeviceState {
    fn default() -> Self {
        Self {
            effect: EmotionEffect::Off,
            light: false,
            motor_pwm: 0,
            motor_on: false,
            fog: false,
            random: false,
        }
    }
}

impl DummyDeviceState {
    /// Apply one received line and return the board's reply, if any.
    ///
    /// `WOODFISH_TEST` and `TEST_HIT` simulate a strike, as on the real board.
    pub fn apply(&mut self, line: &str) -> Option<&'static str> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("Dummy device rejected '{}': {}", line.trim(), e);
                return None;
            }
        };
        match command {
            DeviceCommand::SetEffect(effect) => self.effect = effect,
            DeviceCommand::SetLight(on) => self.light = on,
            DeviceCommand::SetMotor { pwm, on } => {
                self.motor_pwm = pwm;
                self.motor_on = on;
            }
            DeviceCommand::SetFog(on) => self.fog = on,
            DeviceCommand::SetRandom { enabled, .. } => self.random = enabled,
            DeviceCommand::RunDiagnostic(name) => {
                if name == "WOODFISH_TEST" || name == "TEST_HIT" {
                    return Some(STRIKE_REPLY);
                }
                warn!("Dummy device: unknown command '{}'", name);
            }
        }
        None
    }

    /// True when every channel is off.
    pub fn is_quiet(&self) -> bool {
        self.effect == EmotionEffect::Off
            && !self.light
            && !self.motor_on
            && !self.fog
            && !self.random
    }
}

/// Start a simulated board and return the host side of the link.
pub(crate) fn open() -> Link {
    let (host, device) = tokio::io::duplex(PIPE_CAPACITY);
    tokio::spawn(run_device(device));
    let (reader, writer) = tokio::io::split(host);
    Link::new("dummy device", LineReader::new(reader), LineWriter::new(writer))
}

async fn run_device(stream: DuplexStream) {
    let (reader, mut writer) = tokio::io::split(stream);
    if writer.write_all(GREETING.as_bytes()).await.is_err() {
        return;
    }

    let mut state = DummyDeviceState::default();
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(reply) = state.apply(&line) {
            if writer.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }
        debug!("Dummy device state: {:?}", state);
    }
    debug!("Dummy device stopped");
}
