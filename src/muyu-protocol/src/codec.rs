// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Encoding of device commands and decoding of device lines.

use muyu_core::{DeviceCommand, EmotionEffect, HardwareEvent, RandomParams};

pub const LINE_TERMINATOR: char = '\n';

/// Lower-cased phrases that mark a strike. Firmware revisions have used
/// different wordings, all of them are accepted.
pub const STRIKE_MARKERS: &[&str] = &[
    "wooden_fish_hit",
    "woodfish_hit",
    "knock_detected",
    "木鱼被敲击",
    "敲击检测",
];

/// Encode a command as one protocol line, terminator included.
pub fn encode(command: &DeviceCommand) -> String {
    let mut line = match command {
        DeviceCommand::SetEffect(effect) => format!("EMOTION:{}", effect.code()),
        DeviceCommand::SetLight(on) => format!("LED:{}", flag(*on)),
        DeviceCommand::SetMotor { pwm, on } => format!("MOTOR:{}:{}", pwm, flag(*on)),
        DeviceCommand::SetFog(on) => format!("FOGGER:{}", flag(*on)),
        DeviceCommand::SetRandom { enabled, params } => match params {
            Some(p) => format!("RANDOM:{}:{}:{}", flag(*enabled), p.speed, p.brightness),
            None => format!("RANDOM:{}", flag(*enabled)),
        },
        DeviceCommand::RunDiagnostic(text) => text.clone(),
    };
    line.push(LINE_TERMINATOR);
    line
}

/// Decode one received line.
///
/// The line is lower-cased and searched for each marker in turn; the first
/// hit makes it a strike. Surrounding text, whitespace and mojibake around
/// the marker do not matter.
pub fn decode(raw: &str) -> HardwareEvent {
    let lowered = raw.to_lowercase();
    if STRIKE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        HardwareEvent::StrikeDetected
    } else {
        HardwareEvent::Unrecognized(raw.trim_end().to_string())
    }
}

/// Parse a command line the way the controller board does.
///
/// Lines that are not one of the structured commands are diagnostics and
/// come back as [`DeviceCommand::RunDiagnostic`].
pub fn parse_command(line: &str) -> Result<DeviceCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err("empty command line".to_string());
    }

    let mut fields = line.split(':');
    let head = fields.next().unwrap_or_default();
    let args: Vec<&str> = fields.collect();

    match head {
        "EMOTION" => {
            let code = number(&args, 0, line)?;
            let effect = EmotionEffect::from_code(code)
                .ok_or_else(|| format!("EMOTION value {} out of range 0..=4", code))?;
            Ok(DeviceCommand::SetEffect(effect))
        }
        "LED" => Ok(DeviceCommand::SetLight(number(&args, 0, line)? != 0)),
        "FOGGER" => Ok(DeviceCommand::SetFog(number(&args, 0, line)? != 0)),
        "MOTOR" => {
            // A trailing fade field is accepted and ignored.
            let pwm = number(&args, 0, line)?;
            let on = number(&args, 1, line)? != 0;
            Ok(DeviceCommand::SetMotor { pwm, on })
        }
        "RANDOM" => {
            let enabled = number(&args, 0, line)? != 0;
            let params = if args.len() > 1 {
                let defaults = RandomParams::default();
                Some(RandomParams {
                    speed: number(&args, 1, line)?,
                    brightness: if args.len() > 2 {
                        number(&args, 2, line)?
                    } else {
                        defaults.brightness
                    },
                })
            } else {
                None
            };
            Ok(DeviceCommand::SetRandom { enabled, params })
        }
        _ => Ok(DeviceCommand::RunDiagnostic(line.to_string())),
    }
}

fn flag(on: bool) -> u8 {
    u8::from(on)
}

fn number(args: &[&str], idx: usize, line: &str) -> Result<u8, String> {
    let field = args
        .get(idx)
        .ok_or_else(|| format!("'{}' is missing field {}", line, idx + 1))?;
    field
        .trim()
        .parse::<u8>()
        .map_err(|e| format!("'{}' field {} '{}': {}", line, idx + 1, field, e))
}
