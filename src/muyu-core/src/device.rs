// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Values exchanged with the wooden-fish device.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expression::Classification;

/// Light effect selected on the device (`EMOTION:<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionEffect {
    Off,
    Happy,
    Sad,
    Surprise,
    Random,
}

impl EmotionEffect {
    /// Numeric code used on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Happy => 1,
            Self::Sad => 2,
            Self::Surprise => 3,
            Self::Random => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Happy),
            2 => Some(Self::Sad),
            3 => Some(Self::Surprise),
            4 => Some(Self::Random),
            _ => None,
        }
    }
}

impl From<Classification> for EmotionEffect {
    fn from(value: Classification) -> Self {
        match value {
            Classification::Happy => Self::Happy,
            Classification::Sad => Self::Sad,
            Classification::Surprised => Self::Surprise,
        }
    }
}

/// Speed and brightness of the device's random light mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomParams {
    pub speed: u8,
    pub brightness: u8,
}

impl Default for RandomParams {
    fn default() -> Self {
        Self {
            speed: 128,
            brightness: 200,
        }
    }
}

/// One outbound instruction for the device. Commands are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    SetEffect(EmotionEffect),
    SetLight(bool),
    SetMotor { pwm: u8, on: bool },
    SetFog(bool),
    SetRandom {
        enabled: bool,
        params: Option<RandomParams>,
    },
    /// Free-form diagnostic or test string, sent verbatim.
    RunDiagnostic(String),
}

/// Event decoded from one line received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareEvent {
    StrikeDetected,
    Unrecognized(String),
}

impl HardwareEvent {
    pub fn is_strike(&self) -> bool {
        matches!(self, Self::StrikeDetected)
    }
}

impl fmt::Display for HardwareEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrikeDetected => write!(f, "StrikeDetected"),
            Self::Unrecognized(raw) => write!(f, "Unrecognized({raw})"),
        }
    }
}
