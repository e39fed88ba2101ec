// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Commands emitted when a performance starts and when it is stopped.

use serde::{Deserialize, Serialize};

use crate::device::{DeviceCommand, EmotionEffect, RandomParams};
use crate::expression::Classification;

/// Extra channels switched on for one expression besides the light effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuxEffects {
    /// Motor duty cycle; `None` leaves the motor alone.
    pub motor_pwm: Option<u8>,
    /// Turn the fogger on.
    pub fog: bool,
    /// Run the random light mode with these parameters.
    pub random: Option<RandomParams>,
}

impl AuxEffects {
    fn is_empty(&self) -> bool {
        self.motor_pwm.is_none() && !self.fog && self.random.is_none()
    }
}

/// Per-expression auxiliary effects.
///
/// The default profile enables nothing, so a performance is exactly the
/// effect selection followed by the light enable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectProfile {
    pub happy: AuxEffects,
    pub sad: AuxEffects,
    pub surprised: AuxEffects,
}

impl EffectProfile {
    pub fn for_classification(&self, classification: Classification) -> &AuxEffects {
        match classification {
            Classification::Happy => &self.happy,
            Classification::Sad => &self.sad,
            Classification::Surprised => &self.surprised,
        }
    }

    pub fn has_extras(&self) -> bool {
        !(self.happy.is_empty() && self.sad.is_empty() && self.surprised.is_empty())
    }

    fn uses_random(&self) -> bool {
        [&self.happy, &self.sad, &self.surprised]
            .iter()
            .any(|aux| aux.random.is_some())
    }

    /// Commands that start a performance for `classification`.
    ///
    /// Order: effect selection, light enable, then motor, fog and random
    /// mode when configured.
    pub fn performance_commands(&self, classification: Classification) -> Vec<DeviceCommand> {
        let mut commands = vec![
            DeviceCommand::SetEffect(EmotionEffect::from(classification)),
            DeviceCommand::SetLight(true),
        ];
        let aux = self.for_classification(classification);
        if let Some(pwm) = aux.motor_pwm {
            commands.push(DeviceCommand::SetMotor { pwm, on: true });
        }
        if aux.fog {
            commands.push(DeviceCommand::SetFog(true));
        }
        if let Some(params) = aux.random {
            commands.push(DeviceCommand::SetRandom {
                enabled: true,
                params: Some(params),
            });
        }
        commands
    }

    /// Commands that switch every channel off.
    ///
    /// Depends only on the profile, so every cooldown sends the same set.
    pub fn stop_all_commands(&self) -> Vec<DeviceCommand> {
        let mut commands = vec![
            DeviceCommand::SetEffect(EmotionEffect::Off),
            DeviceCommand::SetLight(false),
            DeviceCommand::SetMotor { pwm: 0, on: false },
            DeviceCommand::SetFog(false),
        ];
        if self.uses_random() {
            commands.push(DeviceCommand::SetRandom {
                enabled: false,
                params: None,
            });
        }
        commands
    }
}
