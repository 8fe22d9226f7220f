use std::sync::Arc;

use anyhow::{Context, Result};
use mockall::automock;
use serde::Deserialize;

use crate::{
    constants::{PULSE_WIDTH_MAX, PULSE_WIDTH_MIN, PULSE_WIDTH_NEUTRAL},
    modules::control_error::ControlError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorChannel {
    Steering,
    Throttle,
}

/// Servo style output driven by pulse widths in microseconds.
#[automock]
pub trait Actuator: Send + Sync + 'static {
    fn set_pulse_width(&self, channel: ActuatorChannel, pulse_width_us: u16) -> Result<()>;
}

/// Steering and throttle command sent by a viewer, e.g. `{"x": 1400, "y": 1600}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "x", default)]
    pub steering: Option<u16>,
    #[serde(rename = "y", default)]
    pub throttle: Option<u16>,
}

impl ControlMessage {
    pub fn parse(text: &str) -> Result<Self, ControlError> {
        let message: ControlMessage =
            serde_json::from_str(text).map_err(|err| ControlError::Malformed(err.to_string()))?;

        for pulse_width in [message.steering, message.throttle].into_iter().flatten() {
            if !(PULSE_WIDTH_MIN..=PULSE_WIDTH_MAX).contains(&pulse_width) {
                return Err(ControlError::OutOfRange(pulse_width));
            }
        }

        Ok(message)
    }
}

/// Applies viewer commands to the local actuators.
pub struct ControlRelay {
    actuator: Arc<dyn Actuator>,
}

impl ControlRelay {
    pub fn new(actuator: Arc<dyn Actuator>) -> Self {
        Self { actuator }
    }

    pub fn handle_text(&self, text: &str) -> Result<()> {
        let message = ControlMessage::parse(text)?;
        self.apply(&message)
    }

    pub fn apply(&self, message: &ControlMessage) -> Result<()> {
        if let Some(steering) = message.steering {
            self.actuator
                .set_pulse_width(ActuatorChannel::Steering, steering)
                .context("steering")?;
        }
        if let Some(throttle) = message.throttle {
            self.actuator
                .set_pulse_width(ActuatorChannel::Throttle, throttle)
                .context("throttle")?;
        }
        Ok(())
    }

    /// Stops the motor, used when a viewer disconnects.
    pub fn neutral_throttle(&self) -> Result<()> {
        self.actuator
            .set_pulse_width(ActuatorChannel::Throttle, PULSE_WIDTH_NEUTRAL)
    }

    pub fn center_all(&self) -> Result<()> {
        self.actuator
            .set_pulse_width(ActuatorChannel::Steering, PULSE_WIDTH_NEUTRAL)?;
        self.neutral_throttle()
    }
}
