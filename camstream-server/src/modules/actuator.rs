use std::sync::atomic::{AtomicU16, Ordering};

use anyhow::Result;
use camstream_core::{constants::PULSE_WIDTH_NEUTRAL, Actuator, ActuatorChannel};

/// Actuator that records and logs pulse widths instead of driving PWM pins.
#[derive(Debug)]
pub struct LoggingActuator {
    steering: AtomicU16,
    throttle: AtomicU16,
}

impl Default for LoggingActuator {
    fn default() -> Self {
        Self {
            steering: AtomicU16::new(PULSE_WIDTH_NEUTRAL),
            throttle: AtomicU16::new(PULSE_WIDTH_NEUTRAL),
        }
    }
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulse_width(&self, channel: ActuatorChannel) -> u16 {
        self.slot(channel).load(Ordering::Acquire)
    }

    fn slot(&self, channel: ActuatorChannel) -> &AtomicU16 {
        match channel {
            ActuatorChannel::Steering => &self.steering,
            ActuatorChannel::Throttle => &self.throttle,
        }
    }
}

impl Actuator for LoggingActuator {
    fn set_pulse_width(&self, channel: ActuatorChannel, pulse_width_us: u16) -> Result<()> {
        let previous = self.slot(channel).swap(pulse_width_us, Ordering::AcqRel);
        if previous != pulse_width_us {
            tracing::info!(?channel, "Pulse width {}us -> {}us", previous, pulse_width_us);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    mod success {
        use camstream_core::{Actuator, ActuatorChannel};

        use crate::modules::actuator::LoggingActuator;

        #[test]
        fn starts_neutral() {
            let actuator = LoggingActuator::new();

            assert_eq!(actuator.pulse_width(ActuatorChannel::Steering), 1500);
            assert_eq!(actuator.pulse_width(ActuatorChannel::Throttle), 1500);
        }

        #[test]
        fn channels_are_independent() {
            let actuator = LoggingActuator::new();

            actuator
                .set_pulse_width(ActuatorChannel::Throttle, 1800)
                .unwrap();

            assert_eq!(actuator.pulse_width(ActuatorChannel::Steering), 1500);
            assert_eq!(actuator.pulse_width(ActuatorChannel::Throttle), 1800);
        }
    }
}
