//! Audible over-temperature alert.

use thermo_common::consts::ALERT_BEEP_FREQUENCY_HZ;
use tracing::{info, warn};

/// Receiver of the aggregate thermal error signal.
pub trait AlertSignaler {
    /// Turn the alert on or off. Called every cycle.
    fn set_alert(&mut self, on: bool);
}

/// Beep alert that reports start/stop transitions through the log.
#[derive(Debug, Clone)]
pub struct BeepAlert {
    frequency_hz: u32,
    active: bool,
    /// Number of off→on transitions.
    activations: u64,
}

impl BeepAlert {
    /// Alert sounding at `frequency_hz`.
    pub const fn new(frequency_hz: u32) -> Self {
        Self {
            frequency_hz,
            active: false,
            activations: 0,
        }
    }

    /// Whether the beep is currently sounding.
    #[inline]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Number of times the beep has been started.
    #[inline]
    pub const fn activations(&self) -> u64 {
        self.activations
    }

    /// Tone frequency [Hz].
    #[inline]
    pub const fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }
}

impl Default for BeepAlert {
    fn default() -> Self {
        Self::new(ALERT_BEEP_FREQUENCY_HZ)
    }
}

impl AlertSignaler for BeepAlert {
    fn set_alert(&mut self, on: bool) {
        match (self.active, on) {
            (false, true) => {
                warn!("start beep ({} Hz): thermal limit reached", self.frequency_hz);
                self.activations += 1;
            }
            (true, false) => info!("stop beep"),
            _ => {}
        }
        self.active = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_transitions() {
        let mut a = BeepAlert::default();
        assert_eq!(a.frequency_hz(), 3136);
        assert!(!a.is_active());
        a.set_alert(true);
        a.set_alert(true);
        assert!(a.is_active());
        assert_eq!(a.activations(), 1);
        a.set_alert(false);
        assert!(!a.is_active());
        a.set_alert(true);
        assert_eq!(a.activations(), 2);
    }
}
