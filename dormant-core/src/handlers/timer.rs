//! Timer overflow handler

use dormant_hal::{BusyWait, OutputPort, OverflowTimer, PinMask};

use super::HandlerOutcome;
use crate::config::{HandlerTiming, PinMap, ValidConfig};
use crate::irq::InterruptSource;

/// Handler context for the overflow timer vector
///
/// Each update event plays a double pulse on one LED: pulse, lockout,
/// pulse. The update flag is cleared last.
pub struct TimerHandler<T, O, D> {
    timer: T,
    leds: O,
    delay: D,
    led: PinMask,
    timing: HandlerTiming,
}

impl<T, O, D> TimerHandler<T, O, D>
where
    T: OverflowTimer,
    O: OutputPort,
    D: BusyWait,
{
    pub fn new(config: &ValidConfig, pins: &PinMap, timer: T, leds: O, delay: D) -> Self {
        Self {
            timer,
            leds,
            delay,
            led: pins.pulse_led(),
            timing: *config.timing(),
        }
    }

    pub fn handle(&mut self) -> HandlerOutcome {
        if !self.timer.update_pending() {
            return HandlerOutcome::Spurious(InterruptSource::TimerOverflow);
        }

        self.pulse();
        self.delay.spin(self.timing.lockout_cycles);
        self.pulse();

        self.timer.clear_update_flag();
        HandlerOutcome::TimerPulsed
    }

    fn pulse(&mut self) {
        self.leds.set_pins(self.led);
        self.delay.spin(self.timing.pulse_cycles);
        self.leds.clear_pins(self.led);
    }
}
