//! SysTick handler

use dormant_hal::{OutputPort, PinMask};

use super::HandlerOutcome;
use crate::config::PinMap;

/// Handler context for the SysTick exception
///
/// SysTick has no pending flag to acknowledge; the exception clears itself
/// on entry.
pub struct TickHandler<O> {
    leds: O,
    led: PinMask,
}

impl<O: OutputPort> TickHandler<O> {
    pub fn new(pins: &PinMap, leds: O) -> Self {
        Self {
            leds,
            led: pins.blink_led(),
        }
    }

    pub fn handle(&mut self) -> HandlerOutcome {
        self.leds.toggle_pins(self.led);
        HandlerOutcome::TickToggled
    }
}
