//! Button (EXTI) handler

use dormant_hal::{BusyWait, ExtiController, InputPort, Level, LineMask, OutputPort, PinMask};

use super::{Effect, HandlerOutcome};
use crate::config::{HandlerTiming, PinMap, ValidConfig};
use crate::irq::{ExtiLine, InterruptSource};

/// Busy-wait between two polls of a held button
pub const RELEASE_POLL_CYCLES: u32 = 16;

/// Handler context for one shared EXTI vector
pub struct ButtonHandler<E, I, O, D> {
    source: InterruptSource,
    exti: E,
    inputs: I,
    leds: O,
    delay: D,
    led_bank: PinMask,
    idle: Level,
    armed: LineMask,
    timing: HandlerTiming,
}

impl<E, I, O, D> ButtonHandler<E, I, O, D>
where
    E: ExtiController,
    I: InputPort,
    O: OutputPort,
    D: BusyWait,
{
    /// Build the context for `source`
    ///
    /// `inputs` must read the button port and `leds` drive the LED port.
    pub fn new(
        source: InterruptSource,
        config: &ValidConfig,
        pins: &PinMap,
        exti: E,
        inputs: I,
        leds: O,
        delay: D,
    ) -> Self {
        Self {
            source,
            exti,
            inputs,
            leds,
            delay,
            led_bank: pins.led_bank(),
            idle: pins.button_pull.idle_level(),
            armed: pins.armed_lines(),
            timing: *config.timing(),
        }
    }

    /// Service every armed line of this group that is pending
    ///
    /// Lines are taken lowest first from one snapshot of the pending
    /// register. A line is acknowledged only after its own lockout, and no
    /// other line's pending bit is written.
    pub fn handle(&mut self) -> HandlerOutcome {
        let pending = self.exti.pending();
        let mut serviced = LineMask::EMPTY;

        for line in self.source.fired_lines(pending, self.armed) {
            if self.service(line) {
                serviced = serviced.union(line.mask());
            }
        }

        if serviced.is_empty() {
            HandlerOutcome::Spurious(self.source)
        } else {
            HandlerOutcome::Serviced {
                source: self.source,
                lines: serviced,
            }
        }
    }

    fn service(&mut self, line: ExtiLine) -> bool {
        let Some(action) = line.action() else {
            return false;
        };

        Effect::for_action(action, self.led_bank).apply(&mut self.leds);
        self.delay.spin(self.timing.settle_cycles);
        self.wait_for_release(line.number());
        self.delay.spin(self.timing.lockout_cycles);
        self.exti.clear_pending(line.mask());
        true
    }

    /// Blocks forever on a stuck input
    fn wait_for_release(&mut self, line: u8) {
        while self.inputs.level(line) != self.idle {
            self.delay.spin(RELEASE_POLL_CYCLES);
        }
    }
}
