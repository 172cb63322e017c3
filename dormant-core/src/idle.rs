//! Idle/wake loop
//!
//! The only place the core suspends. Each pass clears the wake-up flag,
//! drops any stale timer update flag, and waits for an interrupt. Handlers
//! run while suspended and return here.

use dormant_hal::{OverflowTimer, PowerController, Sleeper};

/// Foreground loop state
pub struct IdleLoop<P, T, S> {
    power: P,
    timer: T,
    sleeper: S,
    wakes: u32,
}

impl<P, T, S> IdleLoop<P, T, S>
where
    P: PowerController,
    T: OverflowTimer,
    S: Sleeper,
{
    pub fn new(power: P, timer: T, sleeper: S) -> Self {
        Self {
            power,
            timer,
            sleeper,
            wakes: 0,
        }
    }

    /// Suspends completed so far (wrapping)
    pub fn wakes(&self) -> u32 {
        self.wakes
    }

    /// One pass: housekeeping, then suspend until the next interrupt
    pub fn iterate(&mut self) {
        self.power.clear_wakeup_flag();
        // Stale update flag from an overflow no handler acknowledged
        if self.timer.update_pending() {
            self.timer.clear_update_flag();
        }
        self.sleeper.wait_for_interrupt();
        self.wakes = self.wakes.wrapping_add(1);
    }

    pub fn run(mut self) -> ! {
        loop {
            self.iterate();
        }
    }
}
