//! Busy-wait and WFI primitives

use dormant_hal::{BusyWait, Sleeper};

/// Busy wait counted in core cycles
///
/// Only the caller's own execution is counted; time spent in a
/// preempting handler is not subtracted.
#[derive(Clone, Copy)]
pub struct CycleDelay {
    _private: (),
}

impl CycleDelay {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl BusyWait for CycleDelay {
    fn spin(&mut self, cycles: u32) {
        cortex_m::asm::delay(cycles);
    }
}

/// Wait-for-interrupt suspend
pub struct Wfi {
    _private: (),
}

impl Wfi {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl Sleeper for Wfi {
    fn wait_for_interrupt(&mut self) {
        cortex_m::asm::wfi();
    }
}
