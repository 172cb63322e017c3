//! Timer abstractions
//!
//! Two counting sources are used: a basic up-counting peripheral timer whose
//! update (overflow) event raises an interrupt, and the core's 24-bit
//! SysTick down-counter.

/// Largest value the SysTick reload register can hold
pub const TICK_RELOAD_MAX: u32 = (1 << 24) - 1;

/// Up-counting timer with an update interrupt
///
/// The overflow period in core cycles is `(psc + 1) * (arr + 1)` for raw
/// register values `psc` and `arr`.
pub trait OverflowTimer {
    /// Enable the timer's bus clock
    fn enable_clock(&mut self);

    /// Write the raw prescaler register
    fn set_prescaler(&mut self, psc: u16);

    /// Write the raw auto-reload register
    fn set_auto_reload(&mut self, arr: u16);

    /// Set the counter-enable bit
    fn start(&mut self);

    /// Enable the update interrupt
    fn enable_update_interrupt(&mut self);

    /// Read the update interrupt flag from the status register
    fn update_pending(&self) -> bool;

    /// Clear the update interrupt flag (status bits clear by writing 0)
    fn clear_update_flag(&mut self);
}

/// The core SysTick timer
///
/// The interrupt fires every `reload + 1` core cycles for a raw reload
/// register value `reload`.
pub trait TickTimer {
    /// Write the raw reload register (must not exceed [`TICK_RELOAD_MAX`])
    fn set_reload(&mut self, reload: u32);

    /// Reset the current value so the first period is a full one
    fn clear_current(&mut self);

    /// Clock from the core clock, enable the tick exception and the counter
    fn enable(&mut self);
}
