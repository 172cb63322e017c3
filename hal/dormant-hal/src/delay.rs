//! Busy-wait abstraction
//!
//! Handlers pause by burning CPU cycles, never by suspending. Keeping the
//! wait behind a trait lets tests advance a simulated clock instead.

/// Cycle-counted busy wait
pub trait BusyWait {
    /// Spin for at least `cycles` core clock cycles
    fn spin(&mut self, cycles: u32);
}
