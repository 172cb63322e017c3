//! Power controller abstraction
//!
//! Covers the deep-sleep bit in the system control register and the
//! power controller's mode, flag and wake-pin bits.

/// Low-power mode control bits
pub trait PowerController {
    /// Enable the power controller's bus clock
    fn enable_clock(&mut self);

    /// Set or clear SLEEPDEEP in the system control register
    fn set_sleep_deep(&mut self, on: bool);

    /// Set or clear the low-power regulator bit (LPDS)
    fn set_low_power_regulator(&mut self, on: bool);

    /// Set or clear power-down-deep-sleep (PDDS): deep sleep enters
    /// Standby instead of Stop
    fn set_power_down_deep_sleep(&mut self, on: bool);

    /// Enable or disable a wake-up pin (1-based, `WKUP1` = 1)
    fn enable_wakeup_pin(&mut self, pin: u8, on: bool);

    /// Clear the wake-up flag (CWUF)
    fn clear_wakeup_flag(&mut self);

    /// Standby flag: set when the last reset was a wake from Standby
    fn standby_flag(&self) -> bool;

    /// Clear the standby flag (CSBF)
    fn clear_standby_flag(&mut self);
}

/// The single blocking suspend primitive
pub trait Sleeper {
    /// Suspend the core until an interrupt occurs (WFI)
    fn wait_for_interrupt(&mut self);
}
