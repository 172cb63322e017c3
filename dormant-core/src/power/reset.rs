//! Reset cause

use dormant_hal::PowerController;

/// Why the core is running the startup sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetCause {
    /// Power-on, pin reset or any reset other than a Standby wake
    PowerOn,
    /// Woken from Standby (standby flag was set)
    StandbyWake,
}

impl ResetCause {
    /// Read the standby flag and clear it for the next boot
    pub fn read_and_clear<P: PowerController>(pwr: &mut P) -> Self {
        pwr.enable_clock();
        if pwr.standby_flag() {
            pwr.clear_standby_flag();
            ResetCause::StandbyWake
        } else {
            ResetCause::PowerOn
        }
    }
}
