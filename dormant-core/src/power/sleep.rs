//! Sleep-mode selector
//!
//! Each mode is one fixed combination of the deep-sleep bit, the regulator
//! bit, the power-down bit and the wake-pin enable:
//!
//! | Mode    | SLEEPDEEP | LPDS | PDDS | EWUP1 |
//! |---------|-----------|------|------|-------|
//! | Sleep   | 0         | 0    | 0    | 0     |
//! | Stop    | 1         | 1    | 0    | 0     |
//! | Standby | 1         | 1    | 1    | 1     |
//!
//! The mode is chosen at build time and written once before the first
//! suspend.

use dormant_hal::PowerController;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::irq::{InterruptSource, SourceSet};

/// Wake pin enabled for Standby (WKUP1 on PA0)
pub const WAKEUP_PIN: u8 = 1;

/// Low-power state entered by the idle loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SleepMode {
    /// Core clock stopped, peripherals running
    #[default]
    Sleep,
    /// All 1.8 V domain clocks stopped, regulator in low-power mode
    Stop,
    /// 1.8 V domain powered off; wake is a reset
    Standby,
}

/// Something that can end a suspend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeSource {
    Interrupt(InterruptSource),
    /// Rising edge on WKUP1
    WakeupPin,
    /// NRST assertion
    ResetPin,
}

impl SleepMode {
    pub const ALL: [SleepMode; 3] = [SleepMode::Sleep, SleepMode::Stop, SleepMode::Standby];

    /// Power-control bits this mode needs
    pub const fn power_bits(self) -> PowerBits {
        match self {
            SleepMode::Sleep => PowerBits {
                sleep_deep: false,
                low_power_regulator: false,
                power_down_deep_sleep: false,
                wakeup_pin: false,
            },
            SleepMode::Stop => PowerBits {
                sleep_deep: true,
                low_power_regulator: true,
                power_down_deep_sleep: false,
                wakeup_pin: false,
            },
            SleepMode::Standby => PowerBits {
                sleep_deep: true,
                low_power_regulator: true,
                power_down_deep_sleep: true,
                wakeup_pin: true,
            },
        }
    }

    /// Check if `source` ends a suspend in this mode
    pub const fn can_wake_from(self, source: WakeSource) -> bool {
        match (self, source) {
            (_, WakeSource::ResetPin) => true,
            (SleepMode::Sleep, WakeSource::Interrupt(_)) => true,
            (SleepMode::Stop, WakeSource::Interrupt(src)) => src.is_external(),
            (SleepMode::Standby, WakeSource::Interrupt(_)) => false,
            (SleepMode::Standby, WakeSource::WakeupPin) => true,
            (SleepMode::Sleep | SleepMode::Stop, WakeSource::WakeupPin) => false,
        }
    }

    /// Check if any of the armed sources (or the wake pin) ends a suspend
    ///
    /// The reset pin is not counted: a mode that only wakes by reset is a
    /// configuration error.
    pub fn has_wake_source(self, armed: SourceSet) -> bool {
        armed
            .iter()
            .any(|src| self.can_wake_from(WakeSource::Interrupt(src)))
            || (self.power_bits().wakeup_pin && self.can_wake_from(WakeSource::WakeupPin))
    }

    /// Check if RAM and registers survive a wake
    pub const fn retains_state(self) -> bool {
        !matches!(self, SleepMode::Standby)
    }

    /// Typical supply current class in microamps
    pub const fn typical_current_ua(self) -> u32 {
        match self {
            SleepMode::Sleep => 1_100,
            SleepMode::Stop => 15,
            SleepMode::Standby => 3,
        }
    }
}

/// Snapshot of the power-control bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerBits {
    pub sleep_deep: bool,
    pub low_power_regulator: bool,
    pub power_down_deep_sleep: bool,
    pub wakeup_pin: bool,
}

/// Configure the power controller for `mode`
///
/// Every bit is written, so whatever the reset state, the result matches
/// the table exactly.
pub fn select_sleep_mode<P: PowerController>(mode: SleepMode, pwr: &mut P) -> PowerBits {
    let bits = mode.power_bits();
    pwr.enable_clock();
    pwr.set_low_power_regulator(bits.low_power_regulator);
    pwr.set_power_down_deep_sleep(bits.power_down_deep_sleep);
    pwr.enable_wakeup_pin(WAKEUP_PIN, bits.wakeup_pin);
    pwr.set_sleep_deep(bits.sleep_deep);
    bits
}
