//! Configuration errors

use core::fmt;

use crate::irq::InterruptSource;
use crate::power::SleepMode;

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// SysTick reload must be in 2..=2^24-1 core cycles
    TickReloadOutOfRange(u32),
    /// Timer prescaler divisor must be in 1..=65536
    TimerPrescalerOutOfRange(u32),
    /// Timer reload count must be in 2..=65536
    TimerReloadOutOfRange(u32),
    /// Priority exceeds the implemented priority bits
    PriorityOutOfRange { source: InterruptSource, value: u8 },
    /// External group B must be strictly more urgent than group A
    PriorityInversion { group_a: u8, group_b: u8 },
    /// No enabled source can wake the core from the selected mode
    NoWakeSource(SleepMode),
    /// A button sits on the wrong line for its role
    ButtonLineMismatch { expected: u8, found: u8 },
    /// Buttons must share one GPIO port
    ButtonPortMismatch,
    /// LEDs must share one GPIO port
    LedPortMismatch,
    /// The same pin is assigned twice
    DuplicatePin,
    /// A pin string could not be parsed
    InvalidPin(PinParseError),
}

/// Reasons a pin name like `"PA0"` is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinParseError {
    /// Name does not start with `P`
    MissingPrefix,
    /// Port letter outside `A..=F`
    InvalidPort,
    /// Line number missing or above 15
    InvalidLine,
}

impl From<PinParseError> for ConfigError {
    fn from(err: PinParseError) -> Self {
        ConfigError::InvalidPin(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TickReloadOutOfRange(v) => {
                write!(f, "tick reload {} outside 2..=16777215", v)
            }
            ConfigError::TimerPrescalerOutOfRange(v) => {
                write!(f, "timer prescaler {} outside 1..=65536", v)
            }
            ConfigError::TimerReloadOutOfRange(v) => {
                write!(f, "timer reload {} outside 2..=65536", v)
            }
            ConfigError::PriorityOutOfRange { source, value } => {
                write!(f, "priority {} for {:?} outside 0..=3", value, source)
            }
            ConfigError::PriorityInversion { group_a, group_b } => write!(
                f,
                "group B priority {} must be lower than group A priority {}",
                group_b, group_a
            ),
            ConfigError::NoWakeSource(mode) => {
                write!(f, "no enabled source can wake the core from {:?}", mode)
            }
            ConfigError::ButtonLineMismatch { expected, found } => {
                write!(f, "button must be on line {}, found line {}", expected, found)
            }
            ConfigError::ButtonPortMismatch => write!(f, "buttons must share one port"),
            ConfigError::LedPortMismatch => write!(f, "LEDs must share one port"),
            ConfigError::DuplicatePin => write!(f, "pin assigned more than once"),
            ConfigError::InvalidPin(err) => write!(f, "invalid pin: {}", err),
        }
    }
}

impl fmt::Display for PinParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinParseError::MissingPrefix => write!(f, "expected a name like \"PA0\""),
            PinParseError::InvalidPort => write!(f, "port must be A-F"),
            PinParseError::InvalidLine => write!(f, "line must be 0-15"),
        }
    }
}
