//! Hardware configuration types
//!
//! Pin wiring of the board: three buttons on EXTI lines 0-2 and a bank of
//! three LEDs.

use dormant_hal::{LineMask, PinId, PinMask, PinMode, Port, Pull};

use super::error::{ConfigError, PinParseError};
use crate::irq::ExtiLine;

/// Pin wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    /// Button on line 0: turns the LED bank on (also the Standby wake pin)
    pub on_button: PinId,
    /// Button on line 1: turns the LED bank off
    pub off_button: PinId,
    /// Button on line 2: toggles the LED bank
    pub toggle_button: PinId,
    /// Pull applied to every button input
    pub button_pull: Pull,
    /// LED bank; `leds[1]` is pulsed by the timer, `leds[2]` blinked by SysTick
    pub leds: [PinId; 3],
}

impl PinMap {
    /// Reference board: buttons to ground on PA0-PA2, LEDs on PA3-PA5
    pub const REFERENCE: PinMap = PinMap {
        on_button: PinId { port: Port::A, line: 0 },
        off_button: PinId { port: Port::A, line: 1 },
        toggle_button: PinId { port: Port::A, line: 2 },
        button_pull: Pull::Up,
        leds: [
            PinId { port: Port::A, line: 3 },
            PinId { port: Port::A, line: 4 },
            PinId { port: Port::A, line: 5 },
        ],
    };

    pub const fn buttons(&self) -> [PinId; 3] {
        [self.on_button, self.off_button, self.toggle_button]
    }

    /// Button wired to an EXTI line
    pub const fn button_for(&self, line: ExtiLine) -> Option<PinId> {
        match line {
            ExtiLine::Line0 => Some(self.on_button),
            ExtiLine::Line1 => Some(self.off_button),
            ExtiLine::Line2 => Some(self.toggle_button),
            ExtiLine::Line3 => None,
        }
    }

    pub const fn button_port(&self) -> Port {
        self.on_button.port
    }

    pub const fn led_port(&self) -> Port {
        self.leds[0].port
    }

    /// EXTI lines that have a button behind them
    pub const fn armed_lines(&self) -> LineMask {
        LineMask(
            LineMask::line(self.on_button.line).bits()
                | LineMask::line(self.off_button.line).bits()
                | LineMask::line(self.toggle_button.line).bits(),
        )
    }

    /// Every LED
    pub const fn led_bank(&self) -> PinMask {
        PinMask(
            self.leds[0].mask().bits() | self.leds[1].mask().bits() | self.leds[2].mask().bits(),
        )
    }

    /// LED pulsed by the timer overflow handler
    pub const fn pulse_led(&self) -> PinMask {
        self.leds[1].mask()
    }

    /// LED toggled by the SysTick handler
    pub const fn blink_led(&self) -> PinMask {
        self.leds[2].mask()
    }

    /// Every (pin, mode) pair the board needs
    pub const fn assignments(&self) -> [(PinId, PinMode); 6] {
        let input = PinMode::Input(self.button_pull);
        [
            (self.on_button, input),
            (self.off_button, input),
            (self.toggle_button, input),
            (self.leds[0], PinMode::Output),
            (self.leds[1], PinMode::Output),
            (self.leds[2], PinMode::Output),
        ]
    }

    /// Check the wiring rules the handlers rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (line, pin) in ExtiLine::ALL
            .into_iter()
            .filter_map(|line| self.button_for(line).map(|pin| (line, pin)))
        {
            if pin.line != line.number() {
                return Err(ConfigError::ButtonLineMismatch {
                    expected: line.number(),
                    found: pin.line,
                });
            }
        }

        let buttons = self.buttons();
        if buttons.iter().any(|pin| pin.port != self.button_port()) {
            return Err(ConfigError::ButtonPortMismatch);
        }
        if self.leds.iter().any(|pin| pin.port != self.led_port()) {
            return Err(ConfigError::LedPortMismatch);
        }

        let all = self.assignments();
        for (i, (a, _)) in all.iter().enumerate() {
            if all[i + 1..].iter().any(|(b, _)| a == b) {
                return Err(ConfigError::DuplicatePin);
            }
        }

        Ok(())
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Parse a pin name from config
///
/// Accepts `"PA0"` through `"PF15"`, ignoring surrounding whitespace.
pub fn parse_pin(s: &str) -> Result<PinId, PinParseError> {
    let s = s.trim();

    let rest = s.strip_prefix('P').ok_or(PinParseError::MissingPrefix)?;
    let mut chars = rest.chars();
    let port = chars
        .next()
        .and_then(Port::from_letter)
        .ok_or(PinParseError::InvalidPort)?;

    let line: u8 = chars
        .as_str()
        .parse()
        .map_err(|_| PinParseError::InvalidLine)?;

    PinId::new(port, line).ok_or(PinParseError::InvalidLine)
}
