//! External interrupt controller abstraction
//!
//! Each GPIO line number owns one EXTI line, routed to exactly one port.
//! Pending bits use write-1-to-clear semantics: writing a 1 clears that bit,
//! writing 0 leaves it untouched.

use crate::gpio::Port;

/// Bitset over EXTI lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineMask(pub u32);

impl LineMask {
    pub const EMPTY: LineMask = LineMask(0);

    pub const fn line(line: u8) -> Self {
        LineMask(1 << (line & 0x1F))
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, line: u8) -> bool {
        line < 32 && self.0 & (1 << line) != 0
    }

    pub const fn union(self, other: LineMask) -> LineMask {
        LineMask(self.0 | other.0)
    }

    pub const fn without(self, other: LineMask) -> LineMask {
        LineMask(self.0 & !other.0)
    }
}

/// Trigger edge selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// External interrupt/event controller plus the configuration block
/// that routes GPIO ports onto EXTI lines
pub trait ExtiController {
    /// Enable the system configuration controller clock
    ///
    /// Required before GPIO lines can raise interrupts.
    fn enable_syscfg_clock(&mut self);

    /// Route `line` to `port` (lines default to port A after reset)
    fn route(&mut self, line: u8, port: Port);

    /// Unmask the line in the interrupt mask register
    fn unmask(&mut self, line: u8);

    /// Select the trigger edges of the line
    fn set_trigger(&mut self, line: u8, edge: Edge);

    /// Snapshot of the pending register
    fn pending(&self) -> LineMask;

    /// Acknowledge exactly the given lines (write-1-to-clear)
    fn clear_pending(&mut self, lines: LineMask);
}
