//! Interrupt controller abstraction

/// Physical interrupt vectors used by the firmware
///
/// EXTI lines share vectors in pairs: lines 0 and 1 enter through
/// [`Vector::Exti0_1`], lines 2 and 3 through [`Vector::Exti2_3`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vector {
    Exti0_1,
    Exti2_3,
    Timer,
    SysTick,
}

impl Vector {
    /// Vector that serves a given EXTI line, for the lines this board uses
    pub const fn for_exti_line(line: u8) -> Option<Vector> {
        match line {
            0 | 1 => Some(Vector::Exti0_1),
            2 | 3 => Some(Vector::Exti2_3),
            _ => None,
        }
    }
}

/// Interrupt priority; lower value is more urgent
///
/// Cortex-M0 implements two priority bits, so only 0-3 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(u8);

impl Priority {
    /// Number of implemented priority bits
    pub const BITS: u8 = 2;
    /// Least urgent priority
    pub const LOWEST: Priority = Priority((1 << Self::BITS) - 1);
    /// Most urgent priority
    pub const HIGHEST: Priority = Priority(0);

    /// Create a priority, rejecting values the core does not implement
    pub const fn new(value: u8) -> Option<Self> {
        if value < (1 << Self::BITS) {
            Some(Priority(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Value as written to the 8-bit priority field (MSB-aligned)
    pub const fn hardware_value(self) -> u8 {
        self.0 << (8 - Self::BITS)
    }

    /// A pending handler preempts a running one only with a strictly
    /// lower numeric priority
    pub const fn preempts(self, running: Priority) -> bool {
        self.0 < running.0
    }
}

/// Enable and prioritize interrupt vectors
pub trait InterruptController {
    /// Enable the vector (SysTick is a system exception and ignores this)
    fn enable(&mut self, vector: Vector);

    /// Assign the vector's priority
    fn set_priority(&mut self, vector: Vector, priority: Priority);
}
