//! Interrupt source identities
//!
//! EXTI lines share vectors in pairs, so one logical source covers a group
//! of lines and the handler works out which member fired from the pending
//! register.

use dormant_hal::{LineMask, Vector};

/// Logical interrupt sources
///
/// Declaration order is the fixed scan order used to break priority ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptSource {
    /// EXTI lines 0-1, one shared vector
    ExtiGroupA,
    /// EXTI lines 2-3, one shared vector
    ExtiGroupB,
    /// Basic timer update (overflow) event
    TimerOverflow,
    /// Core SysTick exception
    SysTick,
}

impl InterruptSource {
    pub const COUNT: usize = 4;

    /// All sources in scan order
    pub const ALL: [InterruptSource; Self::COUNT] = [
        InterruptSource::ExtiGroupA,
        InterruptSource::ExtiGroupB,
        InterruptSource::TimerOverflow,
        InterruptSource::SysTick,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Physical vector this source enters through
    pub const fn vector(self) -> Vector {
        match self {
            InterruptSource::ExtiGroupA => Vector::Exti0_1,
            InterruptSource::ExtiGroupB => Vector::Exti2_3,
            InterruptSource::TimerOverflow => Vector::Timer,
            InterruptSource::SysTick => Vector::SysTick,
        }
    }

    pub const fn from_vector(vector: Vector) -> Self {
        match vector {
            Vector::Exti0_1 => InterruptSource::ExtiGroupA,
            Vector::Exti2_3 => InterruptSource::ExtiGroupB,
            Vector::Timer => InterruptSource::TimerOverflow,
            Vector::SysTick => InterruptSource::SysTick,
        }
    }

    /// EXTI lines mapped onto this source's vector
    pub const fn lines(self) -> LineMask {
        match self {
            InterruptSource::ExtiGroupA => LineMask(0b0011),
            InterruptSource::ExtiGroupB => LineMask(0b1100),
            InterruptSource::TimerOverflow | InterruptSource::SysTick => LineMask::EMPTY,
        }
    }

    /// Check if this is an external (GPIO edge) source
    pub const fn is_external(self) -> bool {
        matches!(self, InterruptSource::ExtiGroupA | InterruptSource::ExtiGroupB)
    }

    /// Lines of this group that are pending and armed, in bit-scan order
    pub fn fired_lines(self, pending: LineMask, armed: LineMask) -> FiredLines {
        FiredLines {
            remaining: LineMask(pending.bits() & armed.bits() & self.lines().bits()),
        }
    }
}

/// What a button line does to the LED bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    /// Drive every LED high
    On,
    /// Drive every LED low
    Off,
    /// Invert every LED
    Toggle,
}

/// EXTI lines served by the two shared vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtiLine {
    Line0,
    Line1,
    Line2,
    Line3,
}

impl ExtiLine {
    pub const ALL: [ExtiLine; 4] = [
        ExtiLine::Line0,
        ExtiLine::Line1,
        ExtiLine::Line2,
        ExtiLine::Line3,
    ];

    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn from_number(line: u8) -> Option<Self> {
        match line {
            0 => Some(ExtiLine::Line0),
            1 => Some(ExtiLine::Line1),
            2 => Some(ExtiLine::Line2),
            3 => Some(ExtiLine::Line3),
            _ => None,
        }
    }

    pub const fn mask(self) -> LineMask {
        LineMask::line(self.number())
    }

    /// Group whose vector this line raises
    pub const fn source(self) -> InterruptSource {
        match self {
            ExtiLine::Line0 | ExtiLine::Line1 => InterruptSource::ExtiGroupA,
            ExtiLine::Line2 | ExtiLine::Line3 => InterruptSource::ExtiGroupB,
        }
    }

    /// Effect wired to this line; line 3 has no button
    pub const fn action(self) -> Option<ButtonAction> {
        match self {
            ExtiLine::Line0 => Some(ButtonAction::On),
            ExtiLine::Line1 => Some(ButtonAction::Off),
            ExtiLine::Line2 => Some(ButtonAction::Toggle),
            ExtiLine::Line3 => None,
        }
    }
}

/// Iterator over fired group members, lowest line first
#[derive(Debug, Clone)]
pub struct FiredLines {
    remaining: LineMask,
}

impl Iterator for FiredLines {
    type Item = ExtiLine;

    fn next(&mut self) -> Option<ExtiLine> {
        let bits = self.remaining.bits();
        if bits == 0 {
            return None;
        }
        let line = bits.trailing_zeros() as u8;
        self.remaining = self.remaining.without(LineMask::line(line));
        ExtiLine::from_number(line)
    }
}

/// Bitset of interrupt sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceSet(u8);

impl SourceSet {
    pub const EMPTY: SourceSet = SourceSet(0);

    pub const fn single(source: InterruptSource) -> Self {
        SourceSet(1 << source.index())
    }

    pub fn insert(&mut self, source: InterruptSource) {
        self.0 |= 1 << source.index();
    }

    pub fn remove(&mut self, source: InterruptSource) {
        self.0 &= !(1 << source.index());
    }

    pub const fn contains(self, source: InterruptSource) -> bool {
        self.0 & (1 << source.index()) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in scan order
    pub fn iter(self) -> impl Iterator<Item = InterruptSource> {
        InterruptSource::ALL
            .into_iter()
            .filter(move |source| self.contains(*source))
    }
}

impl FromIterator<InterruptSource> for SourceSet {
    fn from_iter<I: IntoIterator<Item = InterruptSource>>(iter: I) -> Self {
        let mut set = SourceSet::EMPTY;
        for source in iter {
            set.insert(source);
        }
        set
    }
}
