//! GPIO port abstractions
//!
//! Pins are addressed by port and line. Output and input registers are
//! accessed a whole port at a time through [`PinMask`] bitsets, which maps
//! directly onto the set/reset and data registers of the hardware.

/// GPIO port letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Port {
    /// All ports in register order
    pub const ALL: [Port; 6] = [Port::A, Port::B, Port::C, Port::D, Port::E, Port::F];

    /// Zero-based port index (A = 0)
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Port from a letter, `'A'..='F'`
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(Port::A),
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            'D' => Some(Port::D),
            'E' => Some(Port::E),
            'F' => Some(Port::F),
            _ => None,
        }
    }

    /// Port letter
    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
            Port::E => 'E',
            Port::F => 'F',
        }
    }
}

/// Pin identity: port plus line number (0-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    pub port: Port,
    pub line: u8,
}

impl PinId {
    /// Create a pin id, returning `None` for lines above 15
    pub const fn new(port: Port, line: u8) -> Option<Self> {
        if line > 15 {
            None
        } else {
            Some(Self { port, line })
        }
    }

    /// Mask with only this pin's bit set
    pub const fn mask(self) -> PinMask {
        PinMask::line(self.line)
    }
}

/// Bitset over the 16 lines of one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMask(pub u16);

impl PinMask {
    pub const EMPTY: PinMask = PinMask(0);

    /// Mask for a single line
    pub const fn line(line: u8) -> Self {
        PinMask(1 << (line & 0x0F))
    }

    /// Mask for several lines
    pub const fn lines(lines: &[u8]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < lines.len() {
            bits |= 1 << (lines[i] & 0x0F);
            i += 1;
        }
        PinMask(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, line: u8) -> bool {
        line < 16 && self.0 & (1 << line) != 0
    }

    pub const fn union(self, other: PinMask) -> PinMask {
        PinMask(self.0 | other.0)
    }

    pub const fn intersection(self, other: PinMask) -> PinMask {
        PinMask(self.0 & other.0)
    }

    pub const fn difference(self, other: PinMask) -> PinMask {
        PinMask(self.0 & !other.0)
    }
}

impl core::ops::BitOr for PinMask {
    type Output = PinMask;

    fn bitor(self, rhs: PinMask) -> PinMask {
        self.union(rhs)
    }
}

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Internal pull resistor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    #[default]
    None,
    Up,
    Down,
}

impl Pull {
    /// Level an unloaded input settles at with this pull
    ///
    /// A floating input has no defined idle level; it is treated as low.
    pub const fn idle_level(self) -> Level {
        match self {
            Pull::Up => Level::High,
            Pull::Down | Pull::None => Level::Low,
        }
    }
}

/// Pin mode register field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Digital input with the given pull
    Input(Pull),
    /// Push-pull digital output
    Output,
}

/// One-time pin setup: port clock gating and mode/pull fields
pub trait PinConfigurator {
    /// Enable the peripheral clock that owns `port`
    fn enable_port_clock(&mut self, port: Port);

    /// Write the mode and pull fields of `pin`
    fn set_mode(&mut self, pin: PinId, mode: PinMode);
}

/// Output data register of one port
///
/// `set_pins` and `clear_pins` must be single atomic writes (bit set/reset
/// register) so they are safe under preemption. `toggle_pins` has no atomic
/// hardware equivalent; implementations must make it indivisible with
/// respect to interrupts.
pub trait OutputPort {
    /// Drive the masked pins high
    fn set_pins(&mut self, mask: PinMask);

    /// Drive the masked pins low
    fn clear_pins(&mut self, mask: PinMask);

    /// Invert the masked pins
    fn toggle_pins(&mut self, mask: PinMask);

    /// Current output data register contents
    fn output_levels(&self) -> PinMask;

    /// Check whether a single output is driven high
    fn is_set_high(&self, line: u8) -> bool {
        self.output_levels().contains(line)
    }
}

/// Input data register of one port
pub trait InputPort {
    /// Current input data register contents
    fn input_levels(&self) -> PinMask;

    /// Level of a single input line
    fn level(&self, line: u8) -> Level {
        Level::from(self.input_levels().contains(line))
    }
}
