//! Interrupt handlers
//!
//! One handler context per source. Each owns the peripheral handles it
//! touches and returns a [`HandlerOutcome`] describing what it did, so the
//! caller can log it.
//!
//! The button handlers follow the same sequence per fired line: effect,
//! settle, release-wait, lockout, acknowledge. The lockout is a busy-wait,
//! so only a strictly more urgent source can run during it.

mod exti;
mod tick;
mod timer;

pub use exti::{ButtonHandler, RELEASE_POLL_CYCLES};
pub use tick::TickHandler;
pub use timer::TimerHandler;

use dormant_hal::{LineMask, OutputPort, PinMask};

use crate::irq::{ButtonAction, InterruptSource};

/// Change applied to the LED outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    Set(PinMask),
    Clear(PinMask),
    Toggle(PinMask),
}

impl Effect {
    pub const fn for_action(action: ButtonAction, leds: PinMask) -> Self {
        match action {
            ButtonAction::On => Effect::Set(leds),
            ButtonAction::Off => Effect::Clear(leds),
            ButtonAction::Toggle => Effect::Toggle(leds),
        }
    }

    /// Write the effect using the port's atomic set/reset/toggle operations
    pub fn apply<O: OutputPort>(self, port: &mut O) {
        match self {
            Effect::Set(mask) => port.set_pins(mask),
            Effect::Clear(mask) => port.clear_pins(mask),
            Effect::Toggle(mask) => port.toggle_pins(mask),
        }
    }
}

/// Result of one handler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandlerOutcome {
    /// Entered with nothing recognised pending; nothing was touched
    Spurious(InterruptSource),
    /// Button lines serviced and acknowledged
    Serviced {
        source: InterruptSource,
        lines: LineMask,
    },
    /// Timer pulse pattern played and update flag cleared
    TimerPulsed,
    /// Tick LED toggled
    TickToggled,
}

impl HandlerOutcome {
    pub const fn source(&self) -> InterruptSource {
        match self {
            HandlerOutcome::Spurious(source) | HandlerOutcome::Serviced { source, .. } => *source,
            HandlerOutcome::TimerPulsed => InterruptSource::TimerOverflow,
            HandlerOutcome::TickToggled => InterruptSource::SysTick,
        }
    }

    pub const fn is_spurious(&self) -> bool {
        matches!(self, HandlerOutcome::Spurious(_))
    }
}
