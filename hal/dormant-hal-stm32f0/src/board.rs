//! One-time ownership of the board's peripherals

use cortex_m::Peripherals as CorePeripherals;
use dormant_hal::Port;

use crate::delay::{CycleDelay, Wfi};
use crate::exti::Exti;
use crate::gpio::{GpioPort, PinSetup, UnsupportedPort};
use crate::nvic::Nvic;
use crate::power::Power;
use crate::timer::{SysTick, Tim14};

/// Exclusive access to the board
///
/// Guarded by the core peripherals' own take-once flag.
pub struct Board {
    core: CorePeripherals,
}

/// Every register interface the firmware needs, split for separate owners
pub struct Parts {
    pub pins: PinSetup,
    pub exti: Exti,
    pub timer: Tim14,
    pub tick: SysTick,
    pub nvic: Nvic,
    pub power: Power,
    pub delay: CycleDelay,
    pub sleeper: Wfi,
}

impl Board {
    /// Claim the board; `None` on every call after the first
    pub fn take() -> Option<Self> {
        CorePeripherals::take().map(|core| Self { core })
    }

    pub fn split(self) -> Parts {
        let core = self.core;
        Parts {
            pins: PinSetup::new(),
            exti: Exti::new(),
            timer: Tim14::new(),
            tick: SysTick::new(core.SYST),
            nvic: Nvic::new(core.NVIC),
            power: Power::new(core.SCB),
            delay: CycleDelay::new(),
            sleeper: Wfi::new(),
        }
    }
}

impl Parts {
    /// Data registers of `port`, for a handler context
    ///
    /// Port handles are freely copyable; BSRR writes need no ownership.
    pub fn gpio(&self, port: Port) -> Result<GpioPort, UnsupportedPort> {
        GpioPort::new(port)
    }
}
