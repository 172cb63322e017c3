//! Startup sequence
//!
//! Runs once, in dependency order: reset cause (which also clocks the power
//! controller), pin configuration, interrupt arming, sleep-mode selection.
//! Nothing survives a Standby wake, so the whole sequence runs from the
//! build-time configuration on every boot.

use dormant_hal::{
    ExtiController, InterruptController, OverflowTimer, PinConfigurator, PowerController,
    TickTimer,
};

use crate::config::{PinMap, ValidConfig};
use crate::irq::{InterruptConfigurator, SourceSet};
use crate::pins::configure_pins;
use crate::power::{select_sleep_mode, PowerBits, ResetCause, SleepMode};

/// Peripheral handles borrowed for the startup sequence
pub struct BootPeripherals<'a, G, E, T, K, N, P> {
    pub gpio: &'a mut G,
    pub exti: &'a mut E,
    pub timer: &'a mut T,
    pub tick: &'a mut K,
    pub nvic: &'a mut N,
    pub power: &'a mut P,
}

/// What the startup sequence did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    pub reset_cause: ResetCause,
    pub armed: SourceSet,
    pub sleep_mode: SleepMode,
    pub power_bits: PowerBits,
}

/// Bring the board from reset to ready-to-sleep
///
/// Handler contexts must be in place before this is called: the first
/// interrupt can fire as soon as its source is armed.
pub fn boot<G, E, T, K, N, P>(
    config: &ValidConfig,
    pins: &PinMap,
    p: BootPeripherals<'_, G, E, T, K, N, P>,
) -> BootReport
where
    G: PinConfigurator,
    E: ExtiController,
    T: OverflowTimer,
    K: TickTimer,
    N: InterruptController,
    P: PowerController,
{
    let reset_cause = ResetCause::read_and_clear(&mut *p.power);

    configure_pins(p.gpio, &pins.assignments());

    let armed = InterruptConfigurator::new(config, pins).arm_all(p.exti, p.timer, p.tick, p.nvic);

    let sleep_mode = config.sleep_mode();
    let power_bits = select_sleep_mode(sleep_mode, p.power);

    BootReport {
        reset_cause,
        armed,
        sleep_mode,
        power_bits,
    }
}
