//! Dormant - Sleep and Wake Firmware
//!
//! Main firmware binary for STM32F030 boards. Startup claims the board,
//! installs a context for every handler, runs the startup sequence and
//! then hands the core to the idle loop. After that all work happens in
//! the four vectors at the bottom of this file.

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use defmt::*;
use embassy_stm32::pac::interrupt;
use portable_atomic::{AtomicU32, Ordering};
use {defmt_rtt as _, panic_probe as _};

use dormant_core::handlers::{ButtonHandler, HandlerOutcome, TickHandler, TimerHandler};
use dormant_core::idle::IdleLoop;
use dormant_core::{boot, BootPeripherals, InterruptSource};
use dormant_hal_stm32f0::{Board, CycleDelay, Exti, GpioPort, Tim14};

use crate::slot::HandlerSlot;

mod slot;

/// Validated at build time from firmware.toml
mod config {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

type Buttons = ButtonHandler<Exti, GpioPort, GpioPort, CycleDelay>;

static GROUP_A: HandlerSlot<Buttons> = HandlerSlot::new();
static GROUP_B: HandlerSlot<Buttons> = HandlerSlot::new();
static TIMER: HandlerSlot<TimerHandler<Tim14, GpioPort, CycleDelay>> = HandlerSlot::new();
static TICK: HandlerSlot<TickHandler<GpioPort>> = HandlerSlot::new();

/// Handler entries that found nothing pending
static SPURIOUS: AtomicU32 = AtomicU32::new(0);

#[entry]
fn main() -> ! {
    info!("Dormant firmware starting...");

    // Already checked by build.rs; repeated so a stale OUT_DIR cannot slip through
    let config = unwrap!(config::SYSTEM.validate());
    let pins = config::PINS;
    unwrap!(pins.validate());

    let mut parts = unwrap!(Board::take()).split();
    let buttons = unwrap!(GpioPort::new(pins.button_port()));
    let leds = unwrap!(GpioPort::new(pins.led_port()));

    // Contexts go in before startup enables any vector
    for (slot, source) in [
        (&GROUP_A, InterruptSource::ExtiGroupA),
        (&GROUP_B, InterruptSource::ExtiGroupB),
    ] {
        let handler =
            ButtonHandler::new(source, &config, &pins, parts.exti, buttons, leds, parts.delay);
        unwrap!(slot.install(handler));
    }
    unwrap!(TIMER.install(TimerHandler::new(
        &config,
        &pins,
        parts.timer,
        leds,
        parts.delay,
    )));
    unwrap!(TICK.install(TickHandler::new(&pins, leds)));
    debug!("Handler contexts installed");

    let report = boot(
        &config,
        &pins,
        BootPeripherals {
            gpio: &mut parts.pins,
            exti: &mut parts.exti,
            timer: &mut parts.timer,
            tick: &mut parts.tick,
            nvic: &mut parts.nvic,
            power: &mut parts.power,
        },
    );
    info!("Reset cause: {}", report.reset_cause);
    info!("Armed sources: {}", report.armed);
    info!(
        "Sleep mode: {} ({}), typical {=u32} uA",
        report.sleep_mode,
        report.power_bits,
        report.sleep_mode.typical_current_ua()
    );

    info!("Entering idle loop");
    IdleLoop::new(parts.power, parts.timer, parts.sleeper).run()
}

fn log_outcome(outcome: HandlerOutcome) {
    if outcome.is_spurious() {
        let count = SPURIOUS.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Spurious entry on {} ({} total)", outcome.source(), count);
    } else {
        trace!("{}", outcome);
    }
}

#[interrupt]
fn EXTI0_1() {
    // SAFETY: this vector owns GROUP_A
    if let Some(handler) = unsafe { GROUP_A.get_mut() } {
        log_outcome(handler.handle());
    }
}

#[interrupt]
fn EXTI2_3() {
    // SAFETY: this vector owns GROUP_B
    if let Some(handler) = unsafe { GROUP_B.get_mut() } {
        log_outcome(handler.handle());
    }
}

#[interrupt]
fn TIM14() {
    // SAFETY: this vector owns TIMER
    if let Some(handler) = unsafe { TIMER.get_mut() } {
        log_outcome(handler.handle());
    }
}

#[exception]
fn SysTick() {
    // SAFETY: this exception owns TICK
    if let Some(handler) = unsafe { TICK.get_mut() } {
        log_outcome(handler.handle());
    }
}
