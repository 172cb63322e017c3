//! Host-side simulation of the chip
//!
//! A register backing store implementing every `dormant-hal` trait, a core
//! cycle clock, scripted pin drives and a priority-ordered dispatcher.
//! Busy-waits advance the clock event by event; whenever a source becomes
//! ready and may preempt the running context, its handler runs inside the
//! wait, so nesting follows the same rule as the hardware.
//!
//! Power modes are honoured on suspend: Sleep wakes on any enabled
//! interrupt, Stop freezes both timers and wakes only on EXTI, Standby
//! sets the standby flag, waits for a WKUP1 rising edge and then resets
//! everything except the clock and the power flags. [`Sim::assert_reset`]
//! resets the same way from any mode.

mod bus;
mod harness;
mod peripherals;

#[cfg(test)]
mod scenarios;

pub use bus::{Dispatch, HandlerFn, Registers, Sim, SimEvent, Trace, MAX_DISPATCHES_PER_PASS};
pub use harness::{RunStop, Simulator};
pub use peripherals::{
    SimDelay, SimExti, SimGpio, SimNvic, SimPins, SimPower, SimSleeper, SimTick, SimTimer,
};
