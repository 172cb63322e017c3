//! STM32F030 implementations of the Dormant register interface
//!
//! Every trait from `dormant-hal` is implemented here against the
//! memory-mapped peripherals of the STM32F030, reached through the
//! `embassy-stm32` metapac plus the `cortex-m` core peripherals. No
//! embassy drivers or executor are used: the firmware is purely
//! interrupt driven and talks to registers directly.
//!
//! # Features
//!
//! - `stm32f030f4` - STM32F030F4P6 (TSSOP20, ports A, B and F)
//! - `stm32f030k6` - STM32F030K6T6 (LQFP32)
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! ```ignore
//! let board = defmt::unwrap!(Board::take());
//! let parts = board.split();
//! ```
//!
//! Handles are zero-sized or hold a port selector only, so each interrupt
//! handler context can own its own copy.

#![no_std]

pub mod board;
pub mod delay;
pub mod exti;
pub mod gpio;
pub mod nvic;
pub mod power;
pub mod timer;

pub use board::{Board, Parts};
pub use delay::{CycleDelay, Wfi};
pub use exti::Exti;
pub use gpio::{GpioPort, PinSetup, UnsupportedPort};
pub use nvic::Nvic;
pub use power::Power;
pub use timer::{SysTick, Tim14};
