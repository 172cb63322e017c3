//! Dormant Register Interface
//!
//! This crate defines the register-level traits that the board-agnostic
//! logic in `dormant-core` drives. A chip-specific crate implements them
//! against real memory-mapped peripherals; the core's simulator implements
//! them against a plain backing store for host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  dormant-firmware (vectors, startup)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dormant-core (configurator, handlers,  │
//! │  sleep-mode selector, idle loop)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dormant-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ dormant-hal-  │       │ dormant-core  │
//! │   stm32f0     │       │   ::sim       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::PinConfigurator`], [`gpio::OutputPort`], [`gpio::InputPort`] - GPIO
//! - [`exti::ExtiController`] - External interrupt lines
//! - [`timer::OverflowTimer`], [`timer::TickTimer`] - Timer and SysTick
//! - [`power::PowerController`], [`power::Sleeper`] - Low-power control
//! - [`nvic::InterruptController`] - Vector enable and priority
//! - [`delay::BusyWait`] - Cycle-counted busy waits

#![no_std]
#![deny(unsafe_code)]

pub mod delay;
pub mod exti;
pub mod gpio;
pub mod nvic;
pub mod power;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use delay::BusyWait;
pub use exti::{Edge, ExtiController, LineMask};
pub use gpio::{InputPort, Level, OutputPort, PinConfigurator, PinId, PinMask, PinMode, Port, Pull};
pub use nvic::{InterruptController, Priority, Vector};
pub use power::{PowerController, Sleeper};
pub use timer::{OverflowTimer, TickTimer, TICK_RELOAD_MAX};
