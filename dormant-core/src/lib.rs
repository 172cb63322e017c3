//! Board-agnostic core logic for the sleep/wake firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Build-time configuration types and validation
//! - Pin configuration
//! - Interrupt source configuration and the dispatch/preemption model
//! - Interrupt handlers (debounce, release-wait, lockout, acknowledge)
//! - Sleep-mode selection and reset-cause detection
//! - The idle/wake loop
//!
//! Hardware is reached only through the `dormant-hal` traits. With the
//! `std` feature the [`sim`] module provides a simulated register file
//! implementing all of them.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod config;
pub mod handlers;
pub mod idle;
pub mod irq;
pub mod pins;
pub mod power;

#[cfg(any(test, feature = "std"))]
pub mod sim;

pub use boot::{boot, BootPeripherals, BootReport};
pub use config::{ConfigError, PinMap, SystemConfig, ValidConfig};
pub use irq::{InterruptSource, SourceSet};
pub use power::{ResetCause, SleepMode};
