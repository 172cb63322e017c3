//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware's build script
//! deserializes them from TOML and validates them before any code is
//! generated, so an invalid configuration never reaches the target.

pub mod error;
pub mod hardware;
pub mod types;

pub use error::{ConfigError, PinParseError};
pub use hardware::*;
pub use types::*;
