//! Sleep-mode selection and reset-cause detection

mod reset;
mod sleep;

pub use reset::ResetCause;
pub use sleep::{select_sleep_mode, PowerBits, SleepMode, WakeSource, WAKEUP_PIN};
