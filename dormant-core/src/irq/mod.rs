//! Interrupt sources, arming and dispatch
//!
//! - [`source`] names the four logical sources and the EXTI lines behind
//!   the two shared vectors
//! - [`configurator`] arms the enabled sources with their priorities
//! - [`dispatch`] models which pending source runs next

pub mod configurator;
pub mod dispatch;
pub mod source;

pub use configurator::InterruptConfigurator;
pub use dispatch::{DispatchModel, PriorityTable};
pub use source::{ButtonAction, ExtiLine, FiredLines, InterruptSource, SourceSet};
