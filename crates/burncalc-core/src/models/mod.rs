//! Domain models for the burn calculator.

mod calculation;
mod identity;
mod notification;
mod patient;
mod zone;

pub use calculation::*;
pub use identity::*;
pub use notification::*;
pub use patient::*;
pub use zone::*;
