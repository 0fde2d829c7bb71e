pub mod decider;
pub mod error;
pub mod observer;
pub mod scratchpad;

pub use decider::StepInjectionDecider;
pub use error::{DeciderError, Result};
pub use observer::Observer;
pub use scratchpad::Scratchpad;
