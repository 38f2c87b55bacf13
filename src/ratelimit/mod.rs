//! Rate limiting logic and state management.

mod backend;
mod counter;
mod limiter;
mod reset;

pub use backend::AdmissionControl;
pub use limiter::{Limits, RateLimiter, WindowStats};
pub use reset::{ResetHandle, ResetLoop};
