//! The update feed served behind the rate limiter.

mod source;

pub use source::{FileUpdateSource, StaticUpdateSource, Update, UpdateSource};
