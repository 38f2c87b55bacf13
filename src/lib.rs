//! Feedgate - Rate-limited update feed service
//!
//! This crate serves a read-only list of published updates over HTTP. Every
//! request is admitted or rejected by a two-tier fixed-window rate limiter:
//! each client gets its own quota, and all clients together share a global
//! one. A background task wipes both tiers once per window.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod updates;
