//! HTTP front end for the update feed.

mod server;
mod service;

pub use server::HttpServer;
pub use service::{client_identifier, ResponseBody, UpdateService, UPDATE_PATH};
