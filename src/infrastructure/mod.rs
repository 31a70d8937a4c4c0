//! Infrastructure layer.
//!
//! Holds the scarce resource (the HTTP client) and exposes only the
//! capability to call the AI provider route. Nothing above this layer
//! builds HTTP requests.

pub mod server_api;

pub use server_api::{Endpoint, HttpServerApi, ServerApi};
