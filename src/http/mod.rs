//! HTTP client module with forge error classification.

mod client;
mod status;

pub use client::HttpClient;
pub use status::{classify_error, describe_status};
