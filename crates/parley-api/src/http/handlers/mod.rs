//! HTTP request handlers for the REST API.

pub mod api_key;
pub mod message;
pub mod session;
