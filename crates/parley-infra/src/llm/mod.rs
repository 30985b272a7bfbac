//! Completion endpoint client implementations.

pub mod http;
