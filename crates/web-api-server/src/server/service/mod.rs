//! Transport-facing side of the web-api.

pub mod endpoints;
pub mod handler;
