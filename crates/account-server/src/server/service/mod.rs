//! Transport-facing side of the account service.
//!
//! ## Structure
//!
//! - [`endpoints`] - one [`Endpoint`](calendar_core::endpoint::Endpoint) per
//!   `AccountService` method.
//! - [`handler`] - gRPC entry point (`AccountHandler`), built from the
//!   endpoint set only.

pub mod endpoints;
pub mod handler;
