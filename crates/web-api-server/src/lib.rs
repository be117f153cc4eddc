#![doc = include_str!("../README.md")]

pub mod server;

pub use server::{Application, config::WebApiServiceConfig, run};
