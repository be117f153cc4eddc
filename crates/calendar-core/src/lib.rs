#![doc = include_str!("../README.md")]

mod common;
pub use common::*;

pub mod config;
pub mod endpoint;
pub mod lifecycle;
pub mod proto;
pub mod service;
pub mod storage;
pub mod telemetry;
