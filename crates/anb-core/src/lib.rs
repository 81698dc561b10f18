//! Core domain + application logic for the anonymous message bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and persistent
//! storage live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod policy;
pub mod ports;
pub mod ratelimit;
pub mod relay;
pub mod session;
pub mod store;
pub mod texts;
pub mod token;

pub use errors::{Error, Result};
