//! Core domain + application logic for the remote jobs bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the Jobicy search
//! API live behind ports (traits) implemented in adapter crates.

pub mod chunking;
pub mod command;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod polling;
pub mod search;
pub mod templates;

pub use errors::{Error, Result};
