//! Core types shared across the crate.

pub mod config;
pub mod reports;
pub mod vault;

pub use config::Config;
