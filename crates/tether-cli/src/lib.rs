//! tether CLI library
//!
//! The binary is a thin dispatcher; everything it wires together lives
//! here so the executors and URL building can be tested directly.

pub mod commands;
pub mod context;
pub mod output;
pub mod urls;
