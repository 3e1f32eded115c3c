//! tether-core: Shared configuration and error types for tether
//!
//! This crate provides the namespace configuration store and common
//! utilities used by the client, session, and CLI crates.

pub mod config;
pub mod error;
pub mod time;

pub use config::{AgentRecord, ConfigStore, ControllerProfile, Namespace};
pub use error::ConfigError;
