//! Configuration management for the tool broker.
//!
//! [`BrokerConfig`] carries the naming conventions and invocation policy knobs
//! the broker needs; [`loader`] reads it from JSON documents.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::BrokerConfig;
