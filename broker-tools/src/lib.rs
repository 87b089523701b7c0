//! Tool discovery, naming, and ownership.
//!
//! The modules exposed here wrap the host's live tool list in a
//! canonicalizing cache, map raw host names to canonical names, and resolve
//! which tools the broker owns or lets extensions override.

#![warn(missing_docs, clippy::pedantic)]

pub mod catalog;
pub mod host;
pub mod names;
pub mod ownership;
