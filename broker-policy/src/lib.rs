//! Per-request tool enablement.
//!
//! [`EnablementEngine`] decides, for every tool in the catalog, whether it may
//! run for a given chat request. Explicit picker denial is absolute; a
//! caller filter comes next; tag-based unlocking and late-arriving tools only
//! apply where the picker said nothing; the default is deny.

#![warn(missing_docs, clippy::pedantic)]

pub mod contracts;
pub mod decision;
pub mod engine;
pub mod observer;

pub use contracts::{ChatRequest, ToolFilter, ToolReference};
pub use decision::{EnablementDecision, EnablementRule};
pub use engine::EnablementEngine;
pub use observer::{CompositeDecisionObserver, DecisionObserver, TracingDecisionObserver};
