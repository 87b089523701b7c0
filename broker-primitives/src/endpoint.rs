//! Model endpoint context.

use serde::{Deserialize, Serialize};

/// Identifies the model endpoint a request targets, so tool overrides can
/// tailor definitions per model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    family: String,
    model: String,
}

impl Endpoint {
    /// Creates an endpoint for the supplied model family and model id.
    #[must_use]
    pub fn new(family: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            model: model.into(),
        }
    }

    /// Returns the model family (e.g. `gpt`, `claude`).
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the concrete model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}
