//! Correlation identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

const MAX_LEN: usize = 128;

/// Identifier tying an invocation's lifecycle events back to the request that
/// caused it.
///
/// Host-supplied identifiers are opaque strings; locally generated ones are
/// UUID v4 values.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wraps an existing identifier after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCorrelationId`] when the identifier is blank or
    /// longer than the supported maximum.
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidCorrelationId {
                reason: "identifier cannot be empty".into(),
            });
        }
        if id.len() > MAX_LEN {
            return Err(Error::InvalidCorrelationId {
                reason: format!("identifier length must be <= {MAX_LEN}"),
            });
        }
        Ok(Self(id))
    }

    /// Generates a random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl From<CorrelationId> for String {
    fn from(value: CorrelationId) -> Self {
        value.0
    }
}

impl FromStr for CorrelationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
