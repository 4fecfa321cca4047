//! shields.io endpoint badge documents
//!
//! See <https://shields.io/badges/endpoint-badge> for the schema consumed by
//! the badge renderer.

use crate::aggregate::Aggregation;
use serde::{Deserialize, Serialize};

/// Only schema version shields.io understands
pub const SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub schema_version: u8,
    pub label: String,
    /// Rendered as `healthy/total`
    pub message: String,
    pub color: String,
}

impl Badge {
    pub fn new(label: impl Into<String>, result: &Aggregation) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            label: label.into(),
            message: format!("{}/{}", result.healthy, result.total),
            color: result.color.badge_color().to_string(),
        }
    }
}

/// Badge label for a resource kind in an environment, e.g. `pods(staging)`
pub fn label(resource: &str, environment: &str) -> String {
    format!("{}({})", resource, environment)
}
