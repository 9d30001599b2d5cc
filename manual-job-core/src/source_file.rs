//! Canonical transfer entry and its delivery projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discovered file, keyed by its slash-rooted path within the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub relative_path: String,
    pub size_in_bytes: u64,
    /// Only used for filtering; never sent with a delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_on: Option<DateTime<Utc>>,
}

/// The part of a [`SourceFile`] that crosses the delivery boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryObject {
    pub relative_path: String,
    pub size_in_bytes: u64,
}

/// Build a [`SourceFile`] from a raw listing record.
///
/// `path` must already be relative to the storage root and start with `/`; no
/// canonicalization happens here.
pub fn normalize(
    path: impl Into<String>,
    size_in_bytes: u64,
    last_modified_on: Option<DateTime<Utc>>,
) -> SourceFile {
    SourceFile {
        relative_path: path.into(),
        size_in_bytes,
        last_modified_on,
    }
}

impl SourceFile {
    pub fn to_delivery_object(&self) -> DeliveryObject {
        DeliveryObject {
            relative_path: self.relative_path.clone(),
            size_in_bytes: self.size_in_bytes,
        }
    }
}
