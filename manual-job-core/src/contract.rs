//! # contract: interfaces to the external collaborators
//!
//! This module defines the traits the pipeline talks to, and the plain data types that travel
//! across them:
//! - [`Authenticator`]: turns configured credentials into a bearer token.
//! - [`JobService`]: creates jobs and submits deliveries on the transfer platform.
//! - [`Explorer`]: the remote file-browsing service (portals, permissions, folder listings).
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; the generated `Mock*` types are exported when the
//!   `test-export-mocks` feature is on (default) so the CLI crate's tests can use them too.
//!
//! ## Implementations
//! - The HTTP clients live in the CLI crate (`platform`, `explorer` modules).
//! - Methods return [`ServiceError`]; implementors convert transport and status failures into it.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::ServiceError;
use crate::job::{CreatedJob, DeliveryRequest, NewJob};

/// `Authorization` header value, e.g. `Bearer eyJ...`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        BearerToken(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Account and service the browsing calls are made against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerScope {
    pub account_id: String,
    pub service_id: String,
}

/// A logical storage root in the browsing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    #[serde(default)]
    pub portal_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Folders the authenticated member may access on a portal. The first entry is the home folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalPermissions {
    #[serde(default)]
    pub folders: Vec<FolderRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    pub id: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// One row of a remote folder listing.
///
/// Rows are read leniently: directories often carry a `null` size, and timestamps arrive
/// either as RFC 3339 text or as epoch milliseconds. A timestamp that is neither is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub path: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default, deserialize_with = "size_or_none")]
    pub size_in_bytes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_modified_on: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Other(IgnoredAny),
}

fn size_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<RawSize>::deserialize(deserializer)? {
        Some(RawSize::Bytes(bytes)) => Some(bytes),
        Some(RawSize::Other(_)) => {
            debug!("Ignoring sizeInBytes that is not a byte count");
            None
        }
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Option::<RawTimestamp>::deserialize(deserializer)? {
        Some(RawTimestamp::Millis(millis)) => {
            let parsed = DateTime::<Utc>::from_timestamp_millis(millis);
            if parsed.is_none() {
                debug!(millis, "Ignoring out-of-range lastModifiedOn");
            }
            parsed
        }
        Some(RawTimestamp::Text(text)) => match DateTime::parse_from_rfc3339(&text) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                debug!(value = %text, error = %e, "Ignoring unparseable lastModifiedOn");
                None
            }
        },
        Some(RawTimestamp::Other(_)) => {
            debug!("Ignoring lastModifiedOn of unexpected type");
            None
        }
        None => None,
    })
}

/// How a remote folder is addressed in a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderLocator {
    FolderId(String),
    BrowsePath(String),
}

impl fmt::Display for FolderLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderLocator::FolderId(id) => write!(f, "folder {id}"),
            FolderLocator::BrowsePath(path) => write!(f, "path {path}"),
        }
    }
}

/// Obtains a bearer token for the platform API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn create_token(&self) -> Result<BearerToken, ServiceError>;
}

/// Job endpoints of the transfer platform.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait JobService: Send + Sync {
    /// Create a job and return the platform's response.
    async fn create_job(&self, token: &BearerToken, job: &NewJob)
        -> Result<CreatedJob, ServiceError>;

    /// Submit the source files of one delivery for `job_id`. The response body is passed
    /// through untouched.
    async fn submit_delivery(
        &self,
        token: &BearerToken,
        job_id: &str,
        request: &DeliveryRequest,
    ) -> Result<serde_json::Value, ServiceError>;
}

/// The remote file-browsing service.
///
/// Implementations hold their own session; one value is built per run and passed to the
/// resolver and traverser explicitly.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Explorer: Send + Sync {
    async fn list_portals(&self, scope: &ExplorerScope) -> Result<Vec<Portal>, ServiceError>;

    async fn get_portal_permissions(
        &self,
        scope: &ExplorerScope,
        portal_id: &str,
    ) -> Result<PortalPermissions, ServiceError>;

    /// List the immediate children of one folder.
    async fn get_folder_content(
        &self,
        scope: &ExplorerScope,
        portal_id: &str,
        folder: &FolderLocator,
    ) -> Result<Vec<FolderEntry>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_debug_is_redacted() {
        let token = BearerToken::new("Bearer secret");
        assert_eq!(format!("{token:?}"), "BearerToken(<redacted>)");
        assert_eq!(token.as_str(), "Bearer secret");
    }

    #[test]
    fn folder_entry_accepts_sparse_rows() {
        let entry: FolderEntry =
            serde_json::from_str(r#"{"path":"/clips","isDirectory":true}"#).unwrap();
        assert!(entry.is_directory);
        assert_eq!(entry.size_in_bytes, None);
        assert!(entry.last_modified_on.is_none());
    }

    #[test]
    fn folder_entry_accepts_null_directory_size() {
        let entry: FolderEntry = serde_json::from_str(
            r#"{"path":"/clips","isDirectory":true,"sizeInBytes":null}"#,
        )
        .unwrap();
        assert!(entry.is_directory);
        assert_eq!(entry.size_in_bytes, None);
    }

    #[test]
    fn folder_entry_reads_epoch_millis_and_rfc3339() {
        let millis: FolderEntry = serde_json::from_str(
            r#"{"path":"/a.mov","isDirectory":false,"sizeInBytes":5,"lastModifiedOn":1704067200000}"#,
        )
        .unwrap();
        let text: FolderEntry = serde_json::from_str(
            r#"{"path":"/a.mov","isDirectory":false,"sizeInBytes":5,"lastModifiedOn":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(millis.size_in_bytes, Some(5));
        assert_eq!(
            millis.last_modified_on.map(|t| t.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
        assert_eq!(millis.last_modified_on, text.last_modified_on);
    }

    #[test]
    fn folder_entry_drops_unreadable_timestamps() {
        for raw in [r#""yesterday""#, "true", r#"{"at":1}"#, "null"] {
            let json = format!(r#"{{"path":"/a.mov","sizeInBytes":1,"lastModifiedOn":{raw}}}"#);
            let entry: FolderEntry = serde_json::from_str(&json).unwrap();
            assert!(entry.last_modified_on.is_none(), "{raw} should be dropped");
        }
    }
}
