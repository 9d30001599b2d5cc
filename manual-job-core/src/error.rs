//! Error types shared by the discovery and delivery pipeline.

use thiserror::Error;

/// Why source discovery produced no files.
///
/// Discovery failures are never fatal to a run: the pipeline degrades them to an empty
/// file set (see [`crate::discover::discover_or_empty`]), but keeps the cause around so
/// callers and tests can tell "nothing matched" from "something went wrong".
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// No portal id was configured and no listed portal matched the configured URL or name.
    #[error("portal not found")]
    PortalNotFound,

    /// The portal permissions listed no folders, so there is no home folder to start from.
    #[error("no home folder in permissions for portal {portal_id}")]
    NoHomeFolder { portal_id: String },

    /// Local discovery was selected without a root path.
    #[error("no root path configured for the source storage location")]
    MissingLocalRoot,

    /// Remote discovery was selected but no browsing client was supplied.
    #[error("remote discovery requires an explorer client")]
    MissingExplorer,

    /// A call to the remote browsing service failed.
    #[error("explorer call failed: {0}")]
    Explorer(#[from] ServiceError),

    /// Listing a folder failed mid-traversal.
    #[error("failed to list {location}: {message}")]
    Listing { location: String, message: String },
}

/// Error returned by any external service client.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request never produced a response (connect, TLS, timeout, body decode).
    #[error("http error: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("{status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The service answered successfully but the body was missing required fields.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Fatal pipeline failures. Discovery problems are not represented here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("authentication failed: {0}")]
    Authentication(#[source] ServiceError),

    #[error("job creation failed: {0}")]
    JobCreation(#[source] ServiceError),

    #[error("delivery submission failed for job {job_id}: {source}")]
    Delivery {
        job_id: String,
        #[source]
        source: ServiceError,
    },
}
