//! Shared request plumbing for the HTTP clients.

use manual_job_core::error::ServiceError;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Send `request` and decode a JSON success body. Non-2xx answers become
/// [`ServiceError::Status`] carrying the response body.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ServiceError> {
    let response = request
        .send()
        .await
        .map_err(|e| ServiceError::Http(e.to_string()))?;
    let status = response.status();
    let url = response.url().to_string();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        tracing::error!(status = %status, url = %url, body = %body, "API returned error");
        return Err(ServiceError::Status {
            status: status.as_u16(),
            url,
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::InvalidResponse(format!("{url}: {e}")))
}

/// `base` extended by `segments`, each percent-encoded as a single path segment. An empty
/// final segment keeps a trailing slash.
pub(crate) fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url, ServiceError> {
    let mut url =
        Url::parse(base).map_err(|e| ServiceError::Http(format!("invalid base URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ServiceError::Http(format!("base URL {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
