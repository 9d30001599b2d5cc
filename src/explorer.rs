//! Browsing-service client: implements the core [`Explorer`] trait over the service's REST API.
//!
//! One [`ExplorerClient`] is built per run from the `explorer` config section plus the
//! `EXPLORER_PASSWORD` environment variable, and handed to discovery explicitly. Every call
//! authenticates with HTTP basic auth.

use async_trait::async_trait;
use manual_job_core::contract::{
    Explorer, ExplorerScope, FolderEntry, FolderLocator, Portal, PortalPermissions,
};
use manual_job_core::error::ServiceError;
use reqwest::Url;
use serde::Deserialize;
use std::env;

use crate::http::{endpoint_url, send_json};
use crate::load_config::ExplorerSettings;

/// Collection responses come either wrapped as `{"items": [...]}` or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    Wrapped { items: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Collection<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collection::Wrapped { items } => items,
            Collection::Bare(items) => items,
        }
    }
}

pub struct ExplorerClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ExplorerClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ExplorerClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn new_from_env(
        settings: &ExplorerSettings,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();
        match env::var("EXPLORER_PASSWORD") {
            Ok(password) => {
                tracing::info!(
                    api = %settings.api,
                    username = %settings.username,
                    "Initialized ExplorerClient from environment"
                );
                Ok(Self::new(&settings.api, &settings.username, password))
            }
            Err(e) => {
                tracing::error!(error = ?e, "EXPLORER_PASSWORD missing in environment");
                Err(format!("EXPLORER_PASSWORD: {e}").into())
            }
        }
    }

    /// `/v1/accounts/{account}/services/{service}/...`, every id encoded as its own segment.
    fn service_url(&self, scope: &ExplorerScope, path: &[&str]) -> Result<Url, ServiceError> {
        let mut segments = vec![
            "v1",
            "accounts",
            scope.account_id.as_str(),
            "services",
            scope.service_id.as_str(),
        ];
        segments.extend_from_slice(path);
        endpoint_url(&self.base_url, &segments)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
    }
}

#[async_trait]
impl Explorer for ExplorerClient {
    async fn list_portals(&self, scope: &ExplorerScope) -> Result<Vec<Portal>, ServiceError> {
        let url = self.service_url(scope, &["portals"])?;
        tracing::info!(url = %url, "Listing portals");
        let portals: Collection<Portal> = send_json(self.get(url)).await?;
        let portals = portals.into_vec();
        tracing::info!(count = portals.len(), "Fetched portals");
        Ok(portals)
    }

    async fn get_portal_permissions(
        &self,
        scope: &ExplorerScope,
        portal_id: &str,
    ) -> Result<PortalPermissions, ServiceError> {
        let url = self.service_url(scope, &["portals", portal_id, "permissions"])?;
        tracing::info!(url = %url, "Fetching portal permissions");
        send_json(self.get(url)).await
    }

    async fn get_folder_content(
        &self,
        scope: &ExplorerScope,
        portal_id: &str,
        folder: &FolderLocator,
    ) -> Result<Vec<FolderEntry>, ServiceError> {
        let url = self.service_url(scope, &["portals", portal_id, "files"])?;
        let query = match folder {
            FolderLocator::FolderId(id) => [("folderId", id.as_str())],
            FolderLocator::BrowsePath(path) => [("browsePath", path.as_str())],
        };
        tracing::debug!(url = %url, %folder, "Listing folder content");
        let entries: Collection<FolderEntry> = send_json(self.get(url).query(&query)).await?;
        Ok(entries.into_vec())
    }
}
