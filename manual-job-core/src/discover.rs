//! Source discovery: where the files of a delivery come from.
//!
//! The strategy is fixed by configuration for the whole run:
//! - [`DiscoveryStrategy::Remote`]: resolve a portal, take the home folder from the portal
//!   permissions (or a configured browse path) and walk it through the browsing service.
//! - [`DiscoveryStrategy::Local`]: walk a directory on the local filesystem.
//!
//! [`discover`] reports why nothing was found; [`discover_or_empty`] applies the run policy
//! that discovery problems never fail a run and just yield an empty file set.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::contract::{Explorer, ExplorerScope, FolderLocator};
use crate::error::DiscoveryError;
use crate::filter::FilterConfig;
use crate::portal::{resolve_portal_id, PortalSelector};
use crate::source_file::SourceFile;
use crate::traverse::{traverse, LocalLister, RemoteLister};

/// `discovery` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum DiscoveryStrategy {
    Remote(RemoteDiscovery),
    Local(LocalDiscovery),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteDiscovery {
    #[serde(default)]
    pub portal_id: Option<String>,
    #[serde(default)]
    pub portal_url: Option<String>,
    #[serde(default)]
    pub portal_name: Option<String>,
    /// Start here instead of the home folder.
    #[serde(default)]
    pub browse_path: Option<String>,
}

impl RemoteDiscovery {
    pub fn portal_selector(&self) -> PortalSelector {
        PortalSelector {
            portal_id: self.portal_id.clone(),
            portal_url: self.portal_url.clone(),
            portal_name: self.portal_name.clone(),
        }
    }

    fn browse_path(&self) -> Option<&str> {
        self.browse_path.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocalDiscovery {
    #[serde(default)]
    pub root_path: Option<PathBuf>,
}

/// The browsing client for this run together with the account it browses.
#[derive(Clone, Copy)]
pub struct ExplorerSession<'a> {
    pub explorer: &'a dyn Explorer,
    pub scope: &'a ExplorerScope,
}

/// Result of a non-fatal discovery: the files, plus the failure that emptied them if any.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub files: Vec<SourceFile>,
    pub failure: Option<DiscoveryError>,
}

impl DiscoveryOutcome {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Discover the source files selected by `strategy` and `filter`.
///
/// `session` is only consulted by the remote strategy.
pub async fn discover(
    strategy: &DiscoveryStrategy,
    session: Option<ExplorerSession<'_>>,
    filter: &FilterConfig,
) -> Result<Vec<SourceFile>, DiscoveryError> {
    match strategy {
        DiscoveryStrategy::Remote(remote) => {
            let session = session.ok_or(DiscoveryError::MissingExplorer)?;
            discover_remote(remote, session, filter).await
        }
        DiscoveryStrategy::Local(local) => discover_local(local, filter).await,
    }
}

/// [`discover`], with any failure logged and turned into an empty file set.
pub async fn discover_or_empty(
    strategy: &DiscoveryStrategy,
    session: Option<ExplorerSession<'_>>,
    filter: &FilterConfig,
) -> DiscoveryOutcome {
    match discover(strategy, session, filter).await {
        Ok(files) => DiscoveryOutcome {
            files,
            failure: None,
        },
        Err(e) => {
            warn!(error = %e, "Source discovery failed, continuing with no source files");
            DiscoveryOutcome {
                files: Vec::new(),
                failure: Some(e),
            }
        }
    }
}

async fn discover_remote(
    remote: &RemoteDiscovery,
    session: ExplorerSession<'_>,
    filter: &FilterConfig,
) -> Result<Vec<SourceFile>, DiscoveryError> {
    info!("Finding source files via the browsing service");
    let portal_id = resolve_portal_id(&remote.portal_selector(), session.explorer, session.scope)
        .await?
        .ok_or(DiscoveryError::PortalNotFound)?;

    info!(portal_id = %portal_id, "Getting portal permissions");
    let permissions = session
        .explorer
        .get_portal_permissions(session.scope, &portal_id)
        .await?;
    debug!(?permissions, "Portal permissions");

    let home = permissions
        .folders
        .first()
        .filter(|folder| !folder.id.is_empty())
        .ok_or_else(|| DiscoveryError::NoHomeFolder {
            portal_id: portal_id.clone(),
        })?;

    let root = match remote.browse_path() {
        Some(path) => FolderLocator::BrowsePath(path.to_string()),
        None => FolderLocator::FolderId(home.id.clone()),
    };
    let lister = RemoteLister {
        explorer: session.explorer,
        scope: session.scope,
        portal_id: &portal_id,
    };
    traverse(&lister, root, filter).await
}

async fn discover_local(
    local: &LocalDiscovery,
    filter: &FilterConfig,
) -> Result<Vec<SourceFile>, DiscoveryError> {
    let root = local
        .root_path
        .as_ref()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(DiscoveryError::MissingLocalRoot)?;
    info!(root = %root.display(), "Finding source files on the local filesystem");
    let lister = LocalLister::new(root);
    traverse(&lister, root.clone(), filter).await
}
