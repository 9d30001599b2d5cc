//! Decide which portal to browse.

use tracing::{debug, info};

use crate::contract::{Explorer, ExplorerScope, Portal};
use crate::error::DiscoveryError;

/// Portal selection as configured. `portal_id` wins; otherwise the first listed portal whose
/// URL or name equals the configured value is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalSelector {
    pub portal_id: Option<String>,
    pub portal_url: Option<String>,
    pub portal_name: Option<String>,
}

fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl PortalSelector {
    fn matches(&self, portal: &Portal) -> bool {
        let by_url = configured(&self.portal_url)
            .is_some_and(|url| portal.url.as_deref() == Some(url));
        let by_name = configured(&self.portal_name)
            .is_some_and(|name| portal.name.as_deref() == Some(name));
        by_url || by_name
    }
}

/// First portal in `portals` matching the selector's URL or name. Portals without an id are
/// skipped.
pub fn find_portal<'a>(selector: &PortalSelector, portals: &'a [Portal]) -> Option<&'a Portal> {
    portals
        .iter()
        .find(|portal| selector.matches(portal) && !portal.portal_id.is_empty())
}

/// Resolve the portal id to browse.
///
/// Returns `Ok(None)` when nothing is configured or nothing matches; a failed portal listing
/// is an error.
pub async fn resolve_portal_id(
    selector: &PortalSelector,
    explorer: &dyn Explorer,
    scope: &ExplorerScope,
) -> Result<Option<String>, DiscoveryError> {
    if let Some(portal_id) = configured(&selector.portal_id) {
        debug!(portal_id, "Using configured portal id");
        return Ok(Some(portal_id.to_string()));
    }
    if configured(&selector.portal_url).is_none() && configured(&selector.portal_name).is_none() {
        debug!("No portal id, URL or name configured");
        return Ok(None);
    }

    info!(
        account_id = %scope.account_id,
        service_id = %scope.service_id,
        "Getting portals"
    );
    let portals = explorer.list_portals(scope).await?;
    let found = find_portal(selector, &portals);
    match found {
        Some(portal) => info!(portal = ?portal, "Portal found"),
        None => info!(count = portals.len(), "No listed portal matched the configured URL or name"),
    }
    Ok(found.map(|portal| portal.portal_id.clone()))
}
