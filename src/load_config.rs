/// `load_config` module: loads the static YAML config file into strongly-typed settings.
///
/// This is the only place where user-supplied YAML is parsed. Secrets (platform client
/// credentials, browsing-service password) are never read from the file; the clients pick
/// them up from the environment when they are constructed (see `platform` and `explorer`).
///
/// # Responsibilities
/// - Parse the YAML file into the core crate's settings types
/// - Compile filter patterns and dates up front, so a typo fails before any network call
/// - Check that the remote strategy has an `explorer` section to browse with
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use manual_job_core::contract::ExplorerScope;
use manual_job_core::discover::DiscoveryStrategy;
use manual_job_core::filter::{FilterConfig, FilterSection};
use manual_job_core::job::JobSettings;
use manual_job_core::pipeline::ManualJobConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug)]
pub struct CliConfig {
    /// Base URL of the transfer platform API.
    pub platform_api: String,
    /// Present whenever the remote strategy is selected.
    pub explorer: Option<ExplorerSettings>,
    pub manual_job: ManualJobConfig,
}

/// `explorer` section: where and as whom to browse.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerSettings {
    pub api: String,
    pub account_id: String,
    pub service_id: String,
    pub username: String,
}

impl ExplorerSettings {
    pub fn scope(&self) -> ExplorerScope {
        ExplorerScope {
            account_id: self.account_id.clone(),
            service_id: self.service_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    platform_api: String,
    #[serde(default)]
    job: JobSettings,
    #[serde(default)]
    explorer: Option<ExplorerSettings>,
    discovery: DiscoveryStrategy,
    #[serde(default)]
    filters: FilterSection,
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let filters = match FilterConfig::compile(&raw.filters) {
        Ok(filters) => filters,
        Err(e) => {
            error!(error = %e, "Invalid filters in config");
            return Err(anyhow::anyhow!("Invalid filters in config: {e}"));
        }
    };

    let explorer = match &raw.discovery {
        DiscoveryStrategy::Remote(_) => match raw.explorer {
            Some(explorer) => Some(explorer),
            None => {
                error!("Remote discovery selected without an explorer section");
                anyhow::bail!("discovery.strategy is remote but the explorer section is missing");
            }
        },
        DiscoveryStrategy::Local(_) => None,
    };

    info!(
        platform_api = %raw.platform_api,
        strategy = ?raw.discovery,
        job_id = raw.job.existing_job_id().unwrap_or("<new>"),
        "Config loaded successfully"
    );

    Ok(CliConfig {
        platform_api: raw.platform_api,
        explorer,
        manual_job: ManualJobConfig {
            job: raw.job,
            discovery: raw.discovery,
            filters,
        },
    })
}
