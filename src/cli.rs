/// # manual-job CLI Interface (Module)
///
/// Command parsing and the async `run` entrypoint. All discovery and pipeline logic lives in
/// `manual-job-core`; this module loads config, builds the HTTP clients and prints results.
///
/// ## How To Use
/// - Command line: `manual-job run --config job.yaml` or `manual-job discover --config job.yaml`.
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
use crate::explorer::ExplorerClient;
use crate::load_config::{load_config, CliConfig};
use crate::platform::PlatformClient;
use anyhow::Result;
use clap::{Parser, Subcommand};
use manual_job_core::contract::ExplorerScope;
use manual_job_core::discover::{discover, ExplorerSession};
use manual_job_core::pipeline::run_manual_job;
use std::path::PathBuf;

/// CLI for manual-job: discover source files and trigger a transfer job delivery.
#[derive(Parser)]
#[clap(
    name = "manual-job",
    version,
    about = "Create and trigger a manual transfer job from remote or local source files"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate, create the job if needed, discover source files and submit a delivery
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Only discover and print the source files a run would deliver
    Discover {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

fn explorer_client(config: &CliConfig) -> Result<Option<(ExplorerClient, ExplorerScope)>> {
    match &config.explorer {
        Some(settings) => {
            let client = ExplorerClient::new_from_env(settings)
                .map_err(|e| anyhow::anyhow!("Failed to construct explorer client: {e}"))?;
            Ok(Some((client, settings.scope())))
        }
        None => Ok(None),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let result = match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "run", "Starting manual job");
            let platform = PlatformClient::new_from_env(config.platform_api.clone())
                .map_err(|e| anyhow::anyhow!("Failed to construct platform client: {e}"))?;
            let explorer = explorer_client(&config)?;
            let session = explorer.as_ref().map(|(client, scope)| ExplorerSession {
                explorer: client,
                scope,
            });

            match run_manual_job(&config.manual_job, &platform, &platform, session).await {
                Ok(report) => {
                    tracing::info!(command = "run", ?report, "Manual job complete");
                    println!("Job: {}", report.job_id);
                    if let Some(failure) = &report.discovery_failure {
                        println!("Source discovery failed: {failure}");
                    }
                    match &report.delivery {
                        Some(delivery) => {
                            println!(
                                "Delivered {} source file(s). Delivery response:\n{:#}",
                                report.source_files.len(),
                                delivery
                            );
                        }
                        None => println!("No source files found, nothing delivered."),
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "run", error = %e, "Manual job failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Discover { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "discover", "Discovering source files");
            let explorer = explorer_client(&config)?;
            let session = explorer.as_ref().map(|(client, scope)| ExplorerSession {
                explorer: client,
                scope,
            });

            match discover(
                &config.manual_job.discovery,
                session,
                &config.manual_job.filters,
            )
            .await
            {
                Ok(files) => {
                    tracing::info!(command = "discover", count = files.len(), "Discovery complete");
                    println!("{}", serde_json::to_string_pretty(&files)?);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "discover", error = %e, "Discovery failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    };

    let exit_span = tracing::info_span!("exit");
    exit_span.in_scope(|| {
        tracing::info!(success = result.is_ok(), "exit");
    });

    result
}
