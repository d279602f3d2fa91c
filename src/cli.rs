use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use crate::auth::SessionCookie;
use crate::config::{Config, OutputFormat};
use crate::output::{self, StepProgress};
use crate::providers::azdo::StatusFilter;
use crate::state::InsertionService;

#[derive(Parser)]
#[command(name = "vsinsertions")]
#[command(author, version, about = "Visual Studio insertion tracker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./vsinsertions.toml or the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Azure DevOps session cookie
    #[arg(long, global = true, env = "VSINSERTIONS_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Write JSON to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tracked source branches and their VS branches
    Branches,

    /// List insertion pull requests into a VS branch
    List {
        /// VS branch (defaults to the first tracked branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// `active` or `all`
        #[arg(short, long)]
        status: Option<StatusFilter>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Repository tag in the PR title
        #[arg(short, long)]
        repo: Option<String>,

        /// Resolve DDRIT and Speedometer results
        #[arg(long, default_value_t = false)]
        perf: bool,

        /// Print the pull request documents as received
        #[arg(long, default_value_t = false)]
        raw: bool,
    },

    /// Show the last insertion merged into a VS branch
    Last {
        /// Text the commit message must contain
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Abandon an active insertion pull request
    Abandon {
        #[arg(long)]
        id: String,

        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Write the effective configuration to a file
    Init {
        /// Destination; the extension picks the format (toml, json, yaml)
        #[arg(default_value = "vsinsertions.toml")]
        path: PathBuf,
    },
}

impl Cli {
    fn wants_json(&self, config: &Config) -> bool {
        self.json || self.output.is_some() || config.output.format == OutputFormat::Json
    }

    fn emit_json<T: Serialize>(&self, config: &Config, value: &T) -> Result<()> {
        let json_output = if self.pretty || config.output.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }

    /// The requested branch, else the first tracked branch, else the main branch.
    async fn target_branch(
        &self,
        service: &InsertionService,
        branch: Option<&str>,
    ) -> Result<String> {
        if let Some(branch) = branch {
            return Ok(branch.to_string());
        }

        let branches = with_progress("Fetching tracked branches", service.branches()).await?;
        let first = branches.and_then(|b| b.first()).map(|b| b.target_branch.clone());

        Ok(first.unwrap_or_else(|| service.config().manifest.main_branch.clone()))
    }

    async fn execute_branches(&self, service: &InsertionService) -> Result<()> {
        let branches = with_progress("Fetching tracked branches", service.branches())
            .await?
            .unwrap_or_default();

        if self.wants_json(service.config()) {
            self.emit_json(service.config(), &branches)
        } else {
            output::print_branches(branches);
            Ok(())
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_list(
        &self,
        service: &InsertionService,
        branch: Option<&str>,
        status: Option<StatusFilter>,
        skip: usize,
        repo: Option<&str>,
        perf: bool,
        raw: bool,
    ) -> Result<()> {
        let config = service.config();
        let target_branch = self.target_branch(service, branch).await?;
        let status = status.unwrap_or(config.defaults.status);
        let repository = repo.unwrap_or(&config.defaults.repository);

        let records = with_progress(
            "Fetching insertions",
            service.insertions(&target_branch, status, skip, repository),
        )
        .await?;

        if raw {
            for record in &records {
                println!("{}", record.raw_json());
            }
            return Ok(());
        }

        if perf {
            if let Some(provider) = service.provider() {
                for record in &records {
                    record.request_performance_summary(provider.summary_resolver());
                }
                let progress = StepProgress::start("Resolving performance summaries");
                provider.resolve_performance_summaries(&records).await;
                progress.finish("Resolved performance summaries");
            }
        }

        let snapshots: Vec<_> = records.iter().map(|r| r.snapshot()).collect();
        if self.wants_json(config) {
            self.emit_json(config, &snapshots)
        } else {
            output::print_insertions(&target_branch, &snapshots);
            Ok(())
        }
    }

    async fn execute_last(
        &self,
        service: &InsertionService,
        filter: Option<&str>,
        branch: Option<&str>,
    ) -> Result<()> {
        let config = service.config();
        let target_branch = self.target_branch(service, branch).await?;
        let filter = filter.unwrap_or(&config.defaults.commit_filter);

        let commit = with_progress(
            "Searching commits",
            service.last_insertion(filter, &target_branch),
        )
        .await?;

        if self.wants_json(config) {
            self.emit_json(config, &commit)
        } else {
            output::print_last_insertion(&target_branch, commit.as_ref());
            Ok(())
        }
    }

    async fn execute_abandon(
        &self,
        service: &InsertionService,
        id: &str,
        branch: Option<&str>,
    ) -> Result<()> {
        let Some(provider) = service.provider() else {
            bail!("Abandoning requires a session cookie (--cookie or VSINSERTIONS_COOKIE)");
        };

        let config = service.config();
        let target_branch = self.target_branch(service, branch).await?;
        let records = with_progress(
            "Fetching active insertions",
            service.insertions(
                &target_branch,
                StatusFilter::Active,
                0,
                &config.defaults.repository,
            ),
        )
        .await?;

        let Some(record) = records.iter().find(|r| r.pull_request_id() == id) else {
            bail!("No active insertion {id} into {target_branch}");
        };

        with_progress("Abandoning pull request", record.abandon(provider.client())).await?;

        let snapshot = record.snapshot();
        if self.wants_json(config) {
            self.emit_json(config, &snapshot)
        } else {
            output::print_abandoned(&snapshot);
            Ok(())
        }
    }

    fn execute_init(&self, config: &Config, path: &Path) -> Result<()> {
        config.save(path)?;
        info!("Configuration written to: {}", path.display());
        println!("Configuration written to {}", path.display());
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let mut service = InsertionService::new(config);
        service.set_cookie(self.cookie.as_deref().map(SessionCookie::from))?;

        if !service.is_authenticated() {
            warn!("No session cookie set; remote data will not be loaded");
        }

        match &self.command {
            Commands::Branches => self.execute_branches(&service).await,
            Commands::List {
                branch,
                status,
                skip,
                repo,
                perf,
                raw,
            } => {
                self.execute_list(
                    &service,
                    branch.as_deref(),
                    *status,
                    *skip,
                    repo.as_deref(),
                    *perf,
                    *raw,
                )
                .await
            }
            Commands::Last { filter, branch } => {
                self.execute_last(&service, filter.as_deref(), branch.as_deref())
                    .await
            }
            Commands::Abandon { id, branch } => {
                self.execute_abandon(&service, id, branch.as_deref()).await
            }
            Commands::Init { path } => self.execute_init(service.config(), path),
        }
    }
}

async fn with_progress<T>(
    message: &str,
    task: impl Future<Output = crate::error::Result<T>>,
) -> Result<T> {
    let progress = StepProgress::start(message);
    match task.await {
        Ok(value) => {
            progress.finish(message);
            Ok(value)
        }
        Err(e) => {
            progress.fail(message);
            Err(e.into())
        }
    }
}
