use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use log::{debug, info};
use serde::Serialize;

use crate::auth::SessionCookie;
use crate::config::Config;
use crate::error::Result;

use super::client::AzdoClient;
use super::insertion::{InsertionRecord, StatusFilter};
use super::perf_summary::{PerformanceSummary, PerformanceSummaryResolver};

/// The most recent insertion commit found on a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitDetails {
    pub commit_id: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub comment: String,
    pub url: String,
}

/// Azure DevOps insertion provider.
///
/// Lists insertion PRs for a target branch, resolves their performance
/// summaries and finds the last merged insertion on a branch.
pub struct AzdoProvider {
    client: Arc<AzdoClient>,
    resolver: Arc<PerformanceSummaryResolver>,
}

impl AzdoProvider {
    /// Creates a provider for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs or the cookie header are invalid.
    pub fn new(config: &Config, cookie: Option<&SessionCookie>) -> Result<Self> {
        let client = Arc::new(AzdoClient::new(&config.azdo, cookie)?);
        let resolver = Arc::new(PerformanceSummaryResolver::new(
            Arc::clone(&client),
            config.perf.clone(),
        ));

        Ok(Self { client, resolver })
    }

    pub fn client(&self) -> &AzdoClient {
        &self.client
    }

    pub fn summary_resolver(&self) -> &Arc<PerformanceSummaryResolver> {
        &self.resolver
    }

    /// Lists insertion PRs into `target_branch` whose title names `repository`.
    ///
    /// The repository tag only exists inside the PR title, so that filter is
    /// applied after the page has been fetched.
    ///
    /// # Arguments
    ///
    /// * `target_branch` - Integration branch name (e.g., "main", "rel/d17.10")
    /// * `status` - Server-side status filter
    /// * `skip` - Number of PRs to skip (pagination offset)
    /// * `repository` - Repository tag expected in the title (e.g., "Roslyn")
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or any PR document is malformed.
    pub async fn list_insertions(
        &self,
        target_branch: &str,
        status: StatusFilter,
        skip: usize,
        repository: &str,
    ) -> Result<Vec<InsertionRecord>> {
        info!(
            "Fetching {} insertions into {target_branch} (skip {skip})",
            status.as_query()
        );

        let items = self
            .client
            .fetch_pull_requests(target_branch, status, skip)
            .await?;
        let fetched = items.len();

        let web_url = &self.client.config().web_url;
        let records = items
            .into_iter()
            .map(|raw| InsertionRecord::from_json(raw, web_url))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|record| {
                if !record.parsed_title().is_match() {
                    debug!(
                        "Skipping pull request {} with non-insertion title",
                        record.pull_request_id()
                    );
                }
                record.repository() == repository
            })
            .collect::<Vec<_>>();

        info!(
            "Found {} {repository} insertions out of {fetched} pull requests",
            records.len()
        );

        Ok(records)
    }

    /// Resolves the performance summaries of all `records` concurrently.
    pub async fn resolve_performance_summaries(
        &self,
        records: &[InsertionRecord],
    ) -> Vec<PerformanceSummary> {
        let futures = records
            .iter()
            .map(|record| record.resolve_performance_summary(&self.resolver));

        futures::future::join_all(futures).await
    }

    /// Finds the newest commit on `target_branch` whose message contains
    /// `message_filter`.
    ///
    /// Returns `Ok(None)` when no commit matches.
    pub async fn find_last_insertion(
        &self,
        message_filter: &str,
        target_branch: &str,
    ) -> Result<Option<CommitDetails>> {
        let commits = self.client.fetch_commits(target_branch).await?;
        debug!("Scanning {} commits on {target_branch}", commits.len());

        let found = commits
            .into_iter()
            .find(|commit| commit.comment.contains(message_filter))
            .map(|commit| CommitDetails {
                commit_id: commit.commit_id,
                date: commit.committer.and_then(|c| c.date),
                comment: commit.comment,
                url: commit.remote_url,
            });

        if found.is_none() {
            info!("No commit matching {message_filter:?} found on {target_branch}");
        }

        Ok(found)
    }
}
