use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;

use super::client::AzdoClient;
use super::links::{pull_request_url, short_branch_name};
use super::perf_summary::{PerformanceSummary, PerformanceSummaryResolver};
use super::title::ParsedTitle;
use super::types::{AzdoPullRequest, AzdoReviewer};
use crate::error::{Result, VsInsertionsError};

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    Active,
    Completed,
    Abandoned,
}

impl FromStr for PullRequestStatus {
    type Err = VsInsertionsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(VsInsertionsError::ParseFailure(format!(
                "unknown pull request status {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

/// Server-side status filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    #[default]
    Active,
}

impl StatusFilter {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            other => Err(format!("unknown status filter {other:?} (expected all or active)")),
        }
    }
}

/// Reviewer vote as reported by Azure DevOps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Vote {
    Approved,
    ApprovedWithSuggestions,
    NoVote,
    WaitingForAuthor,
    Rejected,
}

impl TryFrom<i64> for Vote {
    type Error = VsInsertionsError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            10 => Ok(Self::Approved),
            5 => Ok(Self::ApprovedWithSuggestions),
            0 => Ok(Self::NoVote),
            -5 => Ok(Self::WaitingForAuthor),
            -10 => Ok(Self::Rejected),
            other => Err(VsInsertionsError::UnrecognizedVote(other)),
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Approved => "Approved",
            Self::ApprovedWithSuggestions => "Approved with suggestions",
            Self::NoVote => "No vote",
            Self::WaitingForAuthor => "Waiting for author",
            Self::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerVote {
    pub display_name: String,
    pub avatar_url: String,
    pub vote: Vote,
}

impl TryFrom<AzdoReviewer> for ReviewerVote {
    type Error = VsInsertionsError;

    fn try_from(reviewer: AzdoReviewer) -> Result<Self> {
        Ok(Self {
            vote: Vote::try_from(reviewer.vote)?,
            display_name: reviewer.display_name,
            avatar_url: reviewer.image_url,
        })
    }
}

/// Serializable point-in-time view of an [`InsertionRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct InsertionSnapshot {
    pub pull_request_id: String,
    pub url: String,
    pub title: String,
    pub repository: String,
    pub source_branch: String,
    pub build_number: String,
    pub target_branch: String,
    /// Target named in the title; empty for non-insertion titles
    pub title_target: String,
    pub status: PullRequestStatus,
    pub is_draft: bool,
    pub is_abandoning: bool,
    pub reviewers: Vec<ReviewerVote>,
    pub performance: Option<PerformanceSummary>,
}

/// One insertion pull request and everything derived from it.
///
/// Fields read from the remote PR are fixed at construction. The only
/// mutable state is the lifecycle status (Active to Abandoned through
/// [`abandon`](Self::abandon)), the in-flight abandon flag and the
/// performance summary, which resolves at most once per record.
pub struct InsertionRecord {
    pull_request_id: String,
    title: String,
    parsed_title: OnceLock<ParsedTitle>,
    target_branch_ref: String,
    is_draft: bool,
    reviewers: Vec<ReviewerVote>,
    web_url: String,
    raw: Value,
    status: Mutex<PullRequestStatus>,
    abandoning: AtomicBool,
    summary_requested: AtomicBool,
    summary: Arc<OnceCell<PerformanceSummary>>,
}

impl InsertionRecord {
    /// Build a record from a raw pull request document.
    ///
    /// # Errors
    ///
    /// Returns `ParseFailure` if a required field is missing or the status is
    /// unknown. Reviewers with an unrecognized vote are dropped with a
    /// warning instead of failing the record.
    pub fn from_json(raw: Value, web_url: &str) -> Result<Self> {
        let pr: AzdoPullRequest = serde_json::from_value(raw.clone())?;
        let pull_request_id = pr.pull_request_id.to_string();
        let status: PullRequestStatus = pr.status.parse()?;

        let reviewers = pr
            .reviewers
            .into_iter()
            .filter_map(|reviewer| {
                let name = reviewer.display_name.clone();
                ReviewerVote::try_from(reviewer)
                    .inspect_err(|e| {
                        warn!("Skipping reviewer {name} on pull request {pull_request_id}: {e}");
                    })
                    .ok()
            })
            .collect();

        Ok(Self {
            web_url: pull_request_url(web_url, &pull_request_id),
            pull_request_id,
            title: pr.title,
            parsed_title: OnceLock::new(),
            target_branch_ref: pr.target_ref_name,
            is_draft: pr.is_draft,
            reviewers,
            raw,
            status: Mutex::new(status),
            abandoning: AtomicBool::new(false),
            summary_requested: AtomicBool::new(false),
            summary: Arc::new(OnceCell::new()),
        })
    }

    pub fn pull_request_id(&self) -> &str {
        &self.pull_request_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.web_url
    }

    /// Title fields, parsed on first access.
    pub fn parsed_title(&self) -> &ParsedTitle {
        self.parsed_title
            .get_or_init(|| ParsedTitle::parse(&self.title))
    }

    pub fn repository(&self) -> &str {
        &self.parsed_title().repo_tag
    }

    pub fn source_branch(&self) -> &str {
        &self.parsed_title().source_branch
    }

    pub fn build_number(&self) -> &str {
        &self.parsed_title().build_number
    }

    pub fn target_branch_ref(&self) -> &str {
        &self.target_branch_ref
    }

    pub fn is_draft(&self) -> bool {
        self.is_draft
    }

    pub fn reviewers(&self) -> &[ReviewerVote] {
        &self.reviewers
    }

    pub fn status(&self) -> PullRequestStatus {
        *self.lock_status()
    }

    pub fn is_abandoning(&self) -> bool {
        self.abandoning.load(Ordering::Acquire)
    }

    /// The PR document exactly as received, pretty-printed.
    pub fn raw_json(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_else(|_| self.raw.to_string())
    }

    /// Abandon the pull request.
    ///
    /// Only one abandon may be in flight per record; a concurrent call fails
    /// with `AbandonInProgress` without touching the remote. The status
    /// changes only after the remote accepted the update.
    ///
    /// # Errors
    ///
    /// - `AbandonInProgress` if another abandon is running
    /// - `InvalidTransition` if the PR is not active
    /// - `RemoteRejected` if the remote answered with a non-success status
    /// - `RemoteUnavailable` on transport failure
    pub async fn abandon(&self, client: &AzdoClient) -> Result<()> {
        let Some(_guard) = AbandoningGuard::acquire(&self.abandoning) else {
            return Err(VsInsertionsError::AbandonInProgress(
                self.pull_request_id.clone(),
            ));
        };

        let current = self.status();
        if current != PullRequestStatus::Active {
            return Err(VsInsertionsError::InvalidTransition {
                id: self.pull_request_id.clone(),
                status: current.to_string(),
            });
        }

        info!("Abandoning pull request {}", self.pull_request_id);
        client.abandon_pull_request(&self.pull_request_id).await?;

        *self.lock_status() = PullRequestStatus::Abandoned;
        info!("Abandoned pull request {}", self.pull_request_id);

        Ok(())
    }

    /// Start resolving the performance summary in the background.
    ///
    /// Returns `false` if resolution was already requested; the existing
    /// request is left alone.
    pub fn request_performance_summary(&self, resolver: &Arc<PerformanceSummaryResolver>) -> bool {
        if self.summary_requested.swap(true, Ordering::AcqRel) {
            return false;
        }

        let cell = Arc::clone(&self.summary);
        let resolver = Arc::clone(resolver);
        let pull_request_id = self.pull_request_id.clone();

        tokio::spawn(async move {
            cell.get_or_init(|| resolver.fetch(&pull_request_id)).await;
        });

        true
    }

    /// Resolve the performance summary, sharing any fetch already in flight.
    pub async fn resolve_performance_summary(
        &self,
        resolver: &PerformanceSummaryResolver,
    ) -> PerformanceSummary {
        self.summary_requested.store(true, Ordering::Release);
        self.summary
            .get_or_init(|| resolver.fetch(&self.pull_request_id))
            .await
            .clone()
    }

    /// Current summary: `None` until requested, then a not-yet-loaded
    /// placeholder until the fetch finishes.
    pub fn performance_summary(&self) -> Option<PerformanceSummary> {
        if !self.summary_requested.load(Ordering::Acquire) {
            return None;
        }

        Some(
            self.summary
                .get()
                .cloned()
                .unwrap_or_else(PerformanceSummary::loading),
        )
    }

    pub fn snapshot(&self) -> InsertionSnapshot {
        InsertionSnapshot {
            pull_request_id: self.pull_request_id.clone(),
            url: self.url().to_string(),
            title: self.title().to_string(),
            repository: self.repository().to_string(),
            source_branch: self.source_branch().to_string(),
            build_number: self.build_number().to_string(),
            target_branch: short_branch_name(self.target_branch_ref()).to_string(),
            title_target: self.parsed_title().target_branch.clone(),
            status: self.status(),
            is_draft: self.is_draft(),
            is_abandoning: self.is_abandoning(),
            reviewers: self.reviewers().to_vec(),
            performance: self.performance_summary(),
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, PullRequestStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for InsertionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertionRecord")
            .field("pull_request_id", &self.pull_request_id)
            .field("title", &self.title)
            .field("status", &self.status())
            .field("is_abandoning", &self.is_abandoning())
            .finish_non_exhaustive()
    }
}

/// Holds the abandoning flag for the lifetime of one abandon call.
struct AbandoningGuard<'a>(&'a AtomicBool);

impl<'a> AbandoningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for AbandoningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
