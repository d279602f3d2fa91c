use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Envelope every Azure DevOps list endpoint wraps its items in.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub value: Vec<T>,
}

/// A pull request as returned by the `pullrequests` endpoint.
///
/// Only the fields the tracker reads are modelled; the full document is kept
/// separately for the raw JSON view.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzdoPullRequest {
    pub pull_request_id: i64,
    pub title: String,
    /// "active", "completed" or "abandoned"
    pub status: String,
    #[serde(default)]
    pub is_draft: bool,
    /// Full ref, e.g. `refs/heads/main`
    pub target_ref_name: String,
    #[serde(default)]
    pub reviewers: Vec<AzdoReviewer>,
}

/// A reviewer entry with its raw integer vote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzdoReviewer {
    pub display_name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub vote: i64,
}

/// A commit as returned by the `commits` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzdoCommit {
    pub commit_id: Option<String>,
    pub committer: Option<AzdoCommitUser>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub remote_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzdoCommitUser {
    pub date: Option<DateTime<FixedOffset>>,
}

/// A PR discussion thread; comments are in creation order.
#[derive(Debug, Clone, Deserialize)]
pub struct AzdoThread {
    #[serde(default)]
    pub comments: Vec<AzdoComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzdoComment {
    pub author: Option<AzdoIdentity>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzdoIdentity {
    pub display_name: String,
}

impl AzdoComment {
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.display_name.as_str())
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}
