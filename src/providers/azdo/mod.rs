mod client;
mod insertion;
mod links;
mod perf_summary;
mod provider;
mod title;
mod types;


pub use client::AzdoClient;
pub(crate) use client::{anonymous_client, get_json_with};
pub use insertion::{
    InsertionRecord, InsertionSnapshot, PullRequestStatus, ReviewerVote, StatusFilter, Vote,
};
pub use perf_summary::{PerformanceSummary, RunResult};
pub use provider::{AzdoProvider, CommitDetails};
