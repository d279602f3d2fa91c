use serde_json::{json, Value};

use super::AzdoClient;
use crate::error::Result;
use crate::providers::azdo::insertion::StatusFilter;
use crate::providers::azdo::links::branch_ref;
use crate::providers::azdo::types::{AzdoThread, ListResponse};

const PULL_REQUESTS_API_VERSION: &str = "7.1";
const THREADS_API_VERSION: &str = "6.0";
const UPDATE_API_VERSION: &str = "7.0";

impl AzdoClient {
    /// Fetch one page of insertion PRs targeting `target_branch`.
    ///
    /// Returns the raw JSON items so callers can keep the original document
    /// next to the typed view.
    pub async fn fetch_pull_requests(
        &self,
        target_branch: &str,
        status: StatusFilter,
        skip: usize,
    ) -> Result<Vec<Value>> {
        let config = self.config();
        let mut url = self.endpoint("pullrequests")?;
        url.query_pairs_mut()
            .append_pair("searchCriteria.creatorId", &config.creator_id)
            .append_pair("searchCriteria.reviewerId", &config.reviewer_id)
            .append_pair("api-version", PULL_REQUESTS_API_VERSION)
            .append_pair("searchCriteria.status", status.as_query())
            .append_pair("$top", &config.page_size.to_string())
            .append_pair("$skip", &skip.to_string())
            .append_pair("searchCriteria.targetRefName", &branch_ref(target_branch));

        let response: ListResponse<Value> = self.get_json(url).await?;
        Ok(response.value)
    }

    /// Fetch every discussion thread of a PR, oldest first.
    pub async fn fetch_threads(&self, pull_request_id: &str) -> Result<Vec<AzdoThread>> {
        let mut url = self.endpoint(&format!("pullrequests/{pull_request_id}/threads"))?;
        url.query_pairs_mut()
            .append_pair("api-version", THREADS_API_VERSION);

        let response: ListResponse<AzdoThread> = self.get_json(url).await?;
        Ok(response.value)
    }

    /// Set a PR's status to abandoned.
    pub async fn abandon_pull_request(&self, pull_request_id: &str) -> Result<()> {
        let mut url = self.endpoint(&format!("pullrequests/{pull_request_id}"))?;
        url.query_pairs_mut()
            .append_pair("api-version", UPDATE_API_VERSION);

        self.patch_json(url, &json!({ "status": "abandoned" })).await
    }
}
