use super::AzdoClient;
use crate::error::Result;
use crate::providers::azdo::types::{AzdoCommit, ListResponse};

const COMMITS_API_VERSION: &str = "7.1";

impl AzdoClient {
    /// Fetch commits on `branch` authored by the insertion bot, newest first.
    pub async fn fetch_commits(&self, branch: &str) -> Result<Vec<AzdoCommit>> {
        let mut url = self.endpoint("commits")?;
        url.query_pairs_mut()
            .append_pair("searchCriteria.itemVersion.version", branch)
            .append_pair("searchCriteria.author", &self.config().commit_author)
            .append_pair("api-version", COMMITS_API_VERSION);

        let response: ListResponse<AzdoCommit> = self.get_json(url).await?;
        Ok(response.value)
    }
}
