use log::{debug, info};
use tokio::sync::OnceCell;

use crate::auth::SessionCookie;
use crate::config::Config;
use crate::error::Result;
use crate::providers::azdo::{CommitDetails, InsertionRecord, StatusFilter};
use crate::providers::{AzdoProvider, BranchCatalog, BranchInformation};

struct Session {
    cookie: SessionCookie,
    provider: AzdoProvider,
    catalog: BranchCatalog,
    branches: OnceCell<Vec<BranchInformation>>,
}

/// Entry point for every remote operation.
///
/// Until a session cookie is set the service is unauthenticated: catalog and
/// commit lookups return `None` and listings return no records, without any
/// request being sent.
pub struct InsertionService {
    config: Config,
    session: Option<Session>,
}

impl InsertionService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Replace the session cookie. Setting the current cookie again keeps the
    /// existing session and its cached branch catalog.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the cookie cannot be sent as a header.
    pub fn set_cookie(&mut self, cookie: Option<SessionCookie>) -> Result<()> {
        let Some(cookie) = cookie else {
            if self.session.take().is_some() {
                info!("Session cleared");
            }
            return Ok(());
        };

        if self.session.as_ref().is_some_and(|s| s.cookie == cookie) {
            debug!("Session cookie unchanged");
            return Ok(());
        }

        let provider = AzdoProvider::new(&self.config, Some(&cookie))?;
        let catalog = BranchCatalog::new(self.config.manifest.clone())?;
        self.session = Some(Session {
            cookie,
            provider,
            catalog,
            branches: OnceCell::new(),
        });
        info!("Session cookie set");

        Ok(())
    }

    pub fn provider(&self) -> Option<&AzdoProvider> {
        self.session.as_ref().map(|s| &s.provider)
    }

    /// Tracked branches, fetched once per session.
    pub async fn branches(&self) -> Result<Option<&[BranchInformation]>> {
        let Some(session) = &self.session else {
            return Ok(None);
        };

        let branches = session
            .branches
            .get_or_try_init(|| session.catalog.fetch())
            .await?;

        Ok(Some(branches.as_slice()))
    }

    pub async fn insertions(
        &self,
        target_branch: &str,
        status: StatusFilter,
        skip: usize,
        repository: &str,
    ) -> Result<Vec<InsertionRecord>> {
        let Some(provider) = self.provider() else {
            return Ok(Vec::new());
        };

        provider
            .list_insertions(target_branch, status, skip, repository)
            .await
    }

    pub async fn last_insertion(
        &self,
        message_filter: &str,
        target_branch: &str,
    ) -> Result<Option<CommitDetails>> {
        let Some(provider) = self.provider() else {
            return Ok(None);
        };

        provider
            .find_last_insertion(message_filter, target_branch)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config_for(server_url: &str) -> Config {
        let mut config = Config::default();
        config.azdo.organization_url = server_url.to_string();
        config.azdo.repository_id = "vs".to_string();
        config.manifest.url = format!("{server_url}/PublishData.json");
        config
    }

    #[tokio::test]
    async fn test_unauthenticated_service_makes_no_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let service = InsertionService::new(config_for(&server.url()));
        assert!(!service.is_authenticated());
        assert!(service.branches().await.unwrap().is_none());
        assert!(service
            .insertions("main", StatusFilter::Active, 0, "Roslyn")
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .last_insertion("Roslyn '", "main")
            .await
            .unwrap()
            .is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_branches_are_fetched_once_per_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/PublishData.json")
            .with_status(200)
            .with_body(json!({ "branches": { "main": { "vsBranch": "main" } } }).to_string())
            .expect(1)
            .create_async()
            .await;

        let mut service = InsertionService::new(config_for(&server.url()));
        service.set_cookie(Some(SessionCookie::from("auth=1"))).unwrap();
        assert!(service.is_authenticated());

        let first = service.branches().await.unwrap().unwrap().to_vec();
        service.set_cookie(Some(SessionCookie::from("auth=1"))).unwrap();
        let second = service.branches().await.unwrap().unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(first[0].target_branch, "main");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_manifest_request_carries_no_session_cookie() {
        let azdo = mockito::Server::new_async().await;
        let mut manifest_host = mockito::Server::new_async().await;
        let mock = manifest_host
            .mock("GET", "/PublishData.json")
            .match_header("cookie", Matcher::Missing)
            .with_status(200)
            .with_body(json!({ "branches": { "main": { "vsBranch": "main" } } }).to_string())
            .expect(1)
            .create_async()
            .await;

        let mut config = config_for(&azdo.url());
        config.manifest.url = format!("{}/PublishData.json", manifest_host.url());
        let mut service = InsertionService::new(config);
        service
            .set_cookie(Some(SessionCookie::from("UserAuthentication=secret")))
            .unwrap();

        let branches = service.branches().await.unwrap().unwrap();

        assert_eq!(branches.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_clearing_cookie_returns_to_unauthenticated() {
        let server = mockito::Server::new_async().await;
        let mut service = InsertionService::new(config_for(&server.url()));

        service.set_cookie(Some(SessionCookie::from("auth=1"))).unwrap();
        assert!(service.provider().is_some());

        service.set_cookie(None).unwrap();
        assert!(!service.is_authenticated());
        assert!(service.provider().is_none());
    }
}
