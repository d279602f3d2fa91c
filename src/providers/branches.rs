use std::str::FromStr;

use indexmap::IndexMap;
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ManifestConfig;
use crate::error::{Result, VsInsertionsError};
use crate::providers::azdo::{anonymous_client, get_json_with};

/// A source branch and the integration branch it inserts into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInformation {
    pub source_branch: String,
    pub target_branch: String,
}

#[derive(Debug, Deserialize)]
struct PublishData {
    branches: IndexMap<String, PublishBranch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishBranch {
    vs_branch: Option<String>,
}

/// Dotted numeric version of a release branch (`release/dev17.10` → 17.10).
///
/// Components compare numerically, so 17.10 sorts above 17.9 and 17.9 sorts
/// below 17.9.1.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct BranchVersion(Vec<u64>);

impl FromStr for BranchVersion {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.split('.')
            .map(str::parse)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Branch mapping read from the source repository's publish manifest.
///
/// Only the main branch and numbered release lines are tracked; the legacy
/// release line is excluded. The main branch is listed first, followed by
/// release branches from newest to oldest.
///
/// The manifest lives outside Azure DevOps, so it is fetched with its own
/// client that never carries the session cookie.
pub struct BranchCatalog {
    config: ManifestConfig,
    client: Client,
}

impl BranchCatalog {
    pub fn new(config: ManifestConfig) -> Result<Self> {
        Ok(Self {
            config,
            client: anonymous_client()?,
        })
    }

    /// Fetch the manifest and build the ordered branch list.
    ///
    /// # Errors
    ///
    /// - `RemoteUnavailable` if the manifest cannot be downloaded
    /// - `ParseFailure` if it is not valid JSON, lacks `branches`, or a tracked
    ///   branch has no `vsBranch`
    pub async fn fetch(&self) -> Result<Vec<BranchInformation>> {
        let url = Url::parse(&self.config.url)
            .map_err(|e| VsInsertionsError::Config(format!("Invalid manifest URL: {e}")))?;

        let manifest: PublishData = get_json_with(&self.client, url).await?;
        let branches = self.order(manifest)?;

        info!("Loaded {} tracked branches", branches.len());
        Ok(branches)
    }

    fn order(&self, manifest: PublishData) -> Result<Vec<BranchInformation>> {
        let mut main = None;
        let mut releases = Vec::new();

        for (name, branch) in manifest.branches {
            let is_main = name == self.config.main_branch;
            if !is_main && !self.is_tracked_release(&name) {
                continue;
            }

            let target_branch = branch.vs_branch.ok_or_else(|| {
                VsInsertionsError::ParseFailure(format!("branch {name} has no vsBranch"))
            })?;
            let info = BranchInformation {
                source_branch: name,
                target_branch,
            };

            if is_main {
                main = Some(info);
                continue;
            }

            match self.release_version(&info.source_branch) {
                Some(version) => releases.push((version, info)),
                None => warn!(
                    "Skipping branch {} with unparseable version",
                    info.source_branch
                ),
            }
        }

        // Stable sort keeps manifest order between equal versions.
        releases.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(main
            .into_iter()
            .chain(releases.into_iter().map(|(_, info)| info))
            .collect())
    }

    fn is_tracked_release(&self, name: &str) -> bool {
        name.starts_with(&self.config.release_prefix)
            && !name.starts_with(&self.config.legacy_prefix)
    }

    fn release_version(&self, name: &str) -> Option<BranchVersion> {
        let version = name.strip_prefix(&self.config.release_prefix)?;
        let version = match version.find('-') {
            Some(dash) if dash > 0 => &version[..dash],
            _ => version,
        };
        version.parse().ok()
    }
}
