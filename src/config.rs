use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::providers::azdo::StatusFilter;

/// Configuration file structure for vsinsertions.
///
/// Every remote endpoint and automation identity the tracker relies on lives
/// here, so the tool can be pointed at another repository or a test server
/// without code changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Azure DevOps endpoints and identities
    #[serde(default)]
    pub azdo: AzdoConfig,

    /// Branch manifest location and filtering rules
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Performance-run comment markers
    #[serde(default)]
    pub perf: PerfConfig,

    /// Defaults for CLI arguments
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AzdoConfig {
    /// Collection/project URL, e.g. `https://dev.azure.com/devdiv/devdiv/`
    #[serde(default = "default_organization_url")]
    pub organization_url: String,

    /// Browser URL of the target repository, used for PR links
    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// Git repository id of the integration repository
    #[serde(default = "default_repository_id")]
    pub repository_id: String,

    /// Identity that creates insertion PRs
    #[serde(default = "default_creator_id")]
    pub creator_id: String,

    /// Identity added as reviewer on every insertion PR
    #[serde(default = "default_reviewer_id")]
    pub reviewer_id: String,

    /// Display name used as commit author for merged insertions
    #[serde(default = "default_commit_author")]
    pub commit_author: String,

    /// PRs requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestConfig {
    /// URL of the `PublishData.json` branch manifest
    #[serde(default = "default_manifest_url")]
    pub url: String,

    /// Branch that always sorts first
    #[serde(default = "default_main_branch")]
    pub main_branch: String,

    /// Prefix of numbered release branches
    #[serde(default = "default_release_prefix")]
    pub release_prefix: String,

    /// Release line that is not tracked (inserted by a different identity)
    #[serde(default = "default_legacy_prefix")]
    pub legacy_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PerfConfig {
    /// Comment text announcing a DDRIT run
    #[serde(default = "default_ddrit_marker")]
    pub ddrit_marker: String,

    /// Comment text announcing a Speedometer run
    #[serde(default = "default_speedometer_marker")]
    pub speedometer_marker: String,

    /// Display name of the account that posts run results
    #[serde(default = "default_reporter")]
    pub reporter: String,

    /// Literal text of a passing result
    #[serde(default = "default_pass_marker")]
    pub pass_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultsConfig {
    /// Source repository tag expected in insertion titles
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Status filter for listings
    #[serde(default)]
    pub status: StatusFilter,

    /// Substring identifying an insertion commit message
    #[serde(default = "default_commit_filter")]
    pub commit_filter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Default for AzdoConfig {
    fn default() -> Self {
        Self {
            organization_url: default_organization_url(),
            web_url: default_web_url(),
            repository_id: default_repository_id(),
            creator_id: default_creator_id(),
            reviewer_id: default_reviewer_id(),
            commit_author: default_commit_author(),
            page_size: default_page_size(),
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            url: default_manifest_url(),
            main_branch: default_main_branch(),
            release_prefix: default_release_prefix(),
            legacy_prefix: default_legacy_prefix(),
        }
    }
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            ddrit_marker: default_ddrit_marker(),
            speedometer_marker: default_speedometer_marker(),
            reporter: default_reporter(),
            pass_marker: default_pass_marker(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            status: StatusFilter::default(),
            commit_filter: default_commit_filter(),
        }
    }
}

fn default_organization_url() -> String {
    "https://dev.azure.com/devdiv/devdiv/".to_string()
}

fn default_web_url() -> String {
    "https://dev.azure.com/devdiv/DevDiv/_git/VS".to_string()
}

fn default_repository_id() -> String {
    "a290117c-5a8a-40f7-bc2c-f14dbe3acf6d".to_string()
}

fn default_creator_id() -> String {
    "122d5278-3e55-4868-9d40-1e28c2515fc4".to_string()
}

fn default_reviewer_id() -> String {
    "6c25b447-1d90-4840-8fde-d8b22cb8733e".to_string()
}

fn default_commit_author() -> String {
    "DotNet Bot".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_manifest_url() -> String {
    "https://raw.githubusercontent.com/dotnet/roslyn/main/eng/config/PublishData.json".to_string()
}

fn default_main_branch() -> String {
    "main".to_string()
}

fn default_release_prefix() -> String {
    "release/dev".to_string()
}

fn default_legacy_prefix() -> String {
    "release/dev16".to_string()
}

fn default_ddrit_marker() -> String {
    "We've started **VS64** Perf DDRITs".to_string()
}

fn default_speedometer_marker() -> String {
    "We've started Speedometer".to_string()
}

fn default_reporter() -> String {
    "VSEng Perf Automation Account".to_string()
}

fn default_pass_marker() -> String {
    "Test Run **PASSED**".to_string()
}

fn default_repository() -> String {
    "Roslyn".to_string()
}

fn default_commit_filter() -> String {
    "Roslyn '".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./vsinsertions.toml
    /// 3. ./vsinsertions.json
    /// 4. ./vsinsertions.yaml
    /// 5. ./vsinsertions.yml
    /// 6. `<config dir>/vsinsertions/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if path.exists() {
                return Self::load_from_path(path);
            }
            log::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let candidates = [
            "vsinsertions.toml",
            "vsinsertions.json",
            "vsinsertions.yaml",
            "vsinsertions.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = user_config_path().filter(|p| p.exists()) {
            return Self::load_from_path(&path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        log::debug!("Loading config from {}", path.display());

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vsinsertions").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.azdo.page_size, 100);
        assert_eq!(config.azdo.commit_author, "DotNet Bot");
        assert_eq!(config.manifest.release_prefix, "release/dev");
        assert_eq!(config.manifest.legacy_prefix, "release/dev16");
        assert_eq!(config.perf.pass_marker, "Test Run **PASSED**");
        assert_eq!(config.defaults.status, StatusFilter::Active);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[azdo]
organization-url = "https://dev.azure.com/contoso/project/"
repository-id = "repo-guid"
page-size = 25

[manifest]
legacy-prefix = "release/dev15"

[defaults]
repository = "Razor"
status = "all"

[output]
format = "json"
pretty = true
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(
            config.azdo.organization_url,
            "https://dev.azure.com/contoso/project/"
        );
        assert_eq!(config.azdo.repository_id, "repo-guid");
        assert_eq!(config.azdo.page_size, 25);
        assert_eq!(config.azdo.commit_author, "DotNet Bot");
        assert_eq!(config.manifest.legacy_prefix, "release/dev15");
        assert_eq!(config.manifest.release_prefix, "release/dev");
        assert_eq!(config.defaults.repository, "Razor");
        assert_eq!(config.defaults.status, StatusFilter::All);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "perf": {
    "reporter": "Perf Bot"
  },
  "manifest": {
    "url": "http://localhost/PublishData.json"
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.perf.reporter, "Perf Bot");
        assert_eq!(config.perf.ddrit_marker, "We've started **VS64** Perf DDRITs");
        assert_eq!(config.manifest.url, "http://localhost/PublishData.json");
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "defaults:\n  commit-filter: \"Razor '\"\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.defaults.commit_filter, "Razor '");
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load(Some(Path::new("nonexistent.toml"))).unwrap();
        assert_eq!(config.defaults.repository, "Roslyn");
    }

    #[test]
    fn test_save_and_reload_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("vsinsertions.yml");

        let mut config = Config::default();
        config.azdo.reviewer_id = "someone-else".to_string();
        config.save(&path).unwrap();

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded.azdo.reviewer_id, "someone-else");
    }

    #[test]
    fn test_unknown_extension_falls_back_through_formats() {
        let mut temp_file = NamedTempFile::with_suffix(".conf").unwrap();
        write!(temp_file, r#"{{"defaults": {{"repository": "Fsharp"}}}}"#).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.defaults.repository, "Fsharp");
    }
}
