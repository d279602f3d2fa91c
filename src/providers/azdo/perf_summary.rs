use std::sync::{Arc, LazyLock};

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;

use super::client::AzdoClient;
use super::types::AzdoThread;
use crate::config::PerfConfig;

static REGRESSION_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) regression").expect("regression pattern is valid"));
static BROKEN_TEST_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) broken test").expect("broken test pattern is valid"));

/// Outcome of one automated performance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub in_progress: bool,
    /// `-1` when a failure was reported but the count could not be read
    pub regressions: i32,
    /// `-1` when a failure was reported but the count could not be read
    pub broken_tests: i32,
}

impl RunResult {
    pub const UNPARSEABLE: i32 = -1;

    fn in_progress() -> Self {
        Self {
            in_progress: true,
            regressions: 0,
            broken_tests: 0,
        }
    }

    fn passed() -> Self {
        Self {
            in_progress: false,
            regressions: 0,
            broken_tests: 0,
        }
    }

    fn from_report(text: &str) -> Self {
        Self {
            in_progress: false,
            regressions: count_from(&REGRESSION_COUNT, text),
            broken_tests: count_from(&BROKEN_TEST_COUNT, text),
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.in_progress && self.regressions == 0 && self.broken_tests == 0
    }
}

/// Two-lane performance summary of an insertion PR.
///
/// `loaded` flips to true once the resolution attempt has finished, whether
/// or not any data was found. An absent lane means that run never started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceSummary {
    pub loaded: bool,
    pub ddrit: Option<RunResult>,
    pub speedometer: Option<RunResult>,
}

impl PerformanceSummary {
    /// Placeholder while the fetch is in flight.
    pub fn loading() -> Self {
        Self::default()
    }

    fn unavailable() -> Self {
        Self {
            loaded: true,
            ddrit: None,
            speedometer: None,
        }
    }
}

/// Reduces PR discussion threads to a [`PerformanceSummary`].
pub struct PerformanceSummaryResolver {
    client: Arc<AzdoClient>,
    perf: PerfConfig,
}

impl PerformanceSummaryResolver {
    pub fn new(client: Arc<AzdoClient>, perf: PerfConfig) -> Self {
        Self { client, perf }
    }

    /// Fetch the threads of `pull_request_id` and summarize them.
    ///
    /// Never fails: a fetch or parse error is logged and yields a loaded
    /// summary with both lanes absent.
    pub async fn fetch(&self, pull_request_id: &str) -> PerformanceSummary {
        match self.client.fetch_threads(pull_request_id).await {
            Ok(threads) => {
                debug!(
                    "Loaded {} threads for pull request {pull_request_id}",
                    threads.len()
                );
                self.summarize(&threads)
            }
            Err(e) => {
                warn!("Failed to load performance runs for pull request {pull_request_id}: {e}");
                PerformanceSummary::unavailable()
            }
        }
    }

    pub fn summarize(&self, threads: &[AzdoThread]) -> PerformanceSummary {
        PerformanceSummary {
            loaded: true,
            ddrit: self.lane_result(threads, &self.perf.ddrit_marker),
            speedometer: self.lane_result(threads, &self.perf.speedometer_marker),
        }
    }

    fn lane_result(&self, threads: &[AzdoThread], marker: &str) -> Option<RunResult> {
        // Retries start a new thread; the newest one wins.
        let thread = threads
            .iter()
            .rev()
            .find(|t| t.comments.iter().any(|c| c.text().contains(marker)))?;

        let Some(report) = thread
            .comments
            .iter()
            .rev()
            .find(|c| c.author_name() == Some(self.perf.reporter.as_str()))
        else {
            return Some(RunResult::in_progress());
        };

        let text = report.text();
        if text.contains(&self.perf.pass_marker) {
            return Some(RunResult::passed());
        }

        Some(RunResult::from_report(text))
    }
}

fn count_from(pattern: &Regex, text: &str) -> i32 {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(RunResult::UNPARSEABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AzdoConfig;
    use crate::providers::azdo::types::{AzdoComment, AzdoIdentity};

    const REPORTER: &str = "VSEng Perf Automation Account";
    const DDRIT_START: &str = "We've started **VS64** Perf DDRITs for this insertion.";
    const SPEEDOMETER_START: &str = "We've started Speedometer runs.";

    fn comment(author: &str, content: &str) -> AzdoComment {
        AzdoComment {
            author: Some(AzdoIdentity {
                display_name: author.to_string(),
            }),
            content: Some(content.to_string()),
        }
    }

    fn thread(comments: Vec<AzdoComment>) -> AzdoThread {
        AzdoThread { comments }
    }

    fn resolver_for(organization_url: &str) -> PerformanceSummaryResolver {
        let config = AzdoConfig {
            organization_url: organization_url.to_string(),
            repository_id: "repo".to_string(),
            ..AzdoConfig::default()
        };
        let client = AzdoClient::new(&config, None).unwrap();
        PerformanceSummaryResolver::new(Arc::new(client), PerfConfig::default())
    }

    fn resolver() -> PerformanceSummaryResolver {
        resolver_for("https://dev.azure.com/org/project/")
    }

    #[test]
    fn test_no_threads() {
        let summary = resolver().summarize(&[]);
        assert_eq!(
            summary,
            PerformanceSummary {
                loaded: true,
                ddrit: None,
                speedometer: None,
            }
        );
    }

    #[test]
    fn test_started_without_report_is_in_progress() {
        let threads = vec![thread(vec![comment("Insertion Bot", DDRIT_START)])];
        let summary = resolver().summarize(&threads);
        assert_eq!(summary.ddrit, Some(RunResult::in_progress()));
        assert_eq!(summary.speedometer, None);
    }

    #[test]
    fn test_failure_counts_are_extracted() {
        let threads = vec![thread(vec![
            comment("Insertion Bot", DDRIT_START),
            comment(REPORTER, "Found 3 regression(s) and 1 broken test(s)"),
        ])];
        let summary = resolver().summarize(&threads);
        assert_eq!(
            summary.ddrit,
            Some(RunResult {
                in_progress: false,
                regressions: 3,
                broken_tests: 1,
            })
        );
    }

    #[test]
    fn test_pass_marker_wins_over_counts() {
        let threads = vec![thread(vec![
            comment("Insertion Bot", SPEEDOMETER_START),
            comment(
                REPORTER,
                "Test Run **PASSED**. Previously 2 regression(s) were investigated.",
            ),
        ])];
        let summary = resolver().summarize(&threads);
        assert_eq!(summary.speedometer, Some(RunResult::passed()));
        assert!(summary.speedometer.unwrap().is_clean());
    }

    #[test]
    fn test_unparseable_counts_use_sentinel() {
        let threads = vec![thread(vec![
            comment("Insertion Bot", DDRIT_START),
            comment(REPORTER, "Test Run **FAILED**: 2 regression(s), see report."),
        ])];
        let summary = resolver().summarize(&threads);
        let ddrit = summary.ddrit.unwrap();
        assert!(!ddrit.in_progress);
        assert_eq!(ddrit.regressions, 2);
        assert_eq!(ddrit.broken_tests, RunResult::UNPARSEABLE);
    }

    #[test]
    fn test_count_overflow_is_unparseable() {
        let threads = vec![thread(vec![
            comment("Insertion Bot", DDRIT_START),
            comment(REPORTER, "99999999999 regression(s) and 0 broken test(s)"),
        ])];
        let ddrit = resolver().summarize(&threads).ddrit.unwrap();
        assert_eq!(ddrit.regressions, RunResult::UNPARSEABLE);
        assert_eq!(ddrit.broken_tests, 0);
    }

    #[test]
    fn test_latest_thread_and_latest_report_win() {
        let threads = vec![
            thread(vec![
                comment("Insertion Bot", DDRIT_START),
                comment(REPORTER, "Found 5 regression(s) and 0 broken test(s)"),
            ]),
            thread(vec![comment("Someone", "Looks unrelated, retrying.")]),
            thread(vec![
                comment("Insertion Bot", DDRIT_START),
                comment(REPORTER, "Found 4 regression(s) and 2 broken test(s)"),
                comment("Someone", "Investigating"),
                comment(REPORTER, "Found 1 regression(s) and 0 broken test(s)"),
            ]),
        ];
        let ddrit = resolver().summarize(&threads).ddrit.unwrap();
        assert_eq!(ddrit.regressions, 1);
        assert_eq!(ddrit.broken_tests, 0);
    }

    #[test]
    fn test_retry_without_report_is_in_progress_again() {
        let threads = vec![
            thread(vec![
                comment("Insertion Bot", DDRIT_START),
                comment(REPORTER, "Found 5 regression(s) and 0 broken test(s)"),
            ]),
            thread(vec![comment("Insertion Bot", DDRIT_START)]),
        ];
        let ddrit = resolver().summarize(&threads).ddrit.unwrap();
        assert!(ddrit.in_progress);
    }

    #[test]
    fn test_lanes_are_independent() {
        let threads = vec![
            thread(vec![
                comment("Insertion Bot", DDRIT_START),
                comment(REPORTER, "Test Run **PASSED**"),
            ]),
            thread(vec![comment("Insertion Bot", SPEEDOMETER_START)]),
        ];
        let summary = resolver().summarize(&threads);
        assert_eq!(summary.ddrit, Some(RunResult::passed()));
        assert_eq!(summary.speedometer, Some(RunResult::in_progress()));
    }

    #[test]
    fn test_comments_without_author_or_content_are_tolerated() {
        let threads = vec![thread(vec![
            AzdoComment {
                author: None,
                content: None,
            },
            comment("Insertion Bot", DDRIT_START),
            AzdoComment {
                author: None,
                content: Some("system message".to_string()),
            },
        ])];
        let ddrit = resolver().summarize(&threads).ddrit.unwrap();
        assert!(ddrit.in_progress);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_loaded_empty_summary() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/_apis/git/repositories/repo/pullrequests/77/threads")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let summary = resolver_for(&server.url()).fetch("77").await;
        assert_eq!(summary, PerformanceSummary::unavailable());
    }

    #[tokio::test]
    async fn test_fetch_parses_threads() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "value": [
                {
                    "id": 1,
                    "comments": [
                        { "author": { "displayName": "Insertion Bot" }, "content": DDRIT_START },
                        { "author": { "displayName": REPORTER }, "content": "Found 0 regression(s) and 3 broken test(s)" }
                    ]
                },
                { "id": 2, "comments": [ { "author": { "displayName": "Reviewer" }, "content": null } ] }
            ],
            "count": 2
        });
        let mock = server
            .mock("GET", "/_apis/git/repositories/repo/pullrequests/77/threads")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                "6.0".into(),
            ))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let summary = resolver_for(&server.url()).fetch("77").await;
        assert!(summary.loaded);
        assert_eq!(
            summary.ddrit,
            Some(RunResult {
                in_progress: false,
                regressions: 0,
                broken_tests: 3,
            })
        );
        assert_eq!(summary.speedometer, None);
        mock.assert_async().await;
    }
}
