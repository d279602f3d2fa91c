use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `<repo> '<source branch>/<build>' Insertion into <target>`
static TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<repo>\w+) '(?P<source>[^']+)/(?P<build>[\d.]+)' Insertion into (?P<target>.*)")
        .expect("title pattern is valid")
});

/// Structured fields of an insertion PR title.
///
/// A title that does not follow the insertion grammar parses to all-empty
/// fields; an empty `repo_tag` never equals a real repository name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedTitle {
    pub repo_tag: String,
    pub source_branch: String,
    pub build_number: String,
    pub target_branch: String,
}

impl ParsedTitle {
    pub fn parse(title: &str) -> Self {
        let Some(captures) = TITLE_PATTERN.captures(title) else {
            return Self::default();
        };

        let group = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };

        Self {
            repo_tag: group("repo"),
            source_branch: group("source"),
            build_number: group("build"),
            target_branch: group("target"),
        }
    }

    pub fn is_match(&self) -> bool {
        !self.repo_tag.is_empty()
    }
}
