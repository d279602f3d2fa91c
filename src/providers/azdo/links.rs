const HEADS_PREFIX: &str = "refs/heads/";

/// Builds the browser URL of a pull request.
///
/// # Arguments
///
/// * `web_url` - Repository web URL (e.g., <https://dev.azure.com/devdiv/DevDiv/_git/VS>)
/// * `pull_request_id` - Numeric PR id as a string
///
/// # Returns
///
/// Clickable URL (e.g., <https://dev.azure.com/devdiv/DevDiv/_git/VS/pullrequest/123>)
pub fn pull_request_url(web_url: &str, pull_request_id: &str) -> String {
    format!(
        "{}/pullrequest/{pull_request_id}",
        web_url.trim_end_matches('/')
    )
}

/// Full ref name for a branch (`main` → `refs/heads/main`).
pub fn branch_ref(branch: &str) -> String {
    if branch.starts_with(HEADS_PREFIX) {
        branch.to_string()
    } else {
        format!("{HEADS_PREFIX}{branch}")
    }
}

/// Branch name for display (`refs/heads/main` → `main`).
pub fn short_branch_name(ref_name: &str) -> &str {
    ref_name.strip_prefix(HEADS_PREFIX).unwrap_or(ref_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_url() {
        let url = pull_request_url("https://dev.azure.com/devdiv/DevDiv/_git/VS", "512345");
        assert_eq!(
            url,
            "https://dev.azure.com/devdiv/DevDiv/_git/VS/pullrequest/512345"
        );
    }

    #[test]
    fn test_pull_request_url_trailing_slash() {
        let url = pull_request_url("https://dev.azure.com/devdiv/DevDiv/_git/VS/", "7");
        assert_eq!(url, "https://dev.azure.com/devdiv/DevDiv/_git/VS/pullrequest/7");
    }

    #[test]
    fn test_branch_ref() {
        assert_eq!(branch_ref("main"), "refs/heads/main");
        assert_eq!(branch_ref("rel/d17.9"), "refs/heads/rel/d17.9");
        assert_eq!(branch_ref("refs/heads/main"), "refs/heads/main");
    }

    #[test]
    fn test_short_branch_name() {
        assert_eq!(short_branch_name("refs/heads/rel/d17.9"), "rel/d17.9");
        assert_eq!(short_branch_name("main"), "main");
    }
}
