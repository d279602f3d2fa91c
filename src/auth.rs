use std::fmt;

/// Browser session cookie forwarded on every Azure DevOps request.
///
/// Acquiring the cookie is the caller's job; this type only carries it and
/// keeps it out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionCookie {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<String> for SessionCookie {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCookie(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_is_trimmed() {
        let cookie = SessionCookie::from("  UserAuthentication=abc\n");
        assert_eq!(cookie.as_str(), "UserAuthentication=abc");
    }

    #[test]
    fn test_cookie_debug_is_redacted() {
        let cookie = SessionCookie::from("secret-value");
        let debug = format!("{cookie:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-value"));
    }
}
