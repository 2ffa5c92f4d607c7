//! Platform quirks
//!
//! WebKit up to and including 536.11 substitutes its last-resort font without
//! respecting the generic family of the requested stack, so a font + serif
//! probe can render at sans-serif width (and the other way around).

use std::cell::OnceCell;
use std::fmt;

/// Queries about rendering engine defects
pub trait PlatformQuirks {
    /// True when fallback substitution ignores the requested generic family
    fn has_webkit_fallback_bug(&self) -> bool;
}

/// Quirks derived from a user agent string
///
/// Detection runs on the first query and is cached afterwards; the platform
/// is assumed not to change under a running process.
#[derive(Debug, Clone)]
pub struct UserAgentQuirks {
    user_agent: String,
    fallback_bug: OnceCell<bool>,
}

impl UserAgentQuirks {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            fallback_bug: OnceCell::new(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// WebKit version advertised by the user agent, if any
    pub fn webkit_version(&self) -> Option<WebKitVersion> {
        WebKitVersion::from_user_agent(&self.user_agent)
    }
}

impl PlatformQuirks for UserAgentQuirks {
    fn has_webkit_fallback_bug(&self) -> bool {
        *self.fallback_bug.get_or_init(|| {
            let version = self.webkit_version();
            let affected = version.is_some_and(|v| v.has_fallback_bug());
            tracing::debug!("WebKit version {:?}, last-resort fallback bug: {}", version, affected);
            affected
        })
    }
}

/// Fixed answers, for tests and hosts that already know their engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedQuirks {
    pub webkit_fallback_bug: bool,
}

impl FixedQuirks {
    pub fn new(webkit_fallback_bug: bool) -> Self {
        Self { webkit_fallback_bug }
    }
}

impl PlatformQuirks for FixedQuirks {
    fn has_webkit_fallback_bug(&self) -> bool {
        self.webkit_fallback_bug
    }
}

/// `AppleWebKit/<major>.<minor>` from a user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WebKitVersion {
    pub major: u32,
    pub minor: u32,
}

impl WebKitVersion {
    /// Last release with the fallback bug
    pub const LAST_AFFECTED: WebKitVersion = WebKitVersion { major: 536, minor: 11 };

    /// First `AppleWebKit/<digits>.<digits>` token in the user agent
    pub fn from_user_agent(user_agent: &str) -> Option<Self> {
        const TOKEN: &str = "AppleWebKit/";

        user_agent
            .match_indices(TOKEN)
            .find_map(|(at, _)| Self::parse_token(&user_agent[at + TOKEN.len()..]))
    }

    fn parse_token(s: &str) -> Option<Self> {
        let (major, rest) = split_digits(s)?;
        let (minor, _) = split_digits(rest.strip_prefix('.')?)?;
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }

    pub fn has_fallback_bug(&self) -> bool {
        *self <= Self::LAST_AFFECTED
    }
}

impl fmt::Display for WebKitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn split_digits(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (end > 0).then(|| s.split_at(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFARI_5: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; en-us) \
        AppleWebKit/534.50 (KHTML, like Gecko) Version/5.1 Safari/534.50";
    const SAFARI_6: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_8) \
        AppleWebKit/536.25 (KHTML, like Gecko) Version/6.0 Safari/536.25";
    const CHROME: &str = "Mozilla/5.0 (X11; Linux x86_64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

    #[test]
    fn test_parse_webkit_version() {
        assert_eq!(
            WebKitVersion::from_user_agent(SAFARI_5),
            Some(WebKitVersion { major: 534, minor: 50 })
        );
        assert_eq!(WebKitVersion::from_user_agent(CHROME).unwrap().to_string(), "537.36");
        assert_eq!(WebKitVersion::from_user_agent(FIREFOX), None);
    }

    #[test]
    fn test_minor_version_required() {
        assert_eq!(WebKitVersion::from_user_agent("AppleWebKit/535 Safari"), None);
        assert_eq!(WebKitVersion::from_user_agent("AppleWebKit/535. Safari"), None);
    }

    #[test]
    fn test_skips_unparseable_tokens() {
        let ua = "AppleWebKit/xyz AppleWebKit/533.1";
        assert_eq!(
            WebKitVersion::from_user_agent(ua),
            Some(WebKitVersion { major: 533, minor: 1 })
        );
    }

    #[test]
    fn test_fallback_bug_boundary() {
        let bug = |ua: &str| UserAgentQuirks::new(ua).has_webkit_fallback_bug();

        assert!(bug("AppleWebKit/536.11"));
        assert!(bug("AppleWebKit/536.9"));
        assert!(bug("AppleWebKit/535.99"));
        assert!(bug(SAFARI_5));
        assert!(!bug("AppleWebKit/536.12"));
        assert!(!bug(SAFARI_6));
        assert!(!bug(CHROME));
        assert!(!bug(FIREFOX));
        assert!(!bug(""));
    }

    #[test]
    fn test_detection_is_memoized() {
        let quirks = UserAgentQuirks::new(SAFARI_5);
        assert!(quirks.fallback_bug.get().is_none());
        assert!(quirks.has_webkit_fallback_bug());
        assert_eq!(quirks.fallback_bug.get(), Some(&true));
        assert!(quirks.has_webkit_fallback_bug());
    }

    #[test]
    fn test_fixed_quirks() {
        assert!(FixedQuirks::new(true).has_webkit_fallback_bug());
        assert!(!FixedQuirks::default().has_webkit_fallback_bug());
    }
}
