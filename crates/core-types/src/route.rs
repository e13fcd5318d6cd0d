//! Routing/addressing types shared by the driver, resolver, and orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the (domain, page-path) pair a step executes against -- the
/// knowledge-store partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageKey {
    pub domain: String,
    pub page: String,
}

impl PageKey {
    pub fn new(domain: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            page: page.into(),
        }
    }

    /// Derive a `PageKey` from a URL: domain is the host, page is the path
    /// with any trailing query/fragment stripped.
    pub fn from_url(url: &str) -> Self {
        let without_scheme = url.split("://").nth(1).unwrap_or(url);
        let mut parts = without_scheme.splitn(2, '/');
        let domain = parts.next().unwrap_or("").to_string();
        let rest = parts.next().unwrap_or("");
        let page = format!(
            "/{}",
            rest.split('?').next().unwrap_or("").split('#').next().unwrap_or("")
        );
        Self { domain, page }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.domain, self.page)
    }
}

/// Identifies the live browser target (session/page/frame) a driver call
/// executes against. Mirrors the shape the driver contract expects but stays
/// a plain value type so the core crates never depend on a concrete driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecRoute {
    pub session_id: String,
    pub page_id: String,
    pub frame_id: String,
}

impl ExecRoute {
    pub fn new(session_id: impl Into<String>, page_id: impl Into<String>, frame_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            page_id: page_id.into(),
            frame_id: frame_id.into(),
        }
    }

    pub fn main_frame(session_id: impl Into<String>, page_id: impl Into<String>) -> Self {
        let page_id = page_id.into();
        Self {
            session_id: session_id.into(),
            frame_id: page_id.clone(),
            page_id,
        }
    }
}

impl fmt::Display for ExecRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session={} page={} frame={}",
            self.session_id, self.page_id, self.frame_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_key_from_url_strips_query_and_fragment() {
        let key = PageKey::from_url("https://example.com/login?next=/home#top");
        assert_eq!(key.domain, "example.com");
        assert_eq!(key.page, "/login");
    }
}
