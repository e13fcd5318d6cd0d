//! SPA framework detection signatures: in-page globals/markers checked
//! against the page's HTML/script content. One signature check per
//! supported framework, in a fixed priority order.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaFramework {
    React,
    Angular,
    Vue,
}

impl SpaFramework {
    pub fn name(&self) -> &'static str {
        match self {
            SpaFramework::React => "react",
            SpaFramework::Angular => "angular",
            SpaFramework::Vue => "vue",
        }
    }
}

/// React: the devtools hook global, or Next.js's `__NEXT_DATA__` payload.
fn looks_like_react(content: &str) -> bool {
    content.contains("__REACT_DEVTOOLS_GLOBAL_HOOK__") || content.contains("__NEXT_DATA__")
}

/// Angular: an `ng-version` attribute present on any element.
fn looks_like_angular(content: &str) -> bool {
    content.contains("ng-version")
}

/// Vue: the Vue/Vue-devtools globals, or Nuxt's `__NUXT__` payload.
fn looks_like_vue(content: &str) -> bool {
    content.contains("__VUE_DEVTOOLS_GLOBAL_HOOK__") || content.contains("__VUE__") || content.contains("__NUXT__")
}

/// Detect which (if any) SPA framework `content` shows signatures of.
/// Checked in a fixed order since a page can carry more than one marker
/// (e.g. a Next.js app's devtools hook).
pub fn detect(content: &str) -> Option<SpaFramework> {
    if looks_like_react(content) {
        Some(SpaFramework::React)
    } else if looks_like_angular(content) {
        Some(SpaFramework::Angular)
    } else if looks_like_vue(content) {
        Some(SpaFramework::Vue)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_react_via_devtools_hook() {
        let html = "<script>window.__REACT_DEVTOOLS_GLOBAL_HOOK__={}</script>";
        assert_eq!(detect(html), Some(SpaFramework::React));
    }

    #[test]
    fn detects_nextjs_via_next_data() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">{}</script>"#;
        assert_eq!(detect(html), Some(SpaFramework::React));
    }

    #[test]
    fn detects_angular_via_ng_version_attribute() {
        let html = r#"<app-root ng-version="16.2.0"></app-root>"#;
        assert_eq!(detect(html), Some(SpaFramework::Angular));
    }

    #[test]
    fn detects_nuxt_via_nuxt_global() {
        let html = "<script>window.__NUXT__={}</script>";
        assert_eq!(detect(html), Some(SpaFramework::Vue));
    }

    #[test]
    fn no_signatures_yields_none() {
        assert_eq!(detect("<html><body>plain</body></html>"), None);
    }
}
