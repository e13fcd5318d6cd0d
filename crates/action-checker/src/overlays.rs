//! Known overlay selector catalogs: the literal lists the pre-check scans
//! for before letting a step touch the page. Non-critical overlays (cookie
//! banners) are auto-dismissed; modals are critical -- if a dismiss attempt
//! doesn't clear them, the page is reported not ready.

/// Buttons/controls that close a blocking modal dialog.
pub const MODAL_DISMISS_SELECTORS: &[&str] = &[
    r#"[data-dismiss="modal"]"#,
    r#"[aria-label="Close"]"#,
    r#"[aria-label="close"]"#,
    ".modal-close",
    ".close-button",
    ".close-modal",
    ".btn-close",
    r#"button:has-text("Close")"#,
    r#"button:has-text("×")"#,
    ".modal-header button",
];

/// Accept/dismiss controls for cookie-consent banners -- non-critical, safe
/// to click through without affecting the step under test.
pub const COOKIE_BANNER_SELECTORS: &[&str] = &[
    r#"[data-testid*="cookie"] button"#,
    r#"[class*="cookie"] button:has-text("Accept")"#,
    r#"[class*="cookie"] button:has-text("OK")"#,
    r#"[class*="cookie"] button:has-text("Got it")"#,
    r#"[class*="cookie"] button:has-text("I agree")"#,
    r#"[class*="consent"] button"#,
    "#cookie-accept",
    ".cookie-accept",
    "#accept-cookies",
    ".accept-cookies",
    r#"[aria-label*="cookie"] button"#,
    ".cc-btn.cc-dismiss",
    r#"[class*="gdpr"] button"#,
];

/// Indicators that the page is still loading -- not dismissible by clicking,
/// just grounds for "not ready yet".
pub const LOADING_INDICATORS: &[&str] = &[
    ".loading",
    ".spinner",
    ".loader",
    r#"[class*="loading"]"#,
    r#"[class*="spinner"]"#,
    r#"[data-loading="true"]"#,
    ".MuiCircularProgress-root",
    ".ant-spin",
    ".sk-spinner",
];

/// Indicators an inline error/validation message surfaced.
pub const ERROR_INDICATORS: &[&str] = &[
    ".error-toast",
    r#"[role="alert"]"#,
    ".error-message",
    ".field-error",
    ".toast-error",
    ".Mui-error",
    ".ant-form-item-explain-error",
];
