//! Per-failure-kind recovery strategy table (§4.9).

use crate::failure::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryAction {
    WaitAndRetry,
    ScrollIntoView,
    DismissModal,
    DismissCookieBanner,
    WaitForLoading,
    RefreshPage,
    ClearOverlays,
    JsClick,
    None,
}

impl RecoveryAction {
    pub fn name(&self) -> &'static str {
        match self {
            RecoveryAction::WaitAndRetry => "wait_and_retry",
            RecoveryAction::ScrollIntoView => "scroll_into_view",
            RecoveryAction::DismissModal => "dismiss_modal",
            RecoveryAction::DismissCookieBanner => "dismiss_cookie_banner",
            RecoveryAction::WaitForLoading => "wait_for_loading",
            RecoveryAction::RefreshPage => "refresh_page",
            RecoveryAction::ClearOverlays => "clear_overlays",
            RecoveryAction::JsClick => "js_click",
            RecoveryAction::None => "none",
        }
    }
}

/// Default ordered strategy for a failure kind. A caller who has a
/// previously-successful action for this kind should try that first and
/// fall back to this list.
pub fn default_strategy(kind: FailureKind) -> &'static [RecoveryAction] {
    use RecoveryAction::*;
    match kind {
        FailureKind::ElementIntercepted => &[DismissModal, DismissCookieBanner, ScrollIntoView, ClearOverlays, JsClick],
        FailureKind::ElementNotFound => &[WaitAndRetry, ScrollIntoView, WaitForLoading, RefreshPage],
        FailureKind::StaleElement => &[WaitAndRetry, RefreshPage],
        FailureKind::ModalBlocking => &[DismissModal, ClearOverlays],
        FailureKind::CookieBanner => &[DismissCookieBanner, ClearOverlays],
        FailureKind::LoadingSpinner => &[WaitForLoading, WaitAndRetry],
        FailureKind::ElementNotVisible => &[ScrollIntoView, WaitAndRetry, DismissModal],
        FailureKind::ElementNotEnabled => &[WaitAndRetry, WaitForLoading],
        FailureKind::Timeout => &[WaitAndRetry, RefreshPage],
        FailureKind::NavigationError => &[WaitAndRetry, RefreshPage],
        FailureKind::Unknown => &[WaitAndRetry],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intercepted_tries_dismissal_before_force_tactics() {
        let strategy = default_strategy(FailureKind::ElementIntercepted);
        assert_eq!(strategy[0], RecoveryAction::DismissModal);
        assert_eq!(*strategy.last().unwrap(), RecoveryAction::JsClick);
    }

    #[test]
    fn unknown_only_waits_and_retries() {
        assert_eq!(default_strategy(FailureKind::Unknown), &[RecoveryAction::WaitAndRetry]);
    }
}
