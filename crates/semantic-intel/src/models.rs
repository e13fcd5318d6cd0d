//! Data models for semantic matching.
use serde::{Deserialize, Serialize};
use wayfarer_core_types::{ElementDna, Selector};

/// A recognized element role independent of any one page's markup --
/// "this is a password field" regardless of whether it's `#pwd` or
/// `[name=password]` on this particular site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    UsernameInput,
    EmailInput,
    PasswordInput,
    SearchInput,
    QuantityInput,
    SubmitButton,
    LoginButton,
    LogoutButton,
    AddToCart,
    CheckoutButton,
    RemoveItem,
}

impl SemanticType {
    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::UsernameInput => "USERNAME_INPUT",
            SemanticType::EmailInput => "EMAIL_INPUT",
            SemanticType::PasswordInput => "PASSWORD_INPUT",
            SemanticType::SearchInput => "SEARCH_INPUT",
            SemanticType::QuantityInput => "QUANTITY_INPUT",
            SemanticType::SubmitButton => "SUBMIT_BUTTON",
            SemanticType::LoginButton => "LOGIN_BUTTON",
            SemanticType::LogoutButton => "LOGOUT_BUTTON",
            SemanticType::AddToCart => "ADD_TO_CART",
            SemanticType::CheckoutButton => "CHECKOUT_BUTTON",
            SemanticType::RemoveItem => "REMOVE_ITEM",
        }
    }
}

/// Which kind of attribute produced a semantic match, ranked by stability.
/// Drives the match's confidence: a `data-testid` hit is far more trustworthy
/// than a text-content hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchedAttrKind {
    Text = 0,
    Placeholder = 1,
    Type = 2,
    Name = 3,
    Id = 4,
    TestId = 5,
}

impl MatchedAttrKind {
    pub fn confidence(&self) -> f64 {
        match self {
            MatchedAttrKind::TestId => 0.9,
            MatchedAttrKind::Id => 0.8,
            MatchedAttrKind::Name => 0.75,
            MatchedAttrKind::Type => 0.7,
            MatchedAttrKind::Placeholder => 0.65,
            MatchedAttrKind::Text => 0.55,
        }
    }
}

/// A semantic-type hit found while scanning a page.
#[derive(Debug, Clone)]
pub struct SemanticMatch {
    pub semantic_type: SemanticType,
    pub selector: Selector,
    pub confidence: f64,
    pub matched_via: MatchedAttrKind,
    pub dna: ElementDna,
}
