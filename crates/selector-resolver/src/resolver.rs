//! The 5-tier pipeline itself.

use crate::raw_selector;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use wayfarer_core_types::{Alternative, ElementRecord, ExecRoute, Intent, ResolutionResult, Selector, SelectorKind, Tier};
use wayfarer_driver::AiResolverCallback;
use wayfarer_framework_rules::Framework;
use wayfarer_knowledge_store::KnowledgeStore;

/// Tunables for the pipeline; defaults match §4.5 of the spec this crate
/// implements against.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    pub min_kb_confidence: f64,
    pub semantic_heuristic_threshold: f64,
    pub ai_confidence_cap: f64,
    pub max_context_bytes: usize,
    pub fallback_confidence: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_kb_confidence: 0.5,
            semantic_heuristic_threshold: 0.7,
            ai_confidence_cap: 0.7,
            max_context_bytes: 5 * 1024,
            fallback_confidence: 0.4,
        }
    }
}

/// Per-tier hit counters for observability (surfaced in `RunMetrics`).
#[derive(Default)]
pub struct TierCounters {
    pub knowledge_base: AtomicU64,
    pub framework_rule: AtomicU64,
    pub heuristic: AtomicU64,
    pub ai: AtomicU64,
    pub fallback: AtomicU64,
    pub failed: AtomicU64,
}

impl TierCounters {
    fn record(&self, tier: Tier) {
        let counter = match tier {
            Tier::KnowledgeBase => &self.knowledge_base,
            Tier::FrameworkRule => &self.framework_rule,
            Tier::Heuristic => &self.heuristic,
            Tier::Ai => &self.ai,
            Tier::Fallback => &self.fallback,
            Tier::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> [(&'static str, u64); 6] {
        [
            ("knowledge_base", self.knowledge_base.load(Ordering::Relaxed)),
            ("framework_rule", self.framework_rule.load(Ordering::Relaxed)),
            ("heuristic", self.heuristic.load(Ordering::Relaxed)),
            ("ai", self.ai.load(Ordering::Relaxed)),
            ("fallback", self.fallback.load(Ordering::Relaxed)),
            ("failed", self.failed.load(Ordering::Relaxed)),
        ]
    }
}

/// What the caller supplies per resolution: the live page HTML (if already
/// captured), and the detected SPA framework (if any), so the resolver
/// never has to reach into the driver itself.
pub struct PageContext<'a> {
    pub html: Option<&'a str>,
    pub framework: Option<Framework>,
}

pub struct SelectorResolver {
    knowledge: Arc<KnowledgeStore>,
    ai: Option<Arc<dyn AiResolverCallback>>,
    config: ResolverConfig,
    counters: TierCounters,
}

impl SelectorResolver {
    pub fn new(knowledge: Arc<KnowledgeStore>, ai: Option<Arc<dyn AiResolverCallback>>, config: ResolverConfig) -> Self {
        Self { knowledge, ai, config, counters: TierCounters::default() }
    }

    pub fn counters(&self) -> &TierCounters {
        &self.counters
    }

    /// Resolve `raw_target` -- either a natural-language intent or an
    /// already-formed selector -- to a concrete locator.
    pub async fn resolve(&self, _route: &ExecRoute, domain: &str, page: &str, raw_target: &str, ctx: PageContext<'_>) -> ResolutionResult {
        let is_raw_selector = raw_selector::looks_like_selector(raw_target);
        let intent = if is_raw_selector {
            raw_selector::extract_intent(raw_target)
        } else {
            Intent::normalize(raw_target)
        };

        let mut alternatives: Vec<Alternative> = Vec::new();

        if let Some(result) = self.try_knowledge_base(domain, page, &intent, &mut alternatives) {
            self.counters.record(result.tier);
            return result;
        }

        if let Some(html) = ctx.html {
            if let Some(result) = self.try_heuristic_and_semantic(html, &intent, &mut alternatives) {
                self.counters.record(result.tier);
                return result;
            }
        }

        if let Some(result) = self.try_framework_rule(&intent, ctx.framework, &mut alternatives) {
            self.counters.record(result.tier);
            return result;
        }

        if let Some(result) = self.try_ai(&intent, ctx.html).await {
            self.counters.record(result.tier);
            return result;
        }

        if is_raw_selector {
            let selector = Selector::new(raw_target.to_string(), infer_kind(raw_target));
            let result = ResolutionResult::new(selector, self.config.fallback_confidence, Tier::Fallback)
                .with_alternatives(alternatives)
                .with_metadata("source", "raw_target");
            self.counters.record(result.tier);
            return result;
        }

        let result = self.fallback(&intent, alternatives);
        self.counters.record(result.tier);
        result
    }

    fn try_knowledge_base(&self, domain: &str, page: &str, intent: &Intent, alternatives: &mut Vec<Alternative>) -> Option<ResolutionResult> {
        let lookup = self.knowledge.lookup(domain, page, intent)?;
        let record: ElementRecord = lookup.record;
        let best = record.best()?;
        push_alternatives(alternatives, &record, Tier::KnowledgeBase);
        if best.confidence >= self.config.min_kb_confidence {
            debug!(domain, page, intent = intent.as_str(), confidence = best.confidence, "knowledge base hit");
            Some(
                ResolutionResult::new(best.selector.clone(), best.confidence, Tier::KnowledgeBase)
                    .with_alternatives(alternatives.clone())
                    .with_metadata("exact_match", lookup.exact.to_string()),
            )
        } else {
            None
        }
    }

    fn try_heuristic_and_semantic(&self, html: &str, intent: &Intent, alternatives: &mut Vec<Alternative>) -> Option<ResolutionResult> {
        let heuristic = wayfarer_heuristic_engine::scan(html, intent);
        let semantic = wayfarer_semantic_intel::scan_page(html, intent);

        for c in &heuristic {
            alternatives.push(Alternative { selector: c.selector.clone(), confidence: c.score, tier: Tier::Heuristic });
        }
        for m in &semantic {
            alternatives.push(Alternative { selector: m.selector.clone(), confidence: m.confidence, tier: Tier::Heuristic });
        }

        let best_heuristic = heuristic.iter().max_by(|a, b| a.score.partial_cmp(&b.score).unwrap());
        let best_semantic = semantic.iter().max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap());

        let threshold = self.config.semantic_heuristic_threshold;
        let semantic_qualifies = best_semantic.map(|m| m.confidence >= threshold).unwrap_or(false);
        let heuristic_qualifies = best_heuristic.map(|c| c.score >= threshold).unwrap_or(false);

        if !semantic_qualifies && !heuristic_qualifies {
            return None;
        }

        // Prefer a test-attribute selector even at a slightly lower score.
        let semantic_is_testid = best_semantic.map(|m| m.selector.value.contains("data-testid")).unwrap_or(false);
        let heuristic_is_testid = best_heuristic.map(|c| c.selector.value.contains("data-testid")).unwrap_or(false);

        let (selector, confidence) = match (semantic_qualifies, heuristic_qualifies) {
            (true, true) => {
                if heuristic_is_testid && !semantic_is_testid {
                    (best_heuristic.unwrap().selector.clone(), best_heuristic.unwrap().score)
                } else if semantic_is_testid && !heuristic_is_testid {
                    (best_semantic.unwrap().selector.clone(), best_semantic.unwrap().confidence)
                } else if best_semantic.unwrap().confidence >= best_heuristic.unwrap().score {
                    (best_semantic.unwrap().selector.clone(), best_semantic.unwrap().confidence)
                } else {
                    (best_heuristic.unwrap().selector.clone(), best_heuristic.unwrap().score)
                }
            }
            (true, false) => (best_semantic.unwrap().selector.clone(), best_semantic.unwrap().confidence),
            (false, true) => (best_heuristic.unwrap().selector.clone(), best_heuristic.unwrap().score),
            (false, false) => unreachable!(),
        };

        Some(ResolutionResult::new(selector, confidence, Tier::Heuristic).with_alternatives(alternatives.clone()))
    }

    fn try_framework_rule(&self, intent: &Intent, framework: Option<Framework>, alternatives: &mut Vec<Alternative>) -> Option<ResolutionResult> {
        let candidates = wayfarer_framework_rules::candidates(intent, framework);
        if candidates.is_empty() {
            return None;
        }
        for c in &candidates {
            alternatives.push(Alternative { selector: c.selector.clone(), confidence: c.relevance, tier: Tier::FrameworkRule });
        }
        let best = candidates.into_iter().max_by(|a, b| a.relevance.partial_cmp(&b.relevance).unwrap())?;
        Some(ResolutionResult::new(best.selector, best.relevance, Tier::FrameworkRule).with_alternatives(alternatives.clone()))
    }

    async fn try_ai(&self, intent: &Intent, html: Option<&str>) -> Option<ResolutionResult> {
        let ai = self.ai.as_ref()?;
        let page_snippet = html.map(|h| truncate_bytes(h, self.config.max_context_bytes)).unwrap_or_default();
        let request = wayfarer_driver::AiResolutionRequest {
            intent: intent.as_str().to_string(),
            page_snippet,
            available_ids: Vec::new(),
            context_kv: Default::default(),
        };
        let response = ai.resolve(request).await?;
        let confidence = response.confidence.min(self.config.ai_confidence_cap);
        info!(intent = intent.as_str(), confidence, "ai-assisted resolution");
        let alternatives = response
            .alternatives
            .into_iter()
            .map(|s| Alternative { selector: s, confidence, tier: Tier::Ai })
            .collect();
        Some(
            ResolutionResult::new(response.selector, confidence, Tier::Ai)
                .with_alternatives(alternatives)
                .with_metadata("ai_assisted", "true"),
        )
    }

    fn fallback(&self, intent: &Intent, alternatives: Vec<Alternative>) -> ResolutionResult {
        if intent.is_empty() {
            return ResolutionResult::failed();
        }
        let token = intent.tokens().join("-");
        let selector = Selector::new(format!("[id*=\"{token}\"], [name*=\"{token}\"], button:has-text(\"{token}\")"), SelectorKind::Css);
        ResolutionResult::new(selector, self.config.fallback_confidence, Tier::Fallback).with_alternatives(alternatives)
    }
}

fn push_alternatives(alternatives: &mut Vec<Alternative>, record: &ElementRecord, tier: Tier) {
    for entry in &record.selectors {
        alternatives.push(Alternative { selector: entry.selector.clone(), confidence: entry.confidence, tier });
    }
}

fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

fn infer_kind(target: &str) -> SelectorKind {
    if target.starts_with("//") || target.starts_with("(//") {
        SelectorKind::Xpath
    } else {
        SelectorKind::Css
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core_types::PageKey;

    fn route() -> ExecRoute {
        ExecRoute::main_frame("s", "p")
    }

    #[tokio::test]
    async fn knowledge_base_hit_short_circuits_pipeline() {
        let store = Arc::new(KnowledgeStore::new());
        store.record_outcome("example.com", "/login", "click_login_button", &Selector::testid("login-btn"), true, "kb", false);
        let resolver = SelectorResolver::new(store, None, ResolverConfig::default());

        let result = resolver
            .resolve(&route(), "example.com", "/login", "click the login button", PageContext { html: None, framework: None })
            .await;

        assert_eq!(result.tier, Tier::KnowledgeBase);
        assert_eq!(result.selector.unwrap().value, "login-btn");
    }

    #[tokio::test]
    async fn heuristic_tier_used_when_kb_empty_and_html_present() {
        let store = Arc::new(KnowledgeStore::new());
        let resolver = SelectorResolver::new(store, None, ResolverConfig::default());
        let html = r#"<button data-testid="checkout-btn">Checkout</button>"#;

        let result = resolver
            .resolve(&route(), "shop.com", "/cart", "click checkout", PageContext { html: Some(html), framework: None })
            .await;

        assert_eq!(result.tier, Tier::Heuristic);
    }

    #[tokio::test]
    async fn framework_tier_used_without_html() {
        let store = Arc::new(KnowledgeStore::new());
        let resolver = SelectorResolver::new(store, None, ResolverConfig::default());

        let result = resolver
            .resolve(&route(), "shop.com", "/cart", "click submit button", PageContext { html: None, framework: Some(Framework::MaterialUi) })
            .await;

        assert_eq!(result.tier, Tier::FrameworkRule);
    }

    #[tokio::test]
    async fn falls_back_when_nothing_else_matches() {
        let store = Arc::new(KnowledgeStore::new());
        let resolver = SelectorResolver::new(store, None, ResolverConfig::default());

        let result = resolver
            .resolve(&route(), "shop.com", "/cart", "do something nobody taught me", PageContext { html: None, framework: None })
            .await;

        assert_eq!(result.tier, Tier::Fallback);
    }

    #[tokio::test]
    async fn raw_selector_target_used_as_last_resort() {
        let store = Arc::new(KnowledgeStore::new());
        let resolver = SelectorResolver::new(store, None, ResolverConfig::default());

        let result = resolver
            .resolve(&route(), "shop.com", "/cart", "#totally-unseen-button", PageContext { html: None, framework: None })
            .await;

        assert_eq!(result.selector.unwrap().value, "#totally-unseen-button");
    }

    #[test]
    fn page_key_helper_still_formats_as_expected() {
        assert_eq!(PageKey::new("a.com", "/x").to_string(), "a.com/x");
    }
}
