//! Pattern mining: slides windows of length 2..=5 across a rolling buffer of
//! recent actions, fingerprints each window, and promotes a fingerprint that
//! recurs often enough at a high enough success rate into a persisted
//! [`ActionPattern`].

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use wayfarer_core_types::{ActionPattern, ApplicabilityPredicate, PatternStep};
use wayfarer_pattern_store::PatternStore;

const MIN_WINDOW: usize = 2;
const MAX_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct MiningConfig {
    pub action_buffer_capacity: usize,
    pub promotion_occurrences: u32,
    pub promotion_min_success_rate: f64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self { action_buffer_capacity: 100, promotion_occurrences: 3, promotion_min_success_rate: 0.8 }
    }
}

#[derive(Debug, Clone)]
pub struct BufferedAction {
    pub domain: String,
    pub verb: String,
    pub intent: String,
    pub success: bool,
}

#[derive(Debug, Clone)]
struct PatternCandidate {
    sequence: Vec<BufferedAction>,
    occurrences: u32,
    domains: Vec<String>,
}

pub struct PatternMiner {
    buffer: Mutex<VecDeque<BufferedAction>>,
    config: MiningConfig,
}

impl PatternMiner {
    pub fn new(config: MiningConfig) -> Self {
        Self { buffer: Mutex::new(VecDeque::with_capacity(config.action_buffer_capacity)), config }
    }

    pub fn record(&self, action: BufferedAction) {
        let mut buffer = self.buffer.lock().expect("action buffer lock");
        buffer.push_back(action);
        while buffer.len() > self.config.action_buffer_capacity {
            buffer.pop_front();
        }
    }

    /// Slides every window length across the buffer, promoting any
    /// fingerprint that clears `promotion_occurrences` at
    /// `promotion_min_success_rate`. Returns the patterns newly upserted.
    pub fn mine_and_promote(&self, patterns: &PatternStore) -> Vec<ActionPattern> {
        let buffer: Vec<BufferedAction> = {
            let guard = self.buffer.lock().expect("action buffer lock");
            guard.iter().cloned().collect()
        };
        if buffer.len() < MIN_WINDOW {
            return Vec::new();
        }

        let mut candidates: HashMap<String, PatternCandidate> = HashMap::new();
        for window_len in MIN_WINDOW..=MAX_WINDOW.min(buffer.len()) {
            find_sequences(&buffer, window_len, &mut candidates);
        }

        let mut promoted = Vec::new();
        for (fingerprint, candidate) in candidates {
            if candidate.occurrences < self.config.promotion_occurrences {
                continue;
            }
            if patterns.find_by_fingerprint(&fingerprint).is_some() {
                continue;
            }
            let successes = candidate.sequence.iter().filter(|a| a.success).count();
            let success_rate = successes as f64 / candidate.sequence.len() as f64;
            if success_rate < self.config.promotion_min_success_rate {
                continue;
            }
            let pattern = build_pattern(&fingerprint, &candidate, success_rate);
            patterns.upsert(pattern.clone());
            promoted.push(pattern);
        }
        promoted
    }
}

fn fingerprint_of(seq: &[BufferedAction]) -> String {
    seq.iter().map(|a| format!("{}:{}", a.verb, normalize_for_fingerprint(&a.intent))).collect::<Vec<_>>().join("|")
}

/// Strips digits (so `item_1` and `item_2` collapse to the same shape) and
/// collapses repeated separators, on top of the already-tokenized intent.
fn normalize_for_fingerprint(intent: &str) -> String {
    let mut out = String::with_capacity(intent.len());
    let mut last_was_sep = false;
    for ch in intent.chars() {
        if ch.is_ascii_digit() {
            continue;
        }
        if ch == '_' || ch == '-' {
            if !last_was_sep && !out.is_empty() {
                out.push('_');
                last_was_sep = true;
            }
        } else {
            out.push(ch);
            last_was_sep = false;
        }
    }
    out.trim_matches('_').to_string()
}

fn find_sequences(buffer: &[BufferedAction], window_len: usize, candidates: &mut HashMap<String, PatternCandidate>) {
    if buffer.len() < window_len {
        return;
    }
    let mut by_fingerprint: HashMap<String, Vec<&[BufferedAction]>> = HashMap::new();
    for window in buffer.windows(window_len) {
        by_fingerprint.entry(fingerprint_of(window)).or_default().push(window);
    }
    for (fingerprint, occurrences) in by_fingerprint {
        if occurrences.len() < 2 {
            continue;
        }
        let canonical = occurrences[0].to_vec();
        let mut domains: Vec<String> = Vec::new();
        for window in &occurrences {
            for action in window.iter() {
                if !domains.contains(&action.domain) {
                    domains.push(action.domain.clone());
                }
            }
        }
        candidates
            .entry(fingerprint)
            .and_modify(|c| {
                c.occurrences = c.occurrences.max(occurrences.len() as u32);
                for d in &domains {
                    if !c.domains.contains(d) {
                        c.domains.push(d.clone());
                    }
                }
            })
            .or_insert_with(|| PatternCandidate { sequence: canonical, occurrences: occurrences.len() as u32, domains });
    }
}

fn build_pattern(fingerprint: &str, candidate: &PatternCandidate, success_rate: f64) -> ActionPattern {
    let (name, category) = infer_metadata(&candidate.sequence);
    // Steps store the same normalized intent the fingerprint was built from,
    // so `ActionPattern::fingerprint()` recomputes to this exact string and
    // future lookups via `PatternStore::find_by_fingerprint` actually hit.
    let steps: Vec<PatternStep> = candidate
        .sequence
        .iter()
        .map(|a| PatternStep { verb: a.verb.clone(), intent: normalize_for_fingerprint(&a.intent), variable_slot: None })
        .collect();
    let required_intents = candidate.sequence.iter().map(|a| normalize_for_fingerprint(&a.intent)).collect();

    ActionPattern {
        id: format!("learned_{:x}", fingerprint_hash(fingerprint)),
        name,
        category,
        applicability: ApplicabilityPredicate { required_intents, page_has_elements: Vec::new(), page_lacks_elements: Vec::new() },
        steps,
        variable_names: Vec::new(),
        success_indicators: Vec::new(),
        failure_indicators: Vec::new(),
        usage_count: 0,
        success_count: 0,
        confidence: success_rate,
    }
}

/// A stable, dependency-free fingerprint hash -- good enough for a pattern
/// id, not a security primitive.
fn fingerprint_hash(fingerprint: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    fingerprint.hash(&mut hasher);
    hasher.finish()
}

fn infer_metadata(sequence: &[BufferedAction]) -> (String, String) {
    let intents: Vec<String> = sequence.iter().map(|a| a.intent.to_lowercase()).collect();
    let verbs: Vec<String> = sequence.iter().map(|a| a.verb.to_lowercase()).collect();

    let has = |needle: &str| intents.iter().any(|i| i.contains(needle));

    if (has("login") || has("username") || has("email")) && has("password") {
        return ("Learned Login Flow".to_string(), "login".to_string());
    }
    if verbs.iter().any(|v| v == "click") && (has("submit") || has("save")) {
        return ("Learned Form Submit".to_string(), "form".to_string());
    }
    if has("search") {
        return ("Learned Search Flow".to_string(), "search".to_string());
    }
    if has("nav") || has("menu") {
        return ("Learned Navigation".to_string(), "navigation".to_string());
    }
    (format!("Learned Pattern ({} steps)", sequence.len()), "general".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(domain: &str, verb: &str, intent: &str, success: bool) -> BufferedAction {
        BufferedAction { domain: domain.to_string(), verb: verb.to_string(), intent: intent.to_string(), success }
    }

    #[test]
    fn repeated_sequence_is_promoted_once_threshold_cleared() {
        let miner = PatternMiner::new(MiningConfig { promotion_occurrences: 3, ..Default::default() });
        for _ in 0..3 {
            miner.record(action("a.com", "fill", "username_input", true));
            miner.record(action("a.com", "fill", "password_input", true));
            miner.record(action("a.com", "click", "login_button", true));
        }
        let store = PatternStore::new();
        let promoted = miner.mine_and_promote(&store);
        assert!(!promoted.is_empty());
        assert!(promoted.iter().any(|p| p.category == "login"));
    }

    #[test]
    fn low_success_rate_sequence_is_not_promoted() {
        let miner = PatternMiner::new(MiningConfig { promotion_occurrences: 2, promotion_min_success_rate: 0.8, ..Default::default() });
        for i in 0..4 {
            miner.record(action("a.com", "click", "delete_row", i % 2 == 0));
        }
        let store = PatternStore::new();
        let promoted = miner.mine_and_promote(&store);
        assert!(promoted.is_empty());
    }

    #[test]
    fn buffer_respects_capacity() {
        let miner = PatternMiner::new(MiningConfig { action_buffer_capacity: 5, ..Default::default() });
        for i in 0..10 {
            miner.record(action("a.com", "click", &format!("item_{i}"), true));
        }
        assert_eq!(miner.buffer.lock().unwrap().len(), 5);
    }

    #[test]
    fn fingerprint_ignores_numeric_suffixes() {
        assert_eq!(normalize_for_fingerprint("item_1"), normalize_for_fingerprint("item_2"));
    }
}
