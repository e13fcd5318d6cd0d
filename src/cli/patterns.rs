use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use wayfarer_pattern_store::PatternStore;

#[derive(Args)]
pub struct PatternsArgs {
    /// Restrict the listing to one category (e.g. "login", "form")
    #[arg(short, long)]
    pub category: Option<String>,
}

pub fn cmd_patterns(args: PatternsArgs, knowledge_dir: &Path) -> Result<()> {
    let store = PatternStore::open(knowledge_dir).with_context(|| format!("opening pattern store at {}", knowledge_dir.display()))?;

    let patterns = match &args.category {
        Some(category) => store.by_category(category),
        None => store.all(),
    };

    if patterns.is_empty() {
        println!("no patterns learned yet");
        return Ok(());
    }

    for pattern in patterns {
        println!(
            "{:<24} {:<12} confidence={:.2} usage={}/{} steps={}",
            pattern.id, pattern.category, pattern.confidence, pattern.success_count, pattern.usage_count, pattern.steps.len()
        );
    }
    Ok(())
}
