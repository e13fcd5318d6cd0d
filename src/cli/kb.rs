use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};

use wayfarer_core_types::ElementRecord;
use wayfarer_knowledge_store::KnowledgeStore;

#[derive(Args)]
pub struct KbArgs {
    #[command(subcommand)]
    pub action: KbAction,
}

#[derive(Subcommand)]
pub enum KbAction {
    /// Export a domain's element records to a versioned JSON document
    Export {
        domain: String,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Import a domain's element records from a previously exported document
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Apply confidence decay then drop anything under the keep threshold
    Prune,
    /// Print lookup/hit-rate counters
    Stats,
}

/// The versioned envelope described for knowledge import/export: one
/// section per persisted store, only the relevant one populated here.
#[derive(Debug, Serialize, Deserialize)]
struct ExportDocument {
    version: u32,
    exported_at: chrono::DateTime<Utc>,
    #[serde(rename = "type")]
    kind: String,
    domain: String,
    selectors: Vec<ElementRecord>,
}

pub fn cmd_kb(args: KbArgs, knowledge_dir: &Path, stale_after_days: i64, decay_rate: f64) -> Result<()> {
    let store = KnowledgeStore::open(knowledge_dir).with_context(|| format!("opening knowledge store at {}", knowledge_dir.display()))?;

    match args.action {
        KbAction::Export { domain, out } => {
            let records = store.export_domain(&domain);
            let doc = ExportDocument { version: 1, exported_at: Utc::now(), kind: "selectors".to_string(), domain, selectors: records };
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&out, serde_json::to_vec_pretty(&doc)?)?;
            println!("exported to {}", out.display());
        }
        KbAction::Import { file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let doc: ExportDocument = serde_json::from_slice(&bytes)?;
            store.import_domain(&doc.domain, doc.selectors)?;
            println!("imported domain {} from {}", doc.domain, file.display());
        }
        KbAction::Prune => {
            let decayed = store.apply_decay(stale_after_days, decay_rate);
            let pruned = store.prune();
            println!("decayed {decayed} records, pruned {pruned} below threshold");
        }
        KbAction::Stats => {
            let stats = store.stats();
            println!("{}", serde_yaml::to_string(&stats)?);
        }
    }
    Ok(())
}
