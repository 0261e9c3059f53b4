//! `codesync list`: directive inventory, no network access.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use codesync_sync::{rewriter::short, scan_tree, DirectiveEntry};

use super::{display_path, target_dir, GlobalArgs, Status};

/// Arguments for `codesync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory (or single page) to scan; defaults to the configured docs root.
    pub dir: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ListJson<'a> {
    summary: ListSummaryJson,
    directives: &'a [DirectiveEntry],
    unreadable: Vec<UnreadableJson>,
}

#[derive(Serialize)]
struct UnreadableJson {
    path: PathBuf,
    error: String,
}

#[derive(Serialize)]
struct ListSummaryJson {
    directives: usize,
    generated: usize,
    pending: usize,
    invalid: usize,
    unreadable: usize,
}

#[derive(Tabled)]
struct ListTableRow {
    #[tabled(rename = "location")]
    location: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "digest")]
    digest: String,
    #[tabled(rename = "sources")]
    sources: String,
}

impl ListArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<Status> {
        let config = global.config()?;
        let root = target_dir(self.dir, &config);
        let inventory = scan_tree(&root, &config)
            .with_context(|| format!("failed to scan {}", root.display()))?;
        let entries = &inventory.entries;

        let summary = ListSummaryJson {
            directives: entries.len(),
            generated: entries.iter().filter(|e| e.generated).count(),
            pending: entries
                .iter()
                .filter(|e| !e.generated && e.error.is_none())
                .count(),
            invalid: entries.iter().filter(|e| e.error.is_some()).count(),
            unreadable: inventory.unreadable.len(),
        };
        let status = Status::from_problems(summary.invalid > 0 || summary.unreadable > 0);

        if self.json {
            let payload = ListJson {
                summary,
                directives: entries,
                unreadable: inventory
                    .unreadable
                    .iter()
                    .map(|(path, err)| UnreadableJson {
                        path: path.clone(),
                        error: err.to_string(),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
            return Ok(status);
        }

        for (path, err) in &inventory.unreadable {
            println!("✗ {}: {err}", display_path(path, &root));
        }
        if entries.is_empty() {
            println!("No directives under {}.", root.display());
            return Ok(status);
        }

        let rows: Vec<ListTableRow> = entries
            .iter()
            .map(|entry| ListTableRow {
                location: format!("{}:{}", display_path(&entry.path, &root), entry.line),
                state: state_label(entry).to_string(),
                digest: if entry.digest.is_empty() {
                    "-".to_string()
                } else {
                    short(&entry.digest).to_string()
                },
                sources: match &entry.error {
                    Some(err) => err.clone(),
                    None => entry.sources.join("\n"),
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!(
            "{} directive(s): {} generated, {} pending, {} invalid, {} unreadable page(s)",
            summary.directives,
            summary.generated,
            summary.pending,
            summary.invalid,
            summary.unreadable
        );
        Ok(status)
    }
}

fn state_label(entry: &DirectiveEntry) -> &'static str {
    if entry.error.is_some() {
        "invalid"
    } else if entry.generated {
        "generated"
    } else {
        "pending"
    }
}
