//! Report aggregation and rendering.
//!
//! Pure transform step: merges per-node diagnostic records into a paged
//! table and groups replication links by source node. Ordering is total
//! and deterministic regardless of probe completion order.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::domain::diagnostic::{DiagnosticRecord, TestOutcome};
use crate::domain::replication::ReplicationLink;

/// Diagnostic table pages are capped at this many test columns. The test
/// set is open-ended (discovered by parsing), so pages are computed from
/// the discovered columns rather than a hardcoded list.
pub const TESTS_PER_PAGE: usize = 8;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub forest: String,
    pub diagnostics: Vec<DiagnosticRecord>,
    pub replication: Vec<ReplicationLink>,
    pub warnings: Vec<String>,
}

impl HealthReport {
    pub fn new(
        forest: impl Into<String>,
        mut diagnostics: Vec<DiagnosticRecord>,
        mut replication: Vec<ReplicationLink>,
        warnings: Vec<String>,
    ) -> Self {
        diagnostics.sort_by(|a, b| a.node.to_lowercase().cmp(&b.node.to_lowercase()));
        replication.sort_by(|a, b| {
            (a.source.to_lowercase(), &a.naming_context, a.destination.to_lowercase()).cmp(&(
                b.source.to_lowercase(),
                &b.naming_context,
                b.destination.to_lowercase(),
            ))
        });
        Self {
            generated_at: Utc::now(),
            forest: forest.into(),
            diagnostics,
            replication,
            warnings,
        }
    }

    /// Union of all test names seen across all records, sorted.
    pub fn test_names(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .flat_map(|r| r.outcomes.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Replication links grouped by source node; links are already in
    /// (source, naming context, destination) order.
    pub fn replication_by_source(&self) -> Vec<(&str, Vec<&ReplicationLink>)> {
        let mut groups: Vec<(&str, Vec<&ReplicationLink>)> = Vec::new();
        for link in &self.replication {
            match groups.last_mut() {
                Some((source, members)) if source.eq_ignore_ascii_case(&link.source) => {
                    members.push(link);
                }
                _ => groups.push((link.source.as_str(), vec![link])),
            }
        }
        groups
    }

    pub fn print_table(&self) {
        println!("{}", "═══ Forest Health Report ═══".cyan().bold());
        println!("  Forest:     {}", self.forest.bold());
        println!("  Generated:  {}", self.generated_at.to_rfc3339());

        println!();
        println!("{}", "── Diagnostics ──".yellow());
        if self.diagnostics.is_empty() {
            println!("  (no diagnostic data)");
        } else {
            self.print_diagnostic_pages();
        }

        println!();
        println!("{}", "── Replication ──".yellow());
        if self.replication.is_empty() {
            println!("  (no replication data)");
        } else {
            self.print_replication_groups();
        }
    }

    fn print_diagnostic_pages(&self) {
        let names = self.test_names();
        let node_width = self
            .diagnostics
            .iter()
            .map(|r| r.node.len())
            .max()
            .unwrap_or(4)
            .max("Node".len());

        for (page, columns) in names.chunks(TESTS_PER_PAGE).enumerate() {
            if page > 0 {
                println!();
            }

            let widths: Vec<usize> = columns.iter().map(|n| n.len().max(4)).collect();
            let mut header = format!("  {:<node_width$}", "Node");
            for (name, &width) in columns.iter().zip(&widths) {
                header.push_str(&format!("  {name:<width$}"));
            }
            println!("{}", header.dimmed());

            for record in &self.diagnostics {
                let pad = node_width.saturating_sub(record.node.len());
                print!("  {}{}", record.node.bold(), " ".repeat(pad));
                for (name, &width) in columns.iter().zip(&widths) {
                    // Colored strings carry escape codes, so pad manually.
                    let (cell, visible) = match record.outcomes.get(name) {
                        Some(TestOutcome::Passed) => ("pass".green().to_string(), 4),
                        Some(TestOutcome::Failed) => ("FAIL".red().bold().to_string(), 4),
                        None => ("-".dimmed().to_string(), 1),
                    };
                    let pad = width.saturating_sub(visible);
                    print!("  {cell}{}", " ".repeat(pad));
                }
                println!();
            }
        }
    }

    fn print_replication_groups(&self) {
        for (source, links) in self.replication_by_source() {
            println!("  {} {}", "Source:".dimmed(), source.bold());
            for link in links {
                let failures = if link.failure_count > 0 {
                    format!("failures: {}", link.failure_count).red().to_string()
                } else {
                    "failures: 0".to_string()
                };
                let mut line = format!(
                    "    {} → {}  [{}]  {}",
                    link.naming_context,
                    link.destination,
                    if link.transport.is_empty() { "?" } else { &link.transport },
                    failures,
                );
                if let Some(ref success) = link.last_success_time {
                    line.push_str(&format!("  last success: {success}"));
                }
                if link.failure_count > 0 {
                    if let Some(ref failure) = link.last_failure_time {
                        line.push_str(&format!("  last failure: {failure}"));
                    }
                    if !link.last_failure_status.is_empty() {
                        line.push_str(&format!(" (status {})", link.last_failure_status));
                    }
                }
                println!("{line}");
            }
            println!();
        }
    }
}
