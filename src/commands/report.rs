//! `dchealth report` — the full forest health report.
//!
//! Enumeration is fatal (exit 1): an incomplete node list would silently
//! skip health checks. Everything after it degrades gracefully — an
//! unreachable node or a failed replication probe becomes a warning on
//! stderr and the report renders whatever was gathered (exit 0).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::config;
use crate::domain::diagnostic::{self, DiagnosticRecord};
use crate::domain::replication::{self, ReplicationLink};
use crate::domain::Node;
use crate::probe::{DiagnosticProbe, ReplicationProbe};
use crate::report::HealthReport;
use crate::topology::{self, CommandTopology};

pub struct ReportOptions {
    pub forest: Option<String>,
    pub timeout: Option<u64>,
    pub concurrency: Option<usize>,
    pub format: String,
}

pub fn run(opts: ReportOptions) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(opts))
}

async fn run_async(opts: ReportOptions) -> Result<()> {
    let cfg = config::load()?;
    let forest = opts
        .forest
        .or_else(|| cfg.forest.clone())
        .context("no forest specified (use --forest or set `forest` in config)")?;

    let topology = CommandTopology::new(&forest, &cfg.topology);
    let nodes = topology::enumerate_nodes(&topology).context("node enumeration failed")?;

    let timeout = Duration::from_secs(opts.timeout.unwrap_or(cfg.probes.timeout_secs));
    let concurrency = opts.concurrency.unwrap_or(cfg.probes.concurrency).max(1);

    let mut warnings = Vec::new();
    let (diagnostics, cancelled) = collect_diagnostics(
        &nodes,
        DiagnosticProbe::new(&cfg.probes.diagnostic_command, timeout),
        concurrency,
        &mut warnings,
    )
    .await;

    let replication = if cancelled {
        warnings.push("interrupted; replication status not collected".to_string());
        Vec::new()
    } else {
        collect_replication(
            ReplicationProbe::new(&cfg.probes.replication_command, timeout),
            &mut warnings,
        )
        .await
    };

    let report = HealthReport::new(forest, diagnostics, replication, warnings);
    for warning in &report.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    match opts.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => report.print_table(),
    }
    Ok(())
}

/// Probe every node on a bounded worker pool. Per-node isolation: one
/// unreachable node becomes a warning, never an abort. Ctrl-C aborts the
/// outstanding probes and keeps whatever already completed.
async fn collect_diagnostics(
    nodes: &[Node],
    probe: DiagnosticProbe,
    concurrency: usize,
    warnings: &mut Vec<String>,
) -> (Vec<DiagnosticRecord>, bool) {
    let probe = Arc::new(probe);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for node in nodes.iter().cloned() {
        let probe = Arc::clone(&probe);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = probe.run(&node).await;
            let record = result.map(|raw| diagnostic::parse(&node, &raw));
            (node, record)
        });
    }

    let mut diagnostics = Vec::new();
    let mut cancelled = false;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c, if !cancelled => {
                warn!("interrupted, aborting outstanding probes");
                warnings.push("interrupted; rendering partial diagnostic results".to_string());
                tasks.abort_all();
                cancelled = true;
            }
            joined = tasks.join_next() => {
                match joined {
                    None => break,
                    Some(Ok((_, Ok(record)))) => diagnostics.push(record),
                    Some(Ok((node, Err(e)))) => {
                        warn!(node = %node.name, error = %e, "diagnostic probe failed");
                        warnings.push(format!("{}: {e}", node.name));
                    }
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => warnings.push(format!("diagnostic probe task failed: {e}")),
                }
            }
        }
    }

    (diagnostics, cancelled)
}

/// One replication probe covers the whole forest. Failure here is fatal to
/// the replication section only.
async fn collect_replication(
    probe: ReplicationProbe,
    warnings: &mut Vec<String>,
) -> Vec<ReplicationLink> {
    let raw = match probe.run().await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "replication probe failed");
            warnings.push(format!("replication section omitted: {e}"));
            return Vec::new();
        }
    };

    match replication::parse(&raw) {
        Ok(parsed) => {
            if parsed.skipped_rows > 0 {
                warnings.push(format!(
                    "{} malformed replication row(s) skipped",
                    parsed.skipped_rows
                ));
            }
            parsed.links
        }
        Err(e) => {
            warn!(error = %e, "replication output unusable");
            warnings.push(format!("replication section omitted: {e}"));
            Vec::new()
        }
    }
}
