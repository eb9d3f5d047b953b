//! `dchealth nodes` — enumerate forest nodes without probing them.
//!
//! The enumeration half of the report on its own, handy for verifying
//! topology configuration before a full run.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config;
use crate::topology::{self, CommandTopology};

pub fn run(forest: Option<&str>, format: &str) -> Result<()> {
    let cfg = config::load()?;
    let forest = forest
        .map(str::to_string)
        .or_else(|| cfg.forest.clone())
        .context("no forest specified (use --forest or set `forest` in config)")?;

    let topology = CommandTopology::new(&forest, &cfg.topology);
    let nodes = topology::enumerate_nodes(&topology).context("node enumeration failed")?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    println!("{}", format!("Nodes in forest {forest}").bold());
    for node in &nodes {
        println!("  {} {}", node.name.bold(), node.domain.dimmed());
    }
    println!();
    println!("  {} node(s)", nodes.len());
    Ok(())
}
