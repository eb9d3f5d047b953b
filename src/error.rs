//! Error taxonomy.
//!
//! Only [`EnumerationError`] aborts a report run: without a complete node
//! list, health checks would be silently skipped. Everything else degrades
//! to partial output plus warnings on stderr.

use std::time::Duration;

use thiserror::Error;

/// Node enumeration failures. All-or-nothing: one unqueryable domain fails
/// the whole enumeration.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("failed to run node listing command for domain {domain}: {source}")]
    CommandFailed {
        domain: String,
        #[source]
        source: std::io::Error,
    },

    #[error("node listing for domain {domain} exited with {status}: {stderr}")]
    CommandStatus {
        domain: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("node listing for domain {domain} produced no nodes")]
    NoNodes { domain: String },
}

/// Per-node diagnostic probe failures. Recovered locally: the node is
/// reported as having no diagnostic data and the run continues.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("diagnostic probe unavailable for {node}: {source}")]
    Unavailable {
        node: String,
        #[source]
        source: std::io::Error,
    },

    #[error("diagnostic probe for {node} timed out after {timeout:?}")]
    Timeout { node: String, timeout: Duration },
}

/// Replication probe and parse failures. Fatal to the replication section
/// only; diagnostics already gathered are still rendered.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("failed to run replication probe: {0}")]
    ProbeFailed(#[source] std::io::Error),

    #[error("replication probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("replication output is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("replication output is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("replication output is empty")]
    Empty,
}
