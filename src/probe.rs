//! External probe adapters.
//!
//! Both probes are black-box command-line tools whose textual output is
//! parsed downstream, never reimplemented. The diagnostic probe runs once
//! per node; the replication probe runs once per report.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::domain::Node;
use crate::error::{ProbeError, ReplicationError};

/// Per-node diagnostic command (dcdiag-style).
#[derive(Debug, Clone)]
pub struct DiagnosticProbe {
    program: String,
    timeout: Duration,
}

impl DiagnosticProbe {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Run the diagnostic command against one node and return its stdout
    /// verbatim. Always verbose: summary mode omits the per-test detail
    /// the parser needs. The exit code is ignored; pass/fail is derived
    /// entirely from the text.
    pub async fn run(&self, node: &Node) -> Result<String, ProbeError> {
        debug!(node = %node.name, program = %self.program, "running diagnostic probe");
        let invocation = Command::new(&self.program)
            .arg(format!("/s:{}", node.name))
            .arg("/v")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(self.timeout, invocation)
            .await
            .map_err(|_| ProbeError::Timeout {
                node: node.name.clone(),
                timeout: self.timeout,
            })?
            .map_err(|e| ProbeError::Unavailable {
                node: node.name.clone(),
                source: e,
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Forest-wide replication status command (repadmin-style), invoked once
/// per report with a "select all nodes" argument and CSV output.
#[derive(Debug, Clone)]
pub struct ReplicationProbe {
    program: String,
    timeout: Duration,
}

impl ReplicationProbe {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub async fn run(&self) -> Result<String, ReplicationError> {
        debug!(program = %self.program, "running replication probe");
        let invocation = Command::new(&self.program)
            .args(["/showrepl", "*", "/csv"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(self.timeout, invocation)
            .await
            .map_err(|_| ReplicationError::Timeout(self.timeout))?
            .map_err(ReplicationError::ProbeFailed)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
