//! Forest topology — domain and node enumeration.
//!
//! The directory query itself is an external collaborator: the default
//! [`CommandTopology`] shells out to a configurable per-domain listing
//! command (`nltest /dclist:<domain>` by default) and parses its output
//! leniently. The [`Topology`] trait is the seam that lets the report run
//! against an in-memory topology in tests.

use std::process::Command;

use tracing::debug;

use crate::config::TopologyConfig;
use crate::domain::Node;
use crate::error::EnumerationError;

/// A handle to the multi-domain topology being reported on.
pub trait Topology {
    /// All domains in the forest.
    fn domains(&self) -> Result<Vec<String>, EnumerationError>;

    /// All nodes belonging to one domain.
    fn domain_nodes(&self, domain: &str) -> Result<Vec<Node>, EnumerationError>;
}

/// Enumerate every node across every domain of the forest, deduplicated
/// and sorted ascending by case-insensitive name.
///
/// All-or-nothing: if any domain cannot be queried the whole enumeration
/// fails, since an incomplete node list would silently skip health checks.
pub fn enumerate_nodes(topology: &dyn Topology) -> Result<Vec<Node>, EnumerationError> {
    let mut nodes = Vec::new();
    for domain in topology.domains()? {
        nodes.extend(topology.domain_nodes(&domain)?);
    }
    nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    nodes.dedup_by(|a, b| a.sort_key() == b.sort_key());
    Ok(nodes)
}

const DEFAULT_NODES_COMMAND: &str = "nltest /dclist:{domain}";

/// Topology backed by an external listing command. Domains come from
/// config, defaulting to the forest root domain alone.
pub struct CommandTopology {
    domains: Vec<String>,
    nodes_command: String,
}

impl CommandTopology {
    pub fn new(forest: impl Into<String>, config: &TopologyConfig) -> Self {
        let domains = config
            .domains
            .clone()
            .unwrap_or_else(|| vec![forest.into()]);
        let nodes_command = config
            .nodes_command
            .clone()
            .unwrap_or_else(|| DEFAULT_NODES_COMMAND.to_string());
        Self {
            domains,
            nodes_command,
        }
    }
}

impl Topology for CommandTopology {
    fn domains(&self) -> Result<Vec<String>, EnumerationError> {
        Ok(self.domains.clone())
    }

    fn domain_nodes(&self, domain: &str) -> Result<Vec<Node>, EnumerationError> {
        let rendered = self.nodes_command.replace("{domain}", domain);
        let mut parts = rendered.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(EnumerationError::NoNodes {
                domain: domain.to_string(),
            });
        };

        debug!(domain, command = %rendered, "listing domain nodes");
        let output = Command::new(program).args(parts).output().map_err(|e| {
            EnumerationError::CommandFailed {
                domain: domain.to_string(),
                source: e,
            }
        })?;

        if !output.status.success() {
            return Err(EnumerationError::CommandStatus {
                domain: domain.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let nodes = parse_node_listing(domain, &String::from_utf8_lossy(&output.stdout));
        if nodes.is_empty() {
            return Err(EnumerationError::NoNodes {
                domain: domain.to_string(),
            });
        }
        Ok(nodes)
    }
}

/// Parse `nltest /dclist` style output: one host per line, surrounded by
/// banner/footer prose and per-host decorations, e.g.
///
/// ```text
/// Get list of DCs in domain 'contoso.com' from '\\dc1'.
///     dc1.contoso.com [PDC]  [DS] Site: Default-First-Site-Name
///     \\dc2.contoso.com       [DS] Site: Branch
/// The command completed successfully
/// ```
///
/// Only the first token of each line is considered, and only if it looks
/// like a fully-qualified host name.
pub fn parse_node_listing(domain: &str, raw: &str) -> Vec<Node> {
    raw.lines()
        .filter_map(|line| {
            let token = line.split_whitespace().next()?;
            let host = token.trim_start_matches('\\').trim_end_matches('.');
            let looks_like_host = host.contains('.')
                && host
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
            if !looks_like_host {
                return None;
            }
            Some(Node::new(host, domain))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    /// In-memory topology for tests; a `None` node list marks a domain
    /// that cannot be queried.
    struct StaticTopology {
        domains: Vec<(String, Option<Vec<Node>>)>,
    }

    impl Topology for StaticTopology {
        fn domains(&self) -> Result<Vec<String>, EnumerationError> {
            Ok(self.domains.iter().map(|(d, _)| d.clone()).collect())
        }

        fn domain_nodes(&self, domain: &str) -> Result<Vec<Node>, EnumerationError> {
            self.domains
                .iter()
                .find(|(d, _)| d == domain)
                .and_then(|(_, nodes)| nodes.clone())
                .ok_or_else(|| EnumerationError::NoNodes {
                    domain: domain.to_string(),
                })
        }
    }

    #[test]
    fn enumerates_sorted_and_deduplicated() {
        let topology = StaticTopology {
            domains: vec![
                (
                    "corp.contoso.com".into(),
                    Some(vec![
                        Node::new("DC2.corp.contoso.com", "corp.contoso.com"),
                        Node::new("dc1.corp.contoso.com", "corp.contoso.com"),
                    ]),
                ),
                (
                    "contoso.com".into(),
                    Some(vec![
                        Node::new("dc3.contoso.com", "contoso.com"),
                        // Same host reported twice with different casing.
                        Node::new("DC3.CONTOSO.COM", "contoso.com"),
                    ]),
                ),
            ],
        };

        let nodes = enumerate_nodes(&topology).unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "dc1.corp.contoso.com",
                "DC2.corp.contoso.com",
                "dc3.contoso.com",
            ]
        );
    }

    #[test]
    fn one_failing_domain_fails_the_whole_enumeration() {
        let topology = StaticTopology {
            domains: vec![
                (
                    "contoso.com".into(),
                    Some(vec![Node::new("dc1.contoso.com", "contoso.com")]),
                ),
                ("unreachable.example".into(), None),
            ],
        };
        assert!(enumerate_nodes(&topology).is_err());
    }

    #[test]
    fn parses_dclist_output() {
        let raw = indoc! {r"
            Get list of DCs in domain 'contoso.com' from '\\dc1'.
                dc1.contoso.com [PDC]  [DS] Site: Default-First-Site-Name
                \\dc2.contoso.com       [DS] Site: Branch
            The command completed successfully
        "};
        let nodes = parse_node_listing("contoso.com", raw);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["dc1.contoso.com", "dc2.contoso.com"]);
        assert!(nodes.iter().all(|n| n.domain == "contoso.com"));
    }

    #[test]
    fn listing_parse_ignores_non_host_lines() {
        assert!(parse_node_listing("d", "").is_empty());
        assert!(parse_node_listing("d", "no hosts here\n").is_empty());
    }

    #[test]
    fn command_topology_defaults_to_forest_root_domain() {
        let topology = CommandTopology::new("contoso.com", &TopologyConfig::default());
        assert_eq!(topology.domains().unwrap(), vec!["contoso.com"]);
    }
}
