use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Forest root domain; overridden by `--forest`.
    pub forest: Option<String>,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Static domain list; defaults to the forest root domain alone.
    pub domains: Option<Vec<String>>,
    /// Per-domain node listing command; `{domain}` is substituted.
    pub nodes_command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub diagnostic_command: String,
    pub replication_command: String,
    /// Per-probe timeout in seconds; overridden by `--timeout`.
    pub timeout_secs: u64,
    /// Diagnostic worker pool size; overridden by `--concurrency`.
    pub concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            diagnostic_command: "dcdiag".into(),
            replication_command: "repadmin".into(),
            timeout_secs: 120,
            concurrency: 4,
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("dchealth").join("config.toml"))
    }
}

pub fn load() -> Result<Config> {
    load_from(&Config::path()?)
}

fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.probes.diagnostic_command, "dcdiag");
        assert_eq!(config.probes.replication_command, "repadmin");
        assert_eq!(config.probes.timeout_secs, 120);
        assert_eq!(config.probes.concurrency, 4);
        assert!(config.topology.domains.is_none());
    }

    #[test]
    fn parses_full_config() {
        let raw = indoc! {r#"
            forest = "contoso.com"

            [topology]
            domains = ["contoso.com", "corp.contoso.com"]
            nodes_command = "nltest /dclist:{domain}"

            [probes]
            diagnostic_command = "/opt/ad-tools/dcdiag"
            timeout_secs = 30
            concurrency = 8
        "#};
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.forest.as_deref(), Some("contoso.com"));
        assert_eq!(
            config.topology.domains,
            Some(vec!["contoso.com".to_string(), "corp.contoso.com".to_string()])
        );
        assert_eq!(config.probes.diagnostic_command, "/opt/ad-tools/dcdiag");
        // Unset keys fall back to defaults.
        assert_eq!(config.probes.replication_command, "repadmin");
        assert_eq!(config.probes.timeout_secs, 30);
        assert_eq!(config.probes.concurrency, 8);
    }

    #[test]
    fn partial_config_uses_section_defaults() {
        let config: Config = toml::from_str("forest = \"contoso.com\"\n").unwrap();
        assert_eq!(config.probes.timeout_secs, 120);
        assert!(config.topology.nodes_command.is_none());
    }
}
