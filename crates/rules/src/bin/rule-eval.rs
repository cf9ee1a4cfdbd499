//! rule-eval: evaluate one scripted rule against metric values.
//!
//! The rule is taken either from a rules directory by ID (`--rule`) or from
//! a single document (`--file`). Metric values are passed positionally in
//! the order the rule's `main` expects them.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info};

use lumen_core::config::{load_dotenv, Config};
use lumen_rules::{RuleDocument, RuleLoader};

// ── CLI ─────────────────────────────────────────────────────────────

/// Evaluate a scripted metric rule and print its result.
#[derive(Parser, Debug)]
#[command(name = "rule-eval", version, about)]
struct Cli {
    /// Rules directory to load `--rule` from (defaults to LUMEN_RULES_DIR).
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// ID of a rule in the rules directory.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    rule: Option<String>,

    /// Path to a single rule document.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Override or add a global constant, e.g. `--global warning=0.7`.
    #[arg(long = "global", value_parser = parse_global)]
    globals: Vec<(String, f64)>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Metric values, in argument order.
    #[arg(allow_negative_numbers = true)]
    values: Vec<f64>,
}

fn parse_global(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing global name in '{s}'"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for global '{name}': {e}"))?;
    Ok((name.to_string(), value))
}

fn load_document(cli: &Cli, config: &Config) -> anyhow::Result<RuleDocument> {
    if let Some(path) = &cli.file {
        return RuleLoader::load_file(path)
            .with_context(|| format!("failed to load rule document {}", path.display()));
    }
    let Some(id) = &cli.rule else {
        bail!("either --rule or --file is required");
    };

    let rules_dir = cli.rules_dir.clone().unwrap_or_else(|| config.rules_dir.clone());
    let mut loader = RuleLoader::new(rules_dir);
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan rules directory {}", loader.rules_dir().display()))?;
    debug!(files = results.len(), rules = loader.len(), "rules directory scanned");

    loader
        .get(id)
        .cloned()
        .with_context(|| format!("rule '{id}' not found in {}", loader.rules_dir().display()))
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    load_dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    let cli = Cli::parse();
    debug!(profile = %config.profile_label(), "configuration loaded");

    let doc = load_document(&cli, &config)?;
    let rule = doc.to_rule_with(cli.globals.iter().cloned())?;

    if !doc.metadata.enabled {
        info!(rule_id = %doc.id(), "rule is disabled, evaluating anyway");
    }

    let result = rule.evaluate(&cli.values)?;

    if cli.json {
        let out = serde_json::json!({
            "rule": rule.name(),
            "metrics": cli.values,
            "result": result,
        });
        println!("{out}");
    } else {
        println!("{result}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_global_accepts_name_value() {
        assert_eq!(parse_global("warning=0.7"), Ok(("warning".to_string(), 0.7)));
        assert_eq!(parse_global(" offset = -2 "), Ok(("offset".to_string(), -2.0)));
    }

    #[test]
    fn parse_global_requires_equals() {
        let err = parse_global("warning").unwrap_err();
        assert!(err.contains("expected NAME=VALUE"));
    }

    #[test]
    fn parse_global_requires_name() {
        let err = parse_global("=1").unwrap_err();
        assert!(err.contains("missing global name"));
    }

    #[test]
    fn parse_global_rejects_non_numeric_value() {
        let err = parse_global("warning=high").unwrap_err();
        assert!(err.contains("invalid value for global 'warning'"));
    }

    #[test]
    fn cli_collects_globals_and_negative_values() {
        let cli = Cli::try_parse_from([
            "rule-eval",
            "--file",
            "rule.yml",
            "--global",
            "critical=110",
            "--global",
            "warning=50",
            "85",
            "-1.5",
        ])
        .unwrap();
        assert_eq!(
            cli.globals,
            vec![("critical".to_string(), 110.0), ("warning".to_string(), 50.0)]
        );
        assert_eq!(cli.values, vec![85.0, -1.5]);
        assert!(cli.rule.is_none());
    }

    #[test]
    fn cli_requires_rule_or_file() {
        assert!(Cli::try_parse_from(["rule-eval", "1"]).is_err());
        assert!(Cli::try_parse_from(["rule-eval", "--rule", "a", "--file", "b.yml"]).is_err());
    }
}
