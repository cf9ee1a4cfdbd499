//! YAML rule document schema.
//!
//! ```yaml
//! apiVersion: v1
//! kind: MetricRule
//! metadata:
//!   id: ups-load
//!   name: UPS load score
//! inputs: [load, runtime_minutes]
//! globals:
//!   warning: 0.8
//! code: |
//!   function main(load, runtime_minutes)
//!     return load / warning
//!   end
//! ```

use std::collections::BTreeMap;

use lumen_core::MetricList;
use serde::{Deserialize, Serialize};

use crate::rule::{self, Rule};

pub const API_VERSION: &str = "v1";
pub const METRIC_RULE_KIND: &str = "MetricRule";

/// Metadata block shared by every rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// A scripted metric rule as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: RuleMetadata,
    /// Metric names, in the order they are passed to `main`.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Named constants injected as script globals.
    #[serde(default)]
    pub globals: BTreeMap<String, f64>,
    pub code: String,
}

impl RuleDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Build and validate a [`Rule`] named after `metadata.id`.
    pub fn to_rule(&self) -> rule::Result<Rule> {
        Rule::from_parts(
            self.metadata.id.clone(),
            self.globals.clone(),
            self.code.clone(),
        )
    }

    /// Like [`to_rule`](Self::to_rule), with `overrides` replacing or adding
    /// globals before the code first runs, so top level statements see the
    /// overridden values.
    pub fn to_rule_with<K: Into<String>>(
        &self,
        overrides: impl IntoIterator<Item = (K, f64)>,
    ) -> rule::Result<Rule> {
        let mut globals = self.globals.clone();
        globals.extend(overrides.into_iter().map(|(k, v)| (k.into(), v)));
        Rule::from_parts(self.metadata.id.clone(), globals, self.code.clone())
    }

    /// Pick the declared inputs out of a metric collection, in order.
    pub fn inputs_from(&self, metrics: &MetricList) -> lumen_core::Result<Vec<f64>> {
        metrics.values_for(self.inputs.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{CoreError, Metric};

    const DOC: &str = r#"
apiVersion: v1
kind: MetricRule
metadata:
  id: ups-load
  name: UPS load
inputs: [load, temperature]
globals:
  max_temp: 40
code: |
  function main(load, temperature)
    return load * (temperature / max_temp)
  end
"#;

    #[test]
    fn parse_document_with_defaults() {
        let doc = RuleDocument::from_yaml(DOC).unwrap();
        assert_eq!(doc.api_version, API_VERSION);
        assert_eq!(doc.kind, METRIC_RULE_KIND);
        assert_eq!(doc.id(), "ups-load");
        assert!(doc.metadata.enabled);
        assert!(doc.metadata.tags.is_none());
        assert_eq!(doc.inputs, vec!["load", "temperature"]);
        assert_eq!(doc.globals.get("max_temp"), Some(&40.0));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = DOC.replace("inputs:", "inputz:");
        assert!(RuleDocument::from_yaml(&yaml).is_err());
    }

    #[test]
    fn to_rule_evaluates_inputs_from_metric_list() {
        let doc = RuleDocument::from_yaml(DOC).unwrap();
        let rule = doc.to_rule().unwrap();
        assert_eq!(rule.name(), "ups-load");

        let metrics: MetricList = vec![
            Metric::new("ups-01", "temperature", 20.0, 1),
            Metric::new("ups-01", "load", 0.5, 1),
        ]
        .into_iter()
        .collect();
        let args = doc.inputs_from(&metrics).unwrap();
        assert_eq!(args, vec![0.5, 20.0]);
        assert_eq!(rule.evaluate(&args).unwrap(), 0.25);
    }

    #[test]
    fn inputs_from_reports_missing_metric() {
        let doc = RuleDocument::from_yaml(DOC).unwrap();
        let metrics: MetricList = vec![Metric::new("ups-01", "load", 0.5, 1)]
            .into_iter()
            .collect();
        assert_eq!(
            doc.inputs_from(&metrics),
            Err(CoreError::MissingMetric("temperature".to_string()))
        );
    }

    const BAND_DOC: &str = r#"
apiVersion: v1
kind: MetricRule
metadata:
  id: load-band
  name: Load band
globals:
  warning: 60
  critical: 85
code: |
  band = critical - warning
  function main(x)
    return (x - warning) / band
  end
"#;

    #[test]
    fn overrides_are_visible_to_top_level_code() {
        let doc = RuleDocument::from_yaml(BAND_DOC).unwrap();
        let rule = doc.to_rule_with([("critical", 110.0)]).unwrap();

        assert_eq!(rule.globals().get("critical"), Some(&110.0));
        assert_eq!(rule.globals().get("warning"), Some(&60.0));
        assert_eq!(rule.evaluate(&[85.0]).unwrap(), 0.5);
        // The document itself is untouched.
        assert_eq!(doc.to_rule().unwrap().evaluate(&[85.0]).unwrap(), 1.0);
    }

    #[test]
    fn overrides_can_add_new_globals() {
        let doc = RuleDocument::from_yaml(DOC).unwrap();
        let rule = doc
            .to_rule_with([("scale".to_string(), 2.0)])
            .unwrap();
        assert_eq!(rule.globals().len(), 2);
        assert_eq!(rule.globals().get("scale"), Some(&2.0));
    }

    #[test]
    fn no_overrides_matches_to_rule() {
        let doc = RuleDocument::from_yaml(BAND_DOC).unwrap();
        let rule = doc.to_rule_with(Vec::<(String, f64)>::new()).unwrap();
        assert_eq!(rule.globals(), &doc.globals);
        assert_eq!(rule.evaluate(&[72.5]).unwrap(), 0.5);
    }

    #[test]
    fn yaml_round_trip_keeps_code() {
        let doc = RuleDocument::from_yaml(DOC).unwrap();
        let again = RuleDocument::from_yaml(&doc.to_yaml().unwrap()).unwrap();
        assert_eq!(again, doc);
    }
}
