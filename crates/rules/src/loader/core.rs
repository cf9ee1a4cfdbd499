//! Core [`RuleLoader`] struct: filesystem-backed rule document loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::rule::Rule;
use crate::schema::{RuleDocument, METRIC_RULE_KIND};

use super::error::{LoadError, LoadResult, LoadStatus, Result};

/// Filesystem-backed rule document loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files and keeps
/// every document that validates, keyed by `metadata.id`.
pub struct RuleLoader {
    /// Root directory containing rule YAML files.
    rules_dir: PathBuf,
    documents: BTreeMap<String, RuleDocument>,
}

impl RuleLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
            documents: BTreeMap::new(),
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Parse and validation
    /// errors are reported per file but do not abort the scan. A missing
    /// rules directory is an error.
    pub fn load_all(&mut self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        let root = self.rules_dir.clone();
        self.scan_dir_recursive(&root, &mut results, true)?;
        Ok(results)
    }

    fn scan_dir_recursive(
        &mut self,
        dir: &Path,
        results: &mut Vec<LoadResult>,
        is_root: bool,
    ) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if is_root => return Err(e.into()),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        // Sorted so that duplicate IDs resolve the same way on every run.
        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(e) => paths.push(e.path()),
                Err(e) if is_root => return Err(e.into()),
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "failed to read directory entry");
                }
            }
        }
        paths.sort();

        for path in paths {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results, false)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            match Self::load_file(&path) {
                Ok(doc) => {
                    let rule_id = doc.id().to_string();
                    info!(rule_id = %rule_id, path = %path.display(), "loaded rule");
                    if self.documents.insert(rule_id.clone(), doc).is_some() {
                        warn!(rule_id = %rule_id, path = %path.display(), "duplicate rule id, replacing earlier document");
                    }
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a single rule document.
    ///
    /// The document's code is compiled once in a throwaway rule so that
    /// broken scripts are rejected at load time.
    pub fn load_file(path: &Path) -> Result<RuleDocument> {
        let contents = fs::read_to_string(path)?;
        let doc = RuleDocument::from_yaml(&contents)?;

        if doc.kind != METRIC_RULE_KIND {
            return Err(LoadError::Validation(format!(
                "unsupported rule kind '{}', expected '{}'",
                doc.kind, METRIC_RULE_KIND
            )));
        }
        if doc.metadata.id.is_empty() {
            return Err(LoadError::Validation(
                "rule metadata.id must not be empty".to_string(),
            ));
        }

        doc.to_rule()?;
        Ok(doc)
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    pub fn get(&self, id: &str) -> Option<&RuleDocument> {
        self.documents.get(id)
    }

    /// IDs of all loaded documents, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Build a fresh, validated [`Rule`] from a loaded document.
    pub fn build(&self, id: &str) -> Result<Rule> {
        let doc = self
            .get(id)
            .ok_or_else(|| LoadError::NotFound(id.to_string()))?;
        Ok(doc.to_rule()?)
    }
}
