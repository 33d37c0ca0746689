// SPDX-License-Identifier: MIT

//! Loading rules from a YAML directory (the custom and promoted-rules
//! layers). An absent or empty directory is not an error — the engine simply
//! serves built-ins only, per the boundary behavior spec.md names explicitly.

use appliance_core::{Provenance, Rule};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read rules directory {}: {source}", path.display())]
    ReadDir { path: PathBuf, source: std::io::Error },
    #[error("failed to read rule file {}: {source}", path.display())]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("failed to parse rule file {}: {source}", path.display())]
    ParseYaml { path: PathBuf, source: serde_yaml::Error },
}

/// Loads every `*.yaml`/`*.yml` file in `dir`, tagging each parsed rule with
/// `provenance`. Each file may contain a single rule or a list of rules.
pub fn load_yaml_dir(dir: &Path, provenance: Provenance) -> Result<Vec<Rule>, LoadError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut rules = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::ReadDir { path: dir.to_path_buf(), source })?;

    for entry in entries {
        let entry = entry.map_err(|source| LoadError::ReadDir { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        let is_yaml = matches!(path.extension().and_then(|ext| ext.to_str()), Some("yaml") | Some("yml"));
        if !is_yaml {
            continue;
        }

        let text = std::fs::read_to_string(&path).map_err(|source| LoadError::ReadFile { path: path.clone(), source })?;
        let mut parsed = parse_yaml_document(&text, &path)?;
        for rule in &mut parsed {
            rule.provenance = provenance;
        }
        rules.extend(parsed);
    }

    Ok(rules)
}

fn parse_yaml_document(text: &str, path: &Path) -> Result<Vec<Rule>, LoadError> {
    if let Ok(rules) = serde_yaml::from_str::<Vec<Rule>>(text) {
        return Ok(rules);
    }
    let rule: Rule = serde_yaml::from_str(text).map_err(|source| LoadError::ParseYaml { path: path.to_path_buf(), source })?;
    Ok(vec![rule])
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
