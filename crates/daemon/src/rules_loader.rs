// SPDX-License-Identifier: MIT

//! Combines the four rule provenance layers — built-in, custom, synced,
//! promoted — into the set handed to `RuleEngine::reload`. Collisions by id
//! are never resolved here; every layer's rules are kept and disambiguated
//! purely by priority, per the rule-loading contract.

use appliance_core::{Provenance, Rule};
use appliance_rules::{builtin_rules, load_bundle, load_yaml_dir, BundleVerifier};
use std::path::{Path, PathBuf};

pub struct RuleDirs {
    pub custom: PathBuf,
    pub synced: PathBuf,
    pub promoted: PathBuf,
}

impl RuleDirs {
    pub fn new(state_dir: &Path) -> Self {
        let rules_dir = state_dir.join("rules");
        Self { custom: rules_dir.clone(), synced: rules_dir.clone(), promoted: rules_dir.join("promoted") }
    }
}

/// Loads built-ins, the custom YAML directory, every synced `*.json` bundle,
/// and the promoted YAML directory, in that order.
pub fn load_all(dirs: &RuleDirs, verifier: &BundleVerifier) -> Result<Vec<Rule>, String> {
    let mut rules = builtin_rules();

    rules.extend(load_yaml_dir(&dirs.custom, Provenance::Custom).map_err(|err| err.to_string())?);

    for bundle in synced_bundle_files(&dirs.synced)? {
        let bytes = std::fs::read(&bundle).map_err(|err| format!("failed to read {}: {err}", bundle.display()))?;
        rules.extend(load_bundle(&bytes, verifier).map_err(|err| err.to_string())?);
    }

    rules.extend(load_yaml_dir(&dirs.promoted, Provenance::Promoted).map_err(|err| err.to_string())?);

    Ok(rules)
}

fn synced_bundle_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|err| format!("failed to read {}: {err}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| err.to_string())?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_builtins_when_no_directories_exist() {
        let dirs = RuleDirs { custom: PathBuf::from("/nonexistent/custom"), synced: PathBuf::from("/nonexistent/synced"), promoted: PathBuf::from("/nonexistent/promoted") };
        let verifier = BundleVerifier::new();
        let rules = load_all(&dirs, &verifier).unwrap();
        assert_eq!(rules.len(), builtin_rules().len());
    }
}
