//! Installable units and argument placeholders.
//!
//! A unit is a package name template plus the runtime version, resolved once
//! (`php{version}-fpm` with `8.2` → `php8.2-fpm`). Step arguments refer to
//! units as `{unit:<name>}` and to the version as `{version}`. `{{` and `}}`
//! stand for literal braces, so shell and awk snippets pass through.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallableUnit {
    /// Name used in `{unit:<name>}` placeholders.
    pub name: String,
    /// Package name with an optional `{version}` placeholder.
    pub template: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("unknown placeholder {{{0}}} in {1:?}")]
    UnknownPlaceholder(String, String),
    #[error("unclosed placeholder in {0:?}")]
    Unclosed(String),
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
    #[error("duplicate unit {0:?}")]
    DuplicateUnit(String),
}

/// Units resolved against one runtime version.
#[derive(Debug, Clone, Default)]
pub struct ResolvedUnits {
    version: String,
    names: BTreeMap<String, String>,
}

impl ResolvedUnits {
    pub fn resolve(units: &[InstallableUnit], version: &str) -> Result<Self, PlanError> {
        let mut resolved = ResolvedUnits {
            version: version.to_string(),
            names: BTreeMap::new(),
        };
        for unit in units {
            // Templates may only use {version}.
            let package = expand(&unit.template, version, &BTreeMap::new())?;
            if resolved.names.insert(unit.name.clone(), package).is_some() {
                return Err(PlanError::DuplicateUnit(unit.name.clone()));
            }
        }
        Ok(resolved)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Expand `{version}` and `{unit:<name>}` in one argument.
    pub fn expand(&self, arg: &str) -> Result<String, PlanError> {
        expand(arg, &self.version, &self.names)
    }
}

fn expand(input: &str, version: &str, units: &BTreeMap<String, String>) -> Result<String, PlanError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{{").or_else(|| tail.strip_prefix("}}")) {
            out.push_str(&tail[..1]);
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix('}') {
            // A lone closing brace has no placeholder to end.
            out.push('}');
            rest = after;
            continue;
        }
        let after = &tail[1..];
        let close = after
            .find('}')
            .ok_or_else(|| PlanError::Unclosed(input.to_string()))?;
        let key = &after[..close];
        if key == "version" {
            out.push_str(version);
        } else if let Some(unit) = key.strip_prefix("unit:") {
            let package = units
                .get(unit)
                .ok_or_else(|| PlanError::UnknownUnit(unit.to_string()))?;
            out.push_str(package);
        } else {
            return Err(PlanError::UnknownPlaceholder(key.to_string(), input.to_string()));
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
