use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::guard::alias::{AliasPolicyConfig, AlternateNamePolicy};
use crate::guard::types::BoundaryOpenRequest;

#[derive(Debug, Deserialize, Clone)]
pub struct GuardConfig {
    pub boundary: Boundary,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub checks: Checks,
    #[serde(default)]
    pub alias: Option<AliasPolicyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Boundary {
    #[serde(default = "default_label")]
    pub label: String,
    pub root_dir: PathBuf,
    #[serde(default)]
    pub canonical_root: Option<PathBuf>,
}
fn default_label() -> String { "root".to_string() }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Limits {
    #[serde(default)]
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Links {
    #[serde(default = "default_reject_hardlinks")]
    pub reject_hardlinks: bool,
}
fn default_reject_hardlinks() -> bool { true }

impl Default for Links {
    fn default() -> Self {
        Self {
            reject_hardlinks: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Checks {
    #[serde(default)]
    pub skip_lexical_root_check: bool,
}

impl GuardConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.boundary.label.trim().is_empty() { anyhow::bail!("boundary label must not be empty"); }
        if !self.boundary.root_dir.is_dir() {
            anyhow::bail!("root_dir does not exist or is not a directory: {}", self.boundary.root_dir.display());
        }
        if let Some(canonical) = &self.boundary.canonical_root {
            if !canonical.is_absolute() {
                anyhow::bail!("canonical_root must be absolute: {}", canonical.display());
            }
        }
        if self.limits.max_bytes == Some(0) { anyhow::bail!("max_bytes must be > 0"); }
        Ok(())
    }

    /// A request for `target` under this boundary, with the alternate-name
    /// policy attached when `[alias]` is configured.
    pub fn request_for(&self, target: impl Into<PathBuf>) -> BoundaryOpenRequest {
        let mut req = BoundaryOpenRequest::new(target, self.boundary.root_dir.clone(), self.boundary.label.clone())
            .reject_hardlinks(self.links.reject_hardlinks)
            .skip_lexical_root_check(self.checks.skip_lexical_root_check);
        if let Some(canonical) = &self.boundary.canonical_root {
            req = req.with_canonical_root(canonical.clone());
        }
        if let Some(max) = self.limits.max_bytes {
            req = req.with_max_bytes(max);
        }
        if let Some(alias) = &self.alias {
            req = req.with_alias_policy(Arc::new(AlternateNamePolicy::new(alias.clone())), None);
        }
        req
    }
}
