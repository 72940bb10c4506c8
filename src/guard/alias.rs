//! Escapes through alternate spellings of a path.
//!
//! Lexical and canonical comparison both work on one spelling of a location.
//! Filesystems that fold case, synthesize 8.3 short names, expose alternate
//! data streams, or strip trailing dots accept other spellings too; this
//! module rejects those before any descriptor is opened.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::security::absolute_path;

#[derive(Debug, Error)]
pub enum AliasEscape {
    #[error("alternate data stream in {component:?}")]
    StreamSuffix { component: String },
    #[error("short-name form {component:?}")]
    ShortName { component: String },
    #[error("trailing dot or space in {component:?}")]
    TrailingDot { component: String },
    #[error("{} differs from on-disk entry {on_disk:?} only by case", path.display())]
    CaseVariant { path: PathBuf, on_disk: String },
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AliasPolicyConfig {
    #[serde(default)]
    pub allow_case_variants: bool,
    #[serde(default = "default_true")]
    pub reject_short_names: bool,
    #[serde(default = "default_true")]
    pub reject_stream_suffixes: bool,
    #[serde(default = "default_true")]
    pub reject_trailing_dots: bool,
}
fn default_true() -> bool { true }

impl Default for AliasPolicyConfig {
    fn default() -> Self {
        Self {
            allow_case_variants: false,
            reject_short_names: true,
            reject_stream_suffixes: true,
            reject_trailing_dots: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AliasCheck<'a> {
    pub target: &'a Path,
    pub root: &'a Path,
    pub label: &'a str,
    /// Overrides the policy's own configuration for this call.
    pub config: Option<&'a AliasPolicyConfig>,
}

/// Returning `Err` is a hard rejection. [`open_boundary_file`](super::open_boundary_file)
/// also turns a panic inside `check` into a rejection.
#[async_trait]
pub trait AliasEscapePolicy: Send + Sync + fmt::Debug {
    async fn check(&self, check: AliasCheck<'_>) -> Result<(), AliasEscape>;
}

/// Rejects stream suffixes, short names, trailing dots and case-only matches
/// for the part of the target below the root.
#[derive(Debug, Clone, Default)]
pub struct AlternateNamePolicy {
    config: AliasPolicyConfig,
}

impl AlternateNamePolicy {
    pub fn new(config: AliasPolicyConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AliasEscapePolicy for AlternateNamePolicy {
    async fn check(&self, check: AliasCheck<'_>) -> Result<(), AliasEscape> {
        let config = check.config.unwrap_or(&self.config);
        let root = absolute_path(check.root, None);
        let target = absolute_path(check.target, Some(&root));
        // Targets outside the root are the containment check's business.
        let Ok(rel) = target.strip_prefix(&root) else {
            return Ok(());
        };

        let mut dir = root.clone();
        let mut on_disk = !config.allow_case_variants;
        for component in rel.components() {
            let Component::Normal(name) = component else { continue };
            check_spelling(&name.to_string_lossy(), config)?;
            if on_disk {
                match lookup_entry(&dir, name).await {
                    EntryMatch::Exact => {}
                    EntryMatch::CaseOnly(found) => {
                        tracing::debug!(boundary = check.label, path = %target.display(), on_disk = %found, "case-variant component");
                        return Err(AliasEscape::CaseVariant { path: dir.join(name), on_disk: found });
                    }
                    // Nothing below a missing entry can be checked on disk.
                    EntryMatch::Absent => on_disk = false,
                }
            }
            dir.push(name);
        }
        Ok(())
    }
}

fn check_spelling(component: &str, config: &AliasPolicyConfig) -> Result<(), AliasEscape> {
    if config.reject_stream_suffixes && component.contains(':') {
        return Err(AliasEscape::StreamSuffix { component: component.to_string() });
    }
    if config.reject_short_names && looks_like_short_name(component) {
        return Err(AliasEscape::ShortName { component: component.to_string() });
    }
    if config.reject_trailing_dots && (component.ends_with('.') || component.ends_with(' ')) {
        return Err(AliasEscape::TrailingDot { component: component.to_string() });
    }
    Ok(())
}

/// `PROGRA~1` style: a tilde followed by a digit.
fn looks_like_short_name(component: &str) -> bool {
    component
        .as_bytes()
        .windows(2)
        .any(|w| w[0] == b'~' && w[1].is_ascii_digit())
}

enum EntryMatch {
    Exact,
    CaseOnly(String),
    Absent,
}

async fn lookup_entry(dir: &Path, name: &OsStr) -> EntryMatch {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return EntryMatch::Absent;
    };
    let wanted = name.to_string_lossy().to_lowercase();
    let mut case_only = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let entry_name = entry.file_name();
        if entry_name.as_os_str() == name {
            return EntryMatch::Exact;
        }
        if case_only.is_none() && entry_name.to_string_lossy().to_lowercase() == wanted {
            case_only = Some(entry_name.to_string_lossy().into_owned());
        }
    }
    match case_only {
        Some(found) => EntryMatch::CaseOnly(found),
        None => EntryMatch::Absent,
    }
}
