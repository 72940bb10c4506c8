//! Boundary-confined file opening.
//!
//! A target is checked twice: lexically against the root as given, and
//! canonically (symlinks resolved) against the canonical root. Each check can
//! be fooled on its own. A lexical check misses symlinks, and a canonical check
//! has nothing to say when resolution fails. [`decide_containment`] combines
//! them:
//!
//! * resolution succeeded: the canonical answer wins;
//! * resolution failed: a lexical escape is final, whatever the cause of the
//!   failure, and anything else goes to the opener with the lexical path.
//!
//! The opener re-verifies the descriptor it gets, so the window between these
//! checks and the open is covered there rather than here.

pub mod alias;
pub mod read;
pub mod types;

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use self::alias::{AliasCheck, AliasEscape};
use self::types::{BoundaryFile, BoundaryOpenRequest, BoundaryOpenResult};
use crate::errors::{BoundaryError, FailureReason};
use crate::fs::opener::{open_verified, OpenVerifiedParams};
use crate::resolve::{resolve_canonical, resolve_or_lexical, Resolution};
use crate::security::{absolute_path, is_path_inside};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainmentDecision {
    /// Canonical target inside the canonical root.
    Inside(PathBuf),
    /// Resolution failed and the lexical check passed or was skipped. The
    /// opener gets the lexical path and classifies whatever happens.
    Deferred(PathBuf),
    /// Lexically outside and not canonically inside.
    LexicalEscape,
    /// Canonical target outside the canonical root.
    CanonicalEscape(PathBuf),
}

/// `canonical_target` is `None` when canonicalization failed.
pub fn decide_containment(
    lexical_target: &Path,
    lexical_inside: bool,
    skip_lexical_root_check: bool,
    canonical_target: Option<&Path>,
    canonical_root: &Path,
) -> ContainmentDecision {
    let lexical_escape = !skip_lexical_root_check && !lexical_inside;
    match canonical_target {
        Some(canonical) => {
            let inside = is_path_inside(canonical_root, canonical);
            if lexical_escape && !inside {
                ContainmentDecision::LexicalEscape
            } else if !inside {
                ContainmentDecision::CanonicalEscape(canonical.to_path_buf())
            } else {
                ContainmentDecision::Inside(canonical.to_path_buf())
            }
        }
        None if lexical_escape => ContainmentDecision::LexicalEscape,
        None => ContainmentDecision::Deferred(lexical_target.to_path_buf()),
    }
}

/// Opens `request.target` if it is inside `request.root`. Never suspends.
pub fn open_boundary_file_sync(request: BoundaryOpenRequest) -> BoundaryOpenResult {
    let io = request.io();
    let root = absolute_path(&request.root, None);
    let target = absolute_path(&request.target, Some(&root));
    let root_real_path = match &request.canonical_root {
        Some(trusted) => trusted.clone(),
        None => resolve_or_lexical(io, &root),
    };

    let lexical_inside = is_path_inside(&root, &target);
    let resolution = resolve_canonical(io, &target);
    let canonical = match &resolution {
        Resolution::Canonical(path) => Some(path.as_path()),
        Resolution::Fallback { .. } => None,
    };

    let decision = decide_containment(
        &target,
        lexical_inside,
        request.skip_lexical_root_check,
        canonical,
        &root_real_path,
    );
    let resolved = match decision {
        ContainmentDecision::Inside(path) | ContainmentDecision::Deferred(path) => path,
        ContainmentDecision::LexicalEscape => {
            return Err(deny(BoundaryError::EscapesBoundary {
                label: request.label.clone(),
                path: target,
                root,
            }));
        }
        ContainmentDecision::CanonicalEscape(_) => {
            return Err(deny(BoundaryError::ResolvesOutside {
                label: request.label.clone(),
                path: target,
                root: root_real_path,
            }));
        }
    };

    let params = OpenVerifiedParams {
        path: &target,
        resolved_path: &resolved,
        reject_hardlinks: request.reject_hardlinks,
        max_bytes: request.max_bytes,
    };
    match open_verified(io, &params) {
        Ok(verified) => {
            tracing::debug!(
                boundary = %request.label,
                path = %verified.path.display(),
                decision = "allow",
                "boundary open"
            );
            Ok(BoundaryFile {
                path: verified.path,
                file: verified.file,
                stat: verified.stat,
                root_real_path,
            })
        }
        Err(err) => Err(deny(err)),
    }
}

/// Runs the alias policy, if any, then [`open_boundary_file_sync`].
///
/// The policy check is the only suspension point and no descriptor exists
/// before it completes, so dropping this future early leaks nothing. A policy
/// that panics is treated as a rejection.
pub async fn open_boundary_file(request: BoundaryOpenRequest) -> BoundaryOpenResult {
    if let Some(policy) = &request.alias_policy {
        let check = AliasCheck {
            target: &request.target,
            root: &request.root,
            label: &request.label,
            config: request.alias_config.as_ref(),
        };
        let outcome = match AssertUnwindSafe(policy.check(check)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(AliasEscape::Rejected(format!("alias policy panicked: {}", panic_message(&*panic)))),
        };
        if let Err(source) = outcome {
            return Err(deny(BoundaryError::AliasEscape {
                label: request.label.clone(),
                path: request.target.clone(),
                source,
            }));
        }
    }
    open_boundary_file_sync(request)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn deny(err: BoundaryError) -> BoundaryError {
    if err.reason() == FailureReason::Validation {
        tracing::warn!(code = err.code(), decision = "deny", error = %err, "boundary open rejected");
    } else {
        tracing::debug!(code = err.code(), decision = "deny", error = %err, "boundary open failed");
    }
    err
}
