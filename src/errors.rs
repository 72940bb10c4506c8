use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::guard::alias::AliasEscape;

/// Coarse classification of a failed boundary open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Validation,
    NotFound,
    NotFile,
    Symlink,
    TooLarge,
    Hardlink,
    PermissionDenied,
    Io,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Validation => "validation",
            FailureReason::NotFound => "not_found",
            FailureReason::NotFile => "not_file",
            FailureReason::Symlink => "symlink",
            FailureReason::TooLarge => "too_large",
            FailureReason::Hardlink => "hardlink",
            FailureReason::PermissionDenied => "permission_denied",
            FailureReason::Io => "io",
        }
    }
}

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("path escapes {label} boundary: {} is not under {}", path.display(), root.display())]
    EscapesBoundary { label: String, path: PathBuf, root: PathBuf },
    #[error("path resolves outside {label} boundary: {} is not under {}", path.display(), root.display())]
    ResolvesOutside { label: String, path: PathBuf, root: PathBuf },
    #[error("{label} boundary rejected {}: {source}", path.display())]
    AliasEscape {
        label: String,
        path: PathBuf,
        #[source]
        source: AliasEscape,
    },
    #[error("symlink rejected: {}", path.display())]
    Symlink { path: PathBuf },
    #[error("file changed while opening: {}", path.display())]
    IdentityMismatch { path: PathBuf },
    #[error("not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a regular file: {}", path.display())]
    NotFile { path: PathBuf },
    #[error("file too large: {} is {size} bytes, limit {max}", path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },
    #[error("hardlinked file rejected: {} has {links} links", path.display())]
    Hardlink { path: PathBuf, links: u64 },
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BoundaryError {
    pub fn reason(&self) -> FailureReason {
        match self {
            BoundaryError::EscapesBoundary { .. }
            | BoundaryError::ResolvesOutside { .. }
            | BoundaryError::AliasEscape { .. }
            | BoundaryError::IdentityMismatch { .. } => FailureReason::Validation,
            BoundaryError::Symlink { .. } => FailureReason::Symlink,
            BoundaryError::NotFound { .. } => FailureReason::NotFound,
            BoundaryError::NotFile { .. } => FailureReason::NotFile,
            BoundaryError::TooLarge { .. } => FailureReason::TooLarge,
            BoundaryError::Hardlink { .. } => FailureReason::Hardlink,
            BoundaryError::PermissionDenied { .. } => FailureReason::PermissionDenied,
            BoundaryError::Io { .. } => FailureReason::Io,
        }
    }

    pub fn code(&self) -> &'static str {
        self.reason().code()
    }

    /// Maps a raw filesystem error onto not-found, permission, or generic i/o.
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        if crate::security::is_not_found_error(&source) {
            BoundaryError::NotFound { path, source }
        } else if source.kind() == io::ErrorKind::PermissionDenied {
            BoundaryError::PermissionDenied { path, source }
        } else {
            BoundaryError::Io { path, source }
        }
    }
}
