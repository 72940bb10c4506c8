use std::io;
use std::path::{Path, PathBuf};

use crate::fs::FsIo;
use crate::security::{absolute_path, is_not_found_error};

/// Outcome of canonicalizing a path.
#[derive(Debug)]
pub enum Resolution {
    Canonical(PathBuf),
    /// Canonicalization failed; `lexical` is the normalized input and is not a
    /// vetted value.
    Fallback { lexical: PathBuf, error: io::Error },
}

impl Resolution {
    /// The canonical path, or the lexical fallback.
    pub fn into_path(self) -> PathBuf {
        match self {
            Resolution::Canonical(p) => p,
            Resolution::Fallback { lexical, .. } => lexical,
        }
    }
}

pub fn resolve_canonical(io: &dyn FsIo, path: &Path) -> Resolution {
    let lexical = absolute_path(path, None);
    match io.canonicalize(&lexical) {
        Ok(canonical) => Resolution::Canonical(canonical),
        Err(error) => {
            if is_not_found_error(&error) {
                tracing::debug!(path = %lexical.display(), "canonicalize: path missing, using lexical form");
            } else {
                tracing::warn!(path = %lexical.display(), %error, "canonicalize failed, using lexical form");
            }
            Resolution::Fallback { lexical, error }
        }
    }
}

pub fn resolve_or_lexical(io: &dyn FsIo, path: &Path) -> PathBuf {
    resolve_canonical(io, path).into_path()
}
