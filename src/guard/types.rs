use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::alias::{AliasEscapePolicy, AliasPolicyConfig};
use crate::errors::BoundaryError;
use crate::fs::{FileStat, FsIo, OsFs};

/// One guarded open. Built per call and consumed once.
#[derive(Debug, Clone)]
pub struct BoundaryOpenRequest {
    pub(crate) target: PathBuf,
    pub(crate) root: PathBuf,
    pub(crate) label: String,
    pub(crate) canonical_root: Option<PathBuf>,
    pub(crate) max_bytes: Option<u64>,
    pub(crate) reject_hardlinks: bool,
    pub(crate) skip_lexical_root_check: bool,
    pub(crate) alias_policy: Option<Arc<dyn AliasEscapePolicy>>,
    pub(crate) alias_config: Option<AliasPolicyConfig>,
    pub(crate) io: Arc<dyn FsIo>,
}

impl BoundaryOpenRequest {
    pub fn new(target: impl Into<PathBuf>, root: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            root: root.into(),
            label: label.into(),
            canonical_root: None,
            max_bytes: None,
            reject_hardlinks: true,
            skip_lexical_root_check: false,
            alias_policy: None,
            alias_config: None,
            io: Arc::new(OsFs),
        }
    }

    /// A root the caller already canonicalized. Used as-is.
    pub fn with_canonical_root(mut self, canonical_root: impl Into<PathBuf>) -> Self {
        self.canonical_root = Some(canonical_root.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn reject_hardlinks(mut self, reject: bool) -> Self {
        self.reject_hardlinks = reject;
        self
    }

    pub fn skip_lexical_root_check(mut self, skip: bool) -> Self {
        self.skip_lexical_root_check = skip;
        self
    }

    /// Only consulted by the async entry point.
    pub fn with_alias_policy(mut self, policy: Arc<dyn AliasEscapePolicy>, config: Option<AliasPolicyConfig>) -> Self {
        self.alias_policy = Some(policy);
        self.alias_config = config;
        self
    }

    pub fn with_io(mut self, io: Arc<dyn FsIo>) -> Self {
        self.io = io;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn io(&self) -> &dyn FsIo {
        self.io.as_ref()
    }
}

/// A file opened inside the boundary. The caller owns the descriptor.
#[derive(Debug)]
pub struct BoundaryFile {
    pub path: PathBuf,
    pub file: File,
    pub stat: FileStat,
    pub root_real_path: PathBuf,
}

impl BoundaryFile {
    pub fn into_file(self) -> File {
        self.file
    }
}

pub type BoundaryOpenResult = Result<BoundaryFile, BoundaryError>;

/// Contents read through the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRead {
    pub path: PathBuf,
    pub root_real_path: PathBuf,
    pub bytes: Vec<u8>,
}
