pub mod opener;
pub mod probe;

use std::fmt;
use std::fs::{File, Metadata, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// Snapshot of file status, taken either from a path or from an open descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub size: u64,
    /// `None` where the platform does not report link counts.
    pub nlink: Option<u64>,
    /// `(dev, ino)` where the platform exposes it.
    pub identity: Option<(u64, u64)>,
}

impl FileStat {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let ft = meta.file_type();
        let kind = if ft.is_symlink() {
            FileKind::Symlink
        } else if ft.is_file() {
            FileKind::File
        } else if ft.is_dir() {
            FileKind::Dir
        } else {
            FileKind::Other
        };
        #[cfg(unix)]
        let (nlink, identity) = {
            use std::os::unix::fs::MetadataExt;
            (Some(meta.nlink()), Some((meta.dev(), meta.ino())))
        };
        #[cfg(not(unix))]
        let (nlink, identity) = (None, None);
        Self { kind, size: meta.len(), nlink, identity }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// False only when both sides report an identity and they differ.
    pub fn same_identity(&self, other: &FileStat) -> bool {
        match (self.identity, other.identity) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// Open flags namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenConstants {
    pub nofollow: i32,
    pub cloexec: i32,
    pub nonblock: i32,
}

impl OpenConstants {
    pub fn native() -> Self {
        #[cfg(unix)]
        {
            Self { nofollow: libc::O_NOFOLLOW, cloexec: libc::O_CLOEXEC, nonblock: libc::O_NONBLOCK }
        }
        #[cfg(not(unix))]
        {
            Self { nofollow: 0, cloexec: 0, nonblock: 0 }
        }
    }
}

/// The primitives the boundary guard needs from an [`FsIo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Open,
    Close,
    Fstat,
    Lstat,
    Canonicalize,
    ReadFile,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::Open,
        Primitive::Close,
        Primitive::Fstat,
        Primitive::Lstat,
        Primitive::Canonicalize,
        Primitive::ReadFile,
    ];
}

/// Filesystem capability set. Everything the guard does to the filesystem goes
/// through here, so tests and restricted hosts can substitute their own.
pub trait FsIo: Send + Sync + fmt::Debug {
    /// Opens `path` read-only with extra platform flags.
    fn open(&self, path: &Path, custom_flags: i32) -> io::Result<File>;
    fn close(&self, file: File) -> io::Result<()>;
    fn fstat(&self, file: &File) -> io::Result<FileStat>;
    fn lstat(&self, path: &Path) -> io::Result<FileStat>;
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
    /// Reads from the descriptor, at most `limit` bytes when set.
    fn read_file(&self, file: &mut File, limit: Option<u64>) -> io::Result<Vec<u8>>;
    fn constants(&self) -> Option<OpenConstants>;

    fn provides(&self, _primitive: Primitive) -> bool {
        true
    }
}

/// The host operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FsIo for OsFs {
    fn open(&self, path: &Path, custom_flags: i32) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.read(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(custom_flags);
        }
        #[cfg(not(unix))]
        let _ = custom_flags;
        options.open(path)
    }

    fn close(&self, file: File) -> io::Result<()> {
        drop(file);
        Ok(())
    }

    fn fstat(&self, file: &File) -> io::Result<FileStat> {
        file.metadata().map(|m| FileStat::from_metadata(&m))
    }

    fn lstat(&self, path: &Path) -> io::Result<FileStat> {
        std::fs::symlink_metadata(path).map(|m| FileStat::from_metadata(&m))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        dunce::canonicalize(path)
    }

    fn read_file(&self, file: &mut File, limit: Option<u64>) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        match limit {
            Some(max) => {
                file.take(max).read_to_end(&mut buf)?;
            }
            None => {
                file.read_to_end(&mut buf)?;
            }
        }
        Ok(buf)
    }

    fn constants(&self) -> Option<OpenConstants> {
        Some(OpenConstants::native())
    }
}
