//! Open-then-verify primitive.
//!
//! The path is opened first and the descriptor is what gets checked. A path
//! swapped between the preflight `lstat` and `open` shows up as an identity
//! mismatch on the descriptor, not as a silently followed link.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use super::{FileKind, FileStat, FsIo, OpenConstants};
use crate::errors::BoundaryError;

#[derive(Debug, Clone)]
pub struct OpenVerifiedParams<'a> {
    /// The path the caller asked for, used in diagnostics.
    pub path: &'a Path,
    /// The path actually opened.
    pub resolved_path: &'a Path,
    pub reject_hardlinks: bool,
    pub max_bytes: Option<u64>,
}

#[derive(Debug)]
pub struct VerifiedFile {
    pub path: PathBuf,
    pub file: File,
    pub stat: FileStat,
}

pub fn open_verified(io: &dyn FsIo, params: &OpenVerifiedParams<'_>) -> Result<VerifiedFile, BoundaryError> {
    let resolved = params.resolved_path;

    let pre = io
        .lstat(resolved)
        .map_err(|e| BoundaryError::from_io(params.path.to_path_buf(), e))?;
    match pre.kind {
        FileKind::Symlink => return Err(classify_symlink(io, params)),
        FileKind::File => {}
        FileKind::Dir | FileKind::Other => {
            return Err(BoundaryError::NotFile { path: params.path.to_path_buf() })
        }
    }

    let flags = io.constants().unwrap_or_else(OpenConstants::native);
    let file = io
        .open(resolved, flags.nofollow | flags.cloexec | flags.nonblock)
        .map_err(|e| classify_open_error(params.path, e))?;

    let verified = verify_descriptor(io, &file, &pre, params).and_then(|stat| {
        clear_nonblocking(&file).map_err(|source| BoundaryError::Io { path: params.path.to_path_buf(), source })?;
        Ok(stat)
    });
    match verified {
        Ok(stat) => Ok(VerifiedFile { path: resolved.to_path_buf(), file, stat }),
        Err(err) => {
            if let Err(close_err) = io.close(file) {
                tracing::warn!(path = %resolved.display(), error = %close_err, "close after rejected open failed");
            }
            Err(err)
        }
    }
}

fn verify_descriptor(
    io: &dyn FsIo,
    file: &File,
    pre: &FileStat,
    params: &OpenVerifiedParams<'_>,
) -> Result<FileStat, BoundaryError> {
    let path = params.path.to_path_buf();
    let stat = io
        .fstat(file)
        .map_err(|source| BoundaryError::Io { path: path.clone(), source })?;
    if !stat.is_file() {
        return Err(BoundaryError::NotFile { path });
    }
    if !stat.same_identity(pre) {
        return Err(BoundaryError::IdentityMismatch { path });
    }
    if params.reject_hardlinks {
        if let Some(links) = stat.nlink.filter(|n| *n > 1) {
            return Err(BoundaryError::Hardlink { path, links });
        }
    }
    if let Some(max) = params.max_bytes {
        if stat.size > max {
            return Err(BoundaryError::TooLarge { path, size: stat.size, max });
        }
    }
    Ok(stat)
}

/// A link whose target is missing is reported as not found; any other link at
/// the resolved path is a symlink rejection.
fn classify_symlink(io: &dyn FsIo, params: &OpenVerifiedParams<'_>) -> BoundaryError {
    let path = params.path.to_path_buf();
    match io.canonicalize(params.resolved_path) {
        Err(source) if crate::security::is_not_found_error(&source) => BoundaryError::NotFound { path, source },
        _ => BoundaryError::Symlink { path },
    }
}

/// The open used `O_NONBLOCK` so a FIFO swapped in after the preflight cannot
/// hang it; regular-file reads go back to blocking mode.
fn clear_nonblocking(file: &File) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // Safety: F_GETFL/F_SETFL on a descriptor owned by `file`.
        #[allow(unsafe_code)]
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }
        if flags & libc::O_NONBLOCK != 0 {
            #[allow(unsafe_code)]
            let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) };
            if rc == -1 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    #[cfg(not(unix))]
    let _ = file;
    Ok(())
}

fn classify_open_error(path: &Path, err: io::Error) -> BoundaryError {
    #[cfg(unix)]
    {
        if err.raw_os_error() == Some(libc::ELOOP) {
            return BoundaryError::Symlink { path: path.to_path_buf() };
        }
    }
    BoundaryError::from_io(path.to_path_buf(), err)
}
