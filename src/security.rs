use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` segments without touching the filesystem.
/// `..` at the root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Makes `path` absolute against `base` (or the working directory) and normalizes it.
pub fn absolute_path(path: &Path, base: Option<&Path>) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path);
    }
    let joined = match base {
        Some(base) => base.join(path),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| Path::new(std::path::MAIN_SEPARATOR_STR).join(path)),
    };
    normalize_path(&joined)
}

/// True when `candidate` is `root` or lies below it, compared segment by segment.
pub fn is_path_inside(root: &Path, candidate: &Path) -> bool {
    let root = normalize_path(root);
    let candidate = normalize_path(candidate);
    #[cfg(windows)]
    {
        let fold = |p: &Path| PathBuf::from(p.to_string_lossy().to_lowercase());
        fold(&candidate).starts_with(fold(&root))
    }
    #[cfg(not(windows))]
    {
        candidate.starts_with(&root)
    }
}

/// True only for "path does not exist" style failures.
pub fn is_not_found_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }
    #[cfg(unix)]
    {
        matches!(err.raw_os_error(), Some(libc::ENOENT) | Some(libc::ENOTDIR))
    }
    #[cfg(not(unix))]
    {
        false
    }
}
