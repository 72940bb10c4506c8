//! Open files under a trusted root, refusing anything that escapes it
//! lexically, through symlinks, or through an alternate spelling.

pub mod config;
pub mod errors;
pub mod fs;
pub mod guard;
pub mod logging;
pub mod resolve;
pub mod security;


pub use errors::{BoundaryError, FailureReason};
pub use fs::probe::has_boundary_io;
pub use fs::{FileStat, FsIo, OsFs};
pub use guard::alias::{AliasEscape, AliasEscapePolicy, AliasPolicyConfig, AlternateNamePolicy};
pub use guard::read::{read_boundary_file, read_boundary_file_sync};
pub use guard::types::{BoundaryFile, BoundaryOpenRequest, BoundaryOpenResult, BoundaryRead};
pub use guard::{open_boundary_file, open_boundary_file_sync};
