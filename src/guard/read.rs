use std::sync::Arc;

use super::types::{BoundaryFile, BoundaryOpenRequest, BoundaryRead};
use super::{open_boundary_file, open_boundary_file_sync};
use crate::errors::BoundaryError;
use crate::fs::FsIo;

pub fn read_boundary_file_sync(request: BoundaryOpenRequest) -> Result<BoundaryRead, BoundaryError> {
    let io = Arc::clone(&request.io);
    let max_bytes = request.max_bytes;
    let opened = open_boundary_file_sync(request)?;
    read_and_close(io.as_ref(), opened, max_bytes)
}

pub async fn read_boundary_file(request: BoundaryOpenRequest) -> Result<BoundaryRead, BoundaryError> {
    let io = Arc::clone(&request.io);
    let max_bytes = request.max_bytes;
    let opened = open_boundary_file(request).await?;
    read_and_close(io.as_ref(), opened, max_bytes)
}

fn read_and_close(io: &dyn FsIo, opened: BoundaryFile, max_bytes: Option<u64>) -> Result<BoundaryRead, BoundaryError> {
    let BoundaryFile { path, mut file, root_real_path, .. } = opened;
    let read = io.read_file(&mut file, max_bytes);
    if let Err(err) = io.close(file) {
        tracing::warn!(path = %path.display(), error = %err, "close after read failed");
    }
    let bytes = read.map_err(|source| BoundaryError::Io { path: path.clone(), source })?;
    Ok(BoundaryRead { path, root_real_path, bytes })
}
