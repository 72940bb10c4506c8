use super::{FsIo, Primitive};

/// Primitives the given capability set does not provide, in [`Primitive::ALL`] order.
pub fn missing_primitives(io: &dyn FsIo) -> Vec<Primitive> {
    Primitive::ALL.iter().copied().filter(|p| !io.provides(*p)).collect()
}

/// True when `io` is complete enough to run the boundary guard.
pub fn has_boundary_io(io: &dyn FsIo) -> bool {
    missing_primitives(io).is_empty() && io.constants().is_some()
}
