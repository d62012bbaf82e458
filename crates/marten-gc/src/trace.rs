//! Tracing interfaces

use crate::handle::GcRef;

/// Receives the handles reported by [`Trace::trace`] during marking.
pub trait Tracer<T> {
    /// Mark a cell as reachable
    fn mark(&mut self, cell: GcRef<T>);
}

/// Trait for cell types that can be traced by the collector.
///
/// Implementations must report *every* handle the cell holds. A missed handle
/// lets the collector reclaim a live cell; reporting an extra one only
/// retains garbage for another cycle.
pub trait Trace: Sized {
    /// Trace all handles held by this cell
    fn trace(&self, tracer: &mut dyn Tracer<Self>);
}
