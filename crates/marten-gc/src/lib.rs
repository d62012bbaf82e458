//! # Marten GC
//!
//! Cell heap and stop-the-world mark/sweep collector.
//!
//! ## Design
//!
//! - **Handles, not pointers**: cells are addressed by [`GcRef`], an
//!   index plus a generation. A handle to a reclaimed cell never aliases the
//!   cell that later reuses its slot.
//! - **Tracing contract**: cell types implement [`Trace`] and report every
//!   handle they hold to a [`Tracer`]. The collector never looks inside a
//!   cell by any other route.
//! - **Explicit safe points**: allocation never triggers a collection. The
//!   owner decides when to call [`Heap::collect`], typically after
//!   [`Heap::should_collect`] reports that the allocation threshold was hit.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod handle;
pub mod heap;
pub mod trace;

pub use handle::GcRef;
pub use heap::{GcConfig, GcStats, Heap, MarkColor};
pub use trace::{Trace, Tracer};
