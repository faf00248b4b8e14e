//! Asynchronous visibility sorting.
//!
//! Splats must be alpha-blended far-to-near, and reordering a large model
//! is too slow to do on the render thread. Each splat instance therefore
//! owns a [`worker::SortWorker`] thread holding a [`engine::SortEngine`];
//! the render thread fires sort requests and polls for reordered buffers
//! without ever blocking on them.

/// Depth ordering of splats against a view-projection matrix.
pub mod engine;
/// Background sort worker thread and message protocol.
pub mod worker;

pub use engine::{SortEngine, SortResult};
pub use worker::{SortWorker, SorterRequest, SorterResponse};
