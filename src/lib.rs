// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// GPU / graphics allowances — casts are intentional and safe
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
// Float comparison: graphics math frequently compares against 0.0, 1.0,
// etc.
#![allow(clippy::float_cmp)]
// Pedantic allowances
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::use_self)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]

//! GPU-accelerated Gaussian splatting renderer built on wgpu.
//!
//! Luster renders point-cloud splat models as camera-facing, alpha-blended
//! instanced quads. Correct blending needs the quads drawn far-to-near,
//! and reordering tens of thousands of instances is too slow for the
//! render thread, so each [`splat::SplatInstance`] owns a background
//! [`sort::SortWorker`] that recomputes the visible ordering while frames
//! keep drawing the previous one.
//!
//! # Key entry points
//!
//! - [`splat::SplatModel`] - four parallel arrays describing N splats
//! - [`splat::SplatInstance`] - one model, its quad mesh, and its worker
//! - [`splat::SplatRenderer`] - pipeline plus instance collection
//! - [`options::Options`] - runtime configuration (display, camera)
//!
//! # Architecture
//!
//! The render loop never blocks on a worker: sort requests are
//! fire-and-forget, results are polled in during `update`, and the
//! coalescing policy in [`splat::SortCoordinator`] guarantees a burst of
//! camera motion costs at most two sorts. GPU buffers are owned and
//! mutated only by the render thread; the worker owns its copy of the
//! model arrays and never touches GPU state.

pub mod camera;
pub mod error;
pub mod gpu;
pub mod options;
pub mod sort;
pub mod splat;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::LusterError;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
