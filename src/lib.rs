//! # softsolve
//!
//! **Runtime soft-linking and batched dispatch for vendor dense solvers.**
//!
//! softsolve lets one call site drive either NVIDIA cuSOLVER or AMD hipSOLVER
//! without linking against either at build time. The vendor library is opened
//! with `dlopen` when first needed, every entry point is resolved up front, and
//! missing pieces are replaced by stubs that fail loudly only when used.
//!
//! ## Layers
//!
//! - [`softlink`]: opens a shared library, translates cuSOLVER names to their
//!   hipSOLVER equivalents, and hands out [`EntryPoint`]s
//! - [`solver`]: batched SVD (`gesvd`), QR (`geqrf`) and Q reconstruction
//!   (`orgqr`/`ungqr`) loops over caller-owned device buffers
//! - [`dtype`]: element types and their vendor-specific letters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use softsolve::prelude::*;
//!
//! let lib = SolverLibrary::global()?;
//! let batch = GeqrfBatch::<f32>::new(m, n, a_ptr, tau_ptr, count)
//!     .workspace(work_ptr, lwork)
//!     .info(info_ptr);
//! unsafe { lib.geqrf_batched::<DefaultSolver, f32>(handle, &batch)? };
//! ```
//!
//! ## Feature Flags
//!
//! - `hip`: target ROCm; names are translated and `HipSolver` is the default
//! - `cuda`: RAII cusolver handle bound to a `cudarc` stream

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dtype;
pub mod error;
pub mod softlink;
pub mod solver;

pub use softlink::{BUG_REPORT_URL, EntryPoint, NameMappingTable, SoftLink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::SolverConfig;
    pub use crate::dtype::{Complex64, Complex128, DType, SolverElement};
    pub use crate::error::{Error, Result};
    pub use crate::softlink::{EntryPoint, SoftLink};
    pub use crate::solver::{
        Backend, BatchedSolver, CudaSolver, GeqrfBatch, GesvdBatch, HipSolver, OrgqrBatch,
        SolverHandle, SolverLibrary, SolverOp, SvdJob,
    };

    #[cfg(feature = "cuda")]
    pub use crate::solver::CusolverHandle;

    pub use crate::DefaultSolver;
}

/// Dispatcher selected for this build
///
/// - With `hip` feature: `HipSolver`
/// - Otherwise: `CudaSolver`
#[cfg(feature = "hip")]
pub type DefaultSolver = solver::HipSolver;

/// Dispatcher selected for this build
#[cfg(not(feature = "hip"))]
pub type DefaultSolver = solver::CudaSolver;
