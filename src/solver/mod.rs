//! Batched dense solver dispatch
//!
//! This module turns resolved vendor entry points into batched operations.
//!
//! # Backends
//!
//! - [`CudaSolver`] - cuSOLVER semantics
//! - [`HipSolver`] - hipSOLVER semantics (no batched SVD, optional workspace)
//!
//! Both implement [`BatchedSolver`]. A build picks one through
//! [`DefaultSolver`](crate::DefaultSolver); the two are never mixed on one
//! handle.
//!
//! # Preconditions shared by every dispatcher
//!
//! - The solver handle is bound to the caller's stream before the call.
//! - The workspace is reused by every item and must fit the largest one.
//! - Calls are issued one at a time; device work may still run asynchronously
//!   on the bound stream.

mod batch;
mod cuda;
mod ffi;
#[cfg(feature = "cuda")]
mod handle;
mod hip;
mod library;

pub use batch::{
    GeqrfBatch, GesvdBatch, GesvdStrides, OrgqrBatch, QrStrides, SvdJob, run_batch,
};
pub use cuda::CudaSolver;
pub use ffi::{
    GeqrfBufferSizeFn, GeqrfFn, GesvdBufferSizeFn, GesvdFn, OrgqrBufferSizeFn, OrgqrFn,
    STATUS_SUCCESS, SolverHandle, Status,
};
#[cfg(feature = "cuda")]
pub use handle::CusolverHandle;
pub use hip::HipSolver;
pub use library::SolverLibrary;

use crate::dtype::{DType, SolverElement};
use crate::error::{Error, Result};
use crate::softlink::EntryPoint;
use std::ffi::c_int;
use std::fmt;

// ============================================================================
// Backend
// ============================================================================

/// Vendor stack a build targets
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// NVIDIA CUDA / cuSOLVER
    Cuda,
    /// AMD ROCm / hipSOLVER
    Hip,
}

impl Backend {
    /// Backend selected by this build's features
    #[inline]
    pub const fn compiled() -> Self {
        if cfg!(feature = "hip") {
            Self::Hip
        } else {
            Self::Cuda
        }
    }

    /// Shared library to open by default, `None` where the vendor ships none
    pub const fn default_library(self) -> Option<&'static str> {
        match self {
            Self::Cuda if cfg!(windows) => Some("cusolver64_11.dll"),
            Self::Cuda if cfg!(target_os = "linux") => Some("libcusolver.so.11"),
            Self::Hip if cfg!(windows) => Some("hipsolver.dll"),
            Self::Hip if cfg!(target_os = "linux") => Some("libhipsolver.so.0"),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cuda => f.write_str("cuda"),
            Self::Hip => f.write_str("hip"),
        }
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Vendor routines resolved for every element type
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SolverOp {
    /// Singular value decomposition
    Gesvd = 0,
    /// Workspace query for `Gesvd`
    GesvdBufferSize = 1,
    /// QR factorization
    Geqrf = 2,
    /// Workspace query for `Geqrf`
    GeqrfBufferSize = 3,
    /// Q reconstruction (`orgqr` for real types, `ungqr` for complex)
    Orgqr = 4,
    /// Workspace query for `Orgqr`
    OrgqrBufferSize = 5,
}

impl SolverOp {
    /// Every operation, in discriminant order
    pub const ALL: [SolverOp; 6] = [
        Self::Gesvd,
        Self::GesvdBufferSize,
        Self::Geqrf,
        Self::GeqrfBufferSize,
        Self::Orgqr,
        Self::OrgqrBufferSize,
    ];

    /// Family name used in diagnostics
    pub const fn family(self) -> &'static str {
        match self {
            Self::Gesvd | Self::GesvdBufferSize => "gesvd",
            Self::Geqrf | Self::GeqrfBufferSize => "geqrf",
            Self::Orgqr | Self::OrgqrBufferSize => "orgqr",
        }
    }

    /// Returns true for the workspace queries
    pub const fn is_buffer_size(self) -> bool {
        matches!(
            self,
            Self::GesvdBufferSize | Self::GeqrfBufferSize | Self::OrgqrBufferSize
        )
    }

    /// cuSOLVER name without the `cusolver` prefix, e.g. `DnCungqr_bufferSize`
    pub fn logical_name(self, dtype: DType) -> String {
        let routine = match self {
            Self::Gesvd | Self::GesvdBufferSize => "gesvd",
            Self::Geqrf | Self::GeqrfBufferSize => "geqrf",
            Self::Orgqr | Self::OrgqrBufferSize if dtype.is_complex() => "ungqr",
            Self::Orgqr | Self::OrgqrBufferSize => "orgqr",
        };
        let suffix = if self.is_buffer_size() {
            "_bufferSize"
        } else {
            ""
        };
        format!("Dn{}{}{}", dtype.vendor_letter(), routine, suffix)
    }
}

// ============================================================================
// Dispatcher interface
// ============================================================================

/// Batched solver dispatch for one vendor backend
///
/// Each method takes the entry point resolved for the operation and element
/// type. Stub entry points fail before any call is issued. A non-zero vendor
/// status stops the batch and is returned as [`Error::VendorCall`].
pub trait BatchedSolver {
    /// Backend this dispatcher speaks to
    const BACKEND: Backend;

    /// Whether `op` does real work on this backend
    fn supports(op: SolverOp) -> bool {
        let _ = op;
        true
    }

    /// Batched SVD
    ///
    /// # Safety
    ///
    /// `handle` must be live and every buffer in `batch` must be valid device
    /// memory for `batch_count` items at the strides `batch.strides()` reports.
    unsafe fn gesvd_batched<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        batch: &GesvdBatch<T>,
    ) -> Result<()>;

    /// Batched QR factorization
    ///
    /// # Safety
    ///
    /// Same requirements as [`BatchedSolver::gesvd_batched`].
    unsafe fn geqrf_batched<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        batch: &GeqrfBatch<T>,
    ) -> Result<()>;

    /// Batched Q reconstruction from `geqrf` output
    ///
    /// # Safety
    ///
    /// Same requirements as [`BatchedSolver::gesvd_batched`].
    unsafe fn orgqr_batched<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        batch: &OrgqrBatch<T>,
    ) -> Result<()>;

    /// Workspace elements one `gesvd` item needs
    ///
    /// # Safety
    ///
    /// `handle` must be live.
    unsafe fn gesvd_buffer_size<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        m: i32,
        n: i32,
    ) -> Result<i32>;

    /// Workspace elements one `geqrf` item needs
    ///
    /// # Safety
    ///
    /// `handle` must be live and `a` valid device memory for one item.
    unsafe fn geqrf_buffer_size<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        m: i32,
        n: i32,
        a: *mut T,
        lda: i32,
    ) -> Result<i32> {
        // SAFETY: entries registered under SolverOp::GeqrfBufferSize follow
        // GeqrfBufferSizeFn on both vendors.
        let func: GeqrfBufferSizeFn<T> = unsafe { entry.get()? };
        query_size(SolverOp::GeqrfBufferSize, |lwork| unsafe {
            func(handle, m, n, a, lda, lwork)
        })
    }

    /// Workspace elements one `orgqr` item needs
    ///
    /// # Safety
    ///
    /// `handle` must be live; `a` and `tau` valid device memory for one item.
    #[allow(clippy::too_many_arguments)]
    unsafe fn orgqr_buffer_size<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        m: i32,
        n: i32,
        k: i32,
        a: *const T,
        lda: i32,
        tau: *const T,
    ) -> Result<i32> {
        // SAFETY: entries registered under SolverOp::OrgqrBufferSize follow
        // OrgqrBufferSizeFn on both vendors.
        let func: OrgqrBufferSizeFn<T> = unsafe { entry.get()? };
        query_size(SolverOp::OrgqrBufferSize, |lwork| unsafe {
            func(handle, m, n, k, a, lda, tau, lwork)
        })
    }
}

/// Run a `_bufferSize` query writing its result through `lwork`
pub(crate) fn query_size<F>(op: SolverOp, call: F) -> Result<i32>
where
    F: FnOnce(*mut c_int) -> Status,
{
    let mut lwork: c_int = 0;
    let status = call(&mut lwork);
    if status != STATUS_SUCCESS {
        return Err(Error::VendorCall {
            op: op.family(),
            status,
            index: 0,
        });
    }
    Ok(lwork)
}
