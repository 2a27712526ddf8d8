//! Batch descriptors and the shared batch loop
//!
//! A batch is `batch_count` same-shaped problems laid out back to back in
//! caller-owned device buffers. Each descriptor knows how far every buffer
//! moves between items; [`run_batch`] drives the calls and stops at the first
//! non-zero status.
//!
//! # State machine
//!
//! ```text
//! Running(i) --status == 0, i+1 < count--> Running(i+1)
//! Running(i) --status == 0, i+1 == count--> Completed
//! Running(i) --status != 0--> Failed(status, i)   (terminal, no retry)
//! ```
//!
//! Device addresses are never dereferenced on the host. Offsets are computed
//! with wrapping arithmetic so descriptors can carry any address the vendor
//! accepts.

use super::ffi::{STATUS_SUCCESS, Status};
use crate::dtype::SolverElement;
use crate::error::{Error, Result};
use std::ffi::c_schar;
use tracing::debug;

// ============================================================================
// SVD job flags
// ============================================================================

/// Which singular vectors `gesvd` computes (`jobu` / `jobvt`)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SvdJob {
    /// `'A'`: all columns of U (all rows of VT)
    All,
    /// `'S'`: the first min(m, n) columns of U (rows of VT)
    Reduced,
    /// `'O'`: vectors overwrite A, the U/VT buffer is not written
    Overwrite,
    /// `'N'`: no vectors
    None,
}

impl SvdJob {
    /// LAPACK job character
    #[inline]
    pub const fn as_char(self) -> char {
        match self {
            Self::All => 'A',
            Self::Reduced => 'S',
            Self::Overwrite => 'O',
            Self::None => 'N',
        }
    }

    /// Parse a LAPACK job character (case-insensitive)
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Self::All),
            'S' => Ok(Self::Reduced),
            'O' => Ok(Self::Overwrite),
            'N' => Ok(Self::None),
            other => Err(Error::invalid_argument(
                "job",
                format!("expected one of A, S, O, N, got '{}'", other),
            )),
        }
    }

    #[inline]
    pub(crate) fn as_raw(self) -> c_schar {
        self.as_char() as u8 as c_schar
    }

    /// Elements between consecutive factor matrices of a batch
    ///
    /// `dim` is m for U and n for VT; `k` is min(m, n).
    #[inline]
    pub fn factor_stride(self, dim: usize, k: usize) -> Result<usize> {
        match self {
            Self::All => elements("factor", dim, dim),
            Self::Reduced => elements("factor", dim, k),
            Self::Overwrite | Self::None => Ok(0),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Validate a vendor dimension and convert it to an element count
pub(crate) fn dim(arg: &'static str, value: i32) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::invalid_argument(arg, format!("must be non-negative, got {}", value)))
}

/// Element count `rows * cols` of one item's buffer
pub(crate) fn elements(arg: &'static str, rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols).ok_or_else(|| {
        Error::invalid_argument(
            arg,
            format!("{} x {} elements overflows the address space", rows, cols),
        )
    })
}

/// Address of item `index` in a buffer advancing by `stride` elements
#[inline]
pub(crate) fn item_ptr<T>(base: *mut T, stride: usize, index: usize) -> *mut T {
    base.wrapping_add(stride.wrapping_mul(index))
}

/// Per-item info slot; a null info pointer stays null
#[inline]
pub(crate) fn info_ptr(base: *mut i32, index: usize) -> *mut i32 {
    if base.is_null() {
        base
    } else {
        base.wrapping_add(index)
    }
}

/// Call `step` for every item until one returns a non-zero status
///
/// Returns [`Error::VendorCall`] carrying the failing index and the status
/// unchanged. Items after the failing one are never started.
pub fn run_batch<F>(op: &'static str, batch_count: usize, mut step: F) -> Result<()>
where
    F: FnMut(usize) -> Status,
{
    for index in 0..batch_count {
        let status = step(index);
        if status != STATUS_SUCCESS {
            debug!(op, index, status, "vendor call failed, halting batch");
            return Err(Error::VendorCall { op, status, index });
        }
    }
    Ok(())
}

// ============================================================================
// gesvd
// ============================================================================

/// Element strides between consecutive `gesvd` problems
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GesvdStrides {
    /// Input matrix, m·n
    pub a: usize,
    /// Singular values, min(m, n)
    pub s: usize,
    /// Left vectors, depends on `jobu`
    pub u: usize,
    /// Right vectors, depends on `jobvt`
    pub vt: usize,
}

/// One batched `gesvd` call
///
/// Leading dimensions are implied: `lda = ldu = m`, `ldvt = n`.
#[derive(Debug)]
pub struct GesvdBatch<T: SolverElement> {
    /// Left vector job
    pub jobu: SvdJob,
    /// Right vector job
    pub jobvt: SvdJob,
    /// Rows
    pub m: i32,
    /// Columns
    pub n: i32,
    /// Input matrices (overwritten)
    pub a: *mut T,
    /// Singular values
    pub s: *mut T::Real,
    /// Left singular vectors
    pub u: *mut T,
    /// Right singular vectors, transposed
    pub vt: *mut T,
    /// Workspace shared by every item
    pub work: *mut T,
    /// Workspace length in elements
    pub lwork: i32,
    /// One info slot per item
    pub info: *mut i32,
    /// Number of problems
    pub batch_count: usize,
}

impl<T: SolverElement> GesvdBatch<T> {
    /// Describe a batch without workspace; attach one with [`Self::workspace`]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobu: SvdJob,
        jobvt: SvdJob,
        m: i32,
        n: i32,
        a: *mut T,
        s: *mut T::Real,
        u: *mut T,
        vt: *mut T,
        batch_count: usize,
    ) -> Self {
        Self {
            jobu,
            jobvt,
            m,
            n,
            a,
            s,
            u,
            vt,
            work: std::ptr::null_mut(),
            lwork: 0,
            info: std::ptr::null_mut(),
            batch_count,
        }
    }

    /// Set the shared workspace
    pub fn workspace(mut self, work: *mut T, lwork: i32) -> Self {
        self.work = work;
        self.lwork = lwork;
        self
    }

    /// Set the per-item info array
    pub fn info(mut self, info: *mut i32) -> Self {
        self.info = info;
        self
    }

    /// Strides between items
    pub fn strides(&self) -> Result<GesvdStrides> {
        let m = dim("m", self.m)?;
        let n = dim("n", self.n)?;
        let k = m.min(n);
        Ok(GesvdStrides {
            a: elements("a", m, n)?,
            s: k,
            u: self.jobu.factor_stride(m, k)?,
            vt: self.jobvt.factor_stride(n, k)?,
        })
    }
}

// ============================================================================
// geqrf
// ============================================================================

/// Element strides between consecutive `geqrf` problems
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QrStrides {
    /// Matrix stride
    pub a: usize,
    /// Householder scalar stride, always min(m, n) for geqrf and k for orgqr
    pub tau: usize,
}

/// One batched `geqrf` call
#[derive(Debug)]
pub struct GeqrfBatch<T: SolverElement> {
    /// Rows
    pub m: i32,
    /// Columns
    pub n: i32,
    /// Matrices, overwritten with R and the reflectors
    pub a: *mut T,
    /// Leading dimension of each matrix
    pub lda: i32,
    /// Householder scalars
    pub tau: *mut T,
    /// Workspace shared by every item
    pub work: *mut T,
    /// Workspace length in elements
    pub lwork: i32,
    /// One info slot per item
    pub info: *mut i32,
    /// Number of problems
    pub batch_count: usize,
}

impl<T: SolverElement> GeqrfBatch<T> {
    /// Describe a batch with `lda = m` and no workspace
    pub fn new(m: i32, n: i32, a: *mut T, tau: *mut T, batch_count: usize) -> Self {
        Self {
            m,
            n,
            a,
            lda: m,
            tau,
            work: std::ptr::null_mut(),
            lwork: 0,
            info: std::ptr::null_mut(),
            batch_count,
        }
    }

    /// Override the leading dimension
    pub fn lda(mut self, lda: i32) -> Self {
        self.lda = lda;
        self
    }

    /// Set the shared workspace
    pub fn workspace(mut self, work: *mut T, lwork: i32) -> Self {
        self.work = work;
        self.lwork = lwork;
        self
    }

    /// Set the per-item info array
    pub fn info(mut self, info: *mut i32) -> Self {
        self.info = info;
        self
    }

    /// Strides between items
    pub fn strides(&self) -> Result<QrStrides> {
        let m = dim("m", self.m)?;
        let n = dim("n", self.n)?;
        Ok(QrStrides {
            a: elements("a", m, n)?,
            tau: m.min(n),
        })
    }
}

// ============================================================================
// orgqr / ungqr
// ============================================================================

/// One batched `orgqr` (`ungqr` for complex types) call
///
/// `origin_n` is the column count of the allocation each matrix lives in.
/// Items advance by `m * origin_n` elements, which lets a batch operate on the
/// leading `n` columns of wider, padded matrices.
#[derive(Debug)]
pub struct OrgqrBatch<T: SolverElement> {
    /// Rows
    pub m: i32,
    /// Columns of Q to form
    pub n: i32,
    /// Number of reflectors
    pub k: i32,
    /// Matrices holding the reflectors, overwritten with Q
    pub a: *mut T,
    /// Leading dimension of each matrix
    pub lda: i32,
    /// Householder scalars
    pub tau: *const T,
    /// Workspace shared by every item
    pub work: *mut T,
    /// Workspace length in elements
    pub lwork: i32,
    /// One info slot per item
    pub info: *mut i32,
    /// Number of problems
    pub batch_count: usize,
    /// Columns of the underlying allocation
    pub origin_n: i32,
}

impl<T: SolverElement> OrgqrBatch<T> {
    /// Describe a batch with `lda = m`, `origin_n = n` and no workspace
    pub fn new(m: i32, n: i32, k: i32, a: *mut T, tau: *const T, batch_count: usize) -> Self {
        Self {
            m,
            n,
            k,
            a,
            lda: m,
            tau,
            work: std::ptr::null_mut(),
            lwork: 0,
            info: std::ptr::null_mut(),
            batch_count,
            origin_n: n,
        }
    }

    /// Set the column count of the underlying allocation
    pub fn origin_n(mut self, origin_n: i32) -> Self {
        self.origin_n = origin_n;
        self
    }

    /// Override the leading dimension
    pub fn lda(mut self, lda: i32) -> Self {
        self.lda = lda;
        self
    }

    /// Set the shared workspace
    pub fn workspace(mut self, work: *mut T, lwork: i32) -> Self {
        self.work = work;
        self.lwork = lwork;
        self
    }

    /// Set the per-item info array
    pub fn info(mut self, info: *mut i32) -> Self {
        self.info = info;
        self
    }

    /// Strides between items
    pub fn strides(&self) -> Result<QrStrides> {
        let m = dim("m", self.m)?;
        let n = dim("n", self.n)?;
        let k = dim("k", self.k)?;
        let origin_n = dim("origin_n", self.origin_n)?;
        if origin_n < n {
            return Err(Error::invalid_argument(
                "origin_n",
                format!("must be at least n ({}), got {}", n, origin_n),
            ));
        }
        Ok(QrStrides {
            a: elements("a", m, origin_n)?,
            tau: k,
        })
    }
}
