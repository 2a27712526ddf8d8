//! hipSOLVER dispatcher
//!
//! Batched SVD is not offered on ROCm: [`HipSolver::gesvd_batched`] returns
//! success without resolving or calling anything, and [`HipSolver::supports`]
//! reports `false` for it so callers can route around it.
//!
//! rocSOLVER's QR routines need neither the workspace nor the info array.
//! Whatever the caller passes (null included) is forwarded untouched, and a
//! null info pointer is not advanced.

use super::batch::{GeqrfBatch, GesvdBatch, OrgqrBatch, info_ptr, item_ptr, run_batch};
use super::ffi::{GeqrfFn, OrgqrFn, SolverHandle};
use super::{Backend, BatchedSolver, SolverOp};
use crate::dtype::SolverElement;
use crate::error::Result;
use crate::softlink::EntryPoint;
use tracing::trace;

/// Batched dispatch against hipSOLVER
#[derive(Copy, Clone, Debug, Default)]
pub struct HipSolver;

impl BatchedSolver for HipSolver {
    const BACKEND: Backend = Backend::Hip;

    fn supports(op: SolverOp) -> bool {
        !matches!(op, SolverOp::Gesvd | SolverOp::GesvdBufferSize)
    }

    unsafe fn gesvd_batched<T: SolverElement>(
        _entry: &EntryPoint,
        _handle: SolverHandle,
        batch: &GesvdBatch<T>,
    ) -> Result<()> {
        trace!(batch_count = batch.batch_count, "gesvd batch skipped on hip");
        Ok(())
    }

    unsafe fn geqrf_batched<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        batch: &GeqrfBatch<T>,
    ) -> Result<()> {
        let strides = batch.strides()?;
        // SAFETY: entries registered under SolverOp::Geqrf follow GeqrfFn.
        let func: GeqrfFn<T> = unsafe { entry.get()? };

        run_batch(SolverOp::Geqrf.family(), batch.batch_count, |i| {
            // SAFETY: the caller guarantees every item's buffers are valid
            // device memory laid out as the strides describe.
            unsafe {
                func(
                    handle,
                    batch.m,
                    batch.n,
                    item_ptr(batch.a, strides.a, i),
                    batch.lda,
                    item_ptr(batch.tau, strides.tau, i),
                    batch.work,
                    batch.lwork,
                    info_ptr(batch.info, i),
                )
            }
        })
    }

    unsafe fn orgqr_batched<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        batch: &OrgqrBatch<T>,
    ) -> Result<()> {
        let strides = batch.strides()?;
        // SAFETY: entries registered under SolverOp::Orgqr follow OrgqrFn.
        let func: OrgqrFn<T> = unsafe { entry.get()? };

        run_batch(SolverOp::Orgqr.family(), batch.batch_count, |i| {
            // SAFETY: see geqrf_batched
            unsafe {
                func(
                    handle,
                    batch.m,
                    batch.n,
                    batch.k,
                    item_ptr(batch.a, strides.a, i),
                    batch.lda,
                    batch.tau.wrapping_add(strides.tau.wrapping_mul(i)),
                    batch.work,
                    batch.lwork,
                    info_ptr(batch.info, i),
                )
            }
        })
    }

    unsafe fn gesvd_buffer_size<T: SolverElement>(
        _entry: &EntryPoint,
        _handle: SolverHandle,
        _m: i32,
        _n: i32,
    ) -> Result<i32> {
        Ok(0)
    }
}
