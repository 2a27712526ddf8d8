//! cuSOLVER dispatcher
//!
//! cuSOLVER has no batched gesvd/geqrf/orgqr for general matrices, so each
//! batch is a host loop of single-matrix calls sharing one workspace.
//! Workspace and info pointers go to cuSOLVER as given; if it rejects them,
//! its status is what the caller sees.

use super::batch::{GeqrfBatch, GesvdBatch, OrgqrBatch, info_ptr, item_ptr, run_batch};
use super::ffi::{GeqrfFn, GesvdBufferSizeFn, GesvdFn, OrgqrFn, SolverHandle};
use super::{Backend, BatchedSolver, SolverOp, query_size};
use crate::dtype::SolverElement;
use crate::error::Result;
use crate::softlink::EntryPoint;
use std::ptr::null_mut;

/// Batched dispatch against cuSOLVER
#[derive(Copy, Clone, Debug, Default)]
pub struct CudaSolver;

impl BatchedSolver for CudaSolver {
    const BACKEND: Backend = Backend::Cuda;

    unsafe fn gesvd_batched<T: SolverElement>(
        entry: &EntryPoint,
        handle: SolverHandle,
        batch: &GesvdBatch<T>,
    ) -> Result<()> {
        let strides = batch.strides()?;
        // SAFETY: entries registered under SolverOp::Gesvd follow GesvdFn.
        let func: GesvdFn<T> = unsafe { entry.get()? };
        let (lda, ldu, ldvt) = (batch.m, batch.m, batch.n);

        run_batch(SolverOp::Gesvd.family(), batch.batch_count, |i| {
            // SAFETY: the caller guarantees every item's buffers are valid
            // device memory laid out as the strides describe.
            unsafe {
                func(
                    handle,
                    batch.jobu.as_raw(),
                    batch.jobvt.as_raw(),
                    batch.m,
                    batch.n,
                    item_ptr(batch.a, strides.a, i),
                    lda,
                    item_ptr(batch.s, strides.s, i),
                    item_ptr(batch.u, strides.u, i),
                    ldu,
                    item_ptr(batch.vt, strides.vt, i),
                    ldvt,
                    batch.work,
                    batch.lwork,
                    // rwork is only an optional output of the unconverged
                    // superdiagonal; not needed
                    null_mut(),
                    info_ptr(batch.info, i),
                )
            }
        })
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
            // SAFETY: see gesvd_batched
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
            // SAFETY: see gesvd_batched
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
        entry: &EntryPoint,
        handle: SolverHandle,
        m: i32,
        n: i32,
    ) -> Result<i32> {
        // SAFETY: entries registered under SolverOp::GesvdBufferSize follow
        // GesvdBufferSizeFn on cuSOLVER.
        let func: GesvdBufferSizeFn = unsafe { entry.get()? };
        query_size(SolverOp::GesvdBufferSize, |lwork| unsafe {
            func(handle, m, n, lwork)
        })
    }
}
