//! Integration tests for the batched dispatchers
//!
//! Tests verify:
//! - Per-item buffer offsets for every family and SVD job combination
//! - First non-zero status halts the batch and is returned unchanged
//! - Backend differences (HIP SVD no-op, optional HIP workspace)
//! - Stub entry points fail before any call

mod common;

use common::{
    Call, calls, elems, fake_handle, fake_ptr, geqrf_buffer_size_entry, geqrf_entry,
    gesvd_buffer_size_entry, gesvd_entry, orgqr_entry, reset,
};
use proptest::prelude::*;
use softsolve::dtype::{Complex64, Complex128};
use softsolve::error::Error;
use softsolve::solver::{
    BatchedSolver, CudaSolver, GeqrfBatch, GesvdBatch, HipSolver, OrgqrBatch, SvdJob,
};
use softsolve::{DefaultSolver, EntryPoint};

const A: usize = 0x1000_0000;
const TAU: usize = 0x2000_0000;
const S: usize = 0x3000_0000;
const U: usize = 0x4000_0000;
const VT: usize = 0x5000_0000;
const WORK: usize = 0x6000_0000;
const INFO: usize = 0x7000_0000;

fn geqrf_batch<T: softsolve::dtype::SolverElement>(m: i32, n: i32, count: usize) -> GeqrfBatch<T> {
    GeqrfBatch::new(m, n, fake_ptr(A), fake_ptr(TAU), count)
        .workspace(fake_ptr(WORK), 256)
        .info(fake_ptr(INFO))
}

// ============================================================================
// geqrf
// ============================================================================

#[test]
fn test_geqrf_offsets_f32() {
    reset(None);
    let batch = geqrf_batch::<f32>(5, 3, 4);
    unsafe { CudaSolver::geqrf_batched(&geqrf_entry::<f32>(), fake_handle(), &batch) }.unwrap();

    let calls = calls();
    assert_eq!(calls.len(), 4);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(elems::<f32>(call.a, A), i * 15, "A offset of item {}", i);
        assert_eq!(elems::<f32>(call.aux, TAU), i * 3, "tau offset of item {}", i);
        assert_eq!(elems::<i32>(call.info, INFO), i, "info offset of item {}", i);
        // workspace is shared, never advanced
        assert_eq!(call.work, WORK);
        assert_eq!(call.lwork, 256);
        assert_eq!((call.m, call.n, call.lda), (5, 3, 5));
    }
}

#[test]
fn test_geqrf_offsets_complex128_custom_lda() {
    reset(None);
    let batch = geqrf_batch::<Complex128>(3, 7, 3).lda(4);
    unsafe {
        CudaSolver::geqrf_batched(&geqrf_entry::<Complex128>(), fake_handle(), &batch)
    }
    .unwrap();

    let calls = calls();
    assert_eq!(calls.len(), 3);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(call.a, A + i * 21 * 16);
        assert_eq!(call.aux, TAU + i * 3 * 16);
        assert_eq!(call.lda, 4);
    }
}

#[test]
fn test_geqrf_halts_on_first_failure() {
    reset(Some((2, 7)));
    let batch = geqrf_batch::<f64>(4, 4, 5);
    let err =
        unsafe { CudaSolver::geqrf_batched(&geqrf_entry::<f64>(), fake_handle(), &batch) }
            .unwrap_err();

    assert_eq!(calls().len(), 3);
    assert_eq!(err.vendor_status(), Some(7));
    assert_eq!(
        err,
        Error::VendorCall {
            op: "geqrf",
            status: 7,
            index: 2
        }
    );
}

#[test]
fn test_failure_on_first_item() {
    reset(Some((0, 1)));
    let batch = geqrf_batch::<f32>(2, 2, 10);
    let err = unsafe { HipSolver::geqrf_batched(&geqrf_entry::<f32>(), fake_handle(), &batch) }
        .unwrap_err();
    assert_eq!(calls().len(), 1);
    assert_eq!(err.vendor_status(), Some(1));
}

#[test]
fn test_empty_batch_makes_no_calls() {
    reset(None);
    let batch = GeqrfBatch::<f32>::new(4, 4, fake_ptr(A), fake_ptr(TAU), 0);
    unsafe { CudaSolver::geqrf_batched(&geqrf_entry::<f32>(), fake_handle(), &batch) }.unwrap();
    assert!(calls().is_empty());
}

#[test]
fn test_cuda_forwards_empty_items_without_workspace() {
    reset(None);
    // zero-column items need no workspace; cuSOLVER accepts lwork = 0
    let batch = GeqrfBatch::<f32>::new(4, 0, fake_ptr(A), fake_ptr(TAU), 3).info(fake_ptr(INFO));
    unsafe { CudaSolver::geqrf_batched(&geqrf_entry::<f32>(), fake_handle(), &batch) }.unwrap();

    let calls = calls();
    assert_eq!(calls.len(), 3);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!((call.work, call.lwork), (0, 0));
        assert_eq!(call.a, A);
        assert_eq!(elems::<i32>(call.info, INFO), i);
    }
}

#[test]
fn test_cuda_reports_vendor_status_for_missing_workspace() {
    // the vendor's rejection of a null workspace comes back unchanged
    reset(Some((0, 3)));
    let batch = GeqrfBatch::<f64>::new(4, 4, fake_ptr(A), fake_ptr(TAU), 2);
    let err = unsafe { CudaSolver::geqrf_batched(&geqrf_entry::<f64>(), fake_handle(), &batch) }
        .unwrap_err();
    assert_eq!(
        err,
        Error::VendorCall {
            op: "geqrf",
            status: 3,
            index: 0
        }
    );

    let calls = calls();
    assert_eq!(calls.len(), 1);
    assert_eq!((calls[0].work, calls[0].info), (0, 0));
}

#[test]
fn test_hip_forwards_missing_workspace() {
    reset(None);
    let batch = GeqrfBatch::<f32>::new(4, 2, fake_ptr(A), fake_ptr(TAU), 3);
    unsafe { HipSolver::geqrf_batched(&geqrf_entry::<f32>(), fake_handle(), &batch) }.unwrap();

    let calls = calls();
    assert_eq!(calls.len(), 3);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(call.work, 0);
        assert_eq!(call.lwork, 0);
        assert_eq!(call.info, 0, "null info must stay null for item {}", i);
        assert_eq!(elems::<f32>(call.a, A), i * 8);
    }
}

// ============================================================================
// gesvd
// ============================================================================

fn gesvd_batch<T: softsolve::dtype::SolverElement>(
    jobu: SvdJob,
    jobvt: SvdJob,
    m: i32,
    n: i32,
    count: usize,
) -> GesvdBatch<T> {
    GesvdBatch::new(
        jobu,
        jobvt,
        m,
        n,
        fake_ptr(A),
        fake_ptr(S),
        fake_ptr(U),
        fake_ptr(VT),
        count,
    )
    .workspace(fake_ptr(WORK), 64)
    .info(fake_ptr(INFO))
}

#[test]
fn test_gesvd_all_reduced_offsets() {
    reset(None);
    let batch = gesvd_batch::<Complex64>(SvdJob::All, SvdJob::Reduced, 6, 4, 3);
    unsafe { CudaSolver::gesvd_batched(&gesvd_entry::<Complex64>(), fake_handle(), &batch) }
        .unwrap();

    let calls = calls();
    assert_eq!(calls.len(), 3);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(elems::<Complex64>(call.a, A), i * 24);
        // singular values are real: f32 for Complex64
        assert_eq!(elems::<f32>(call.aux, S), i * 4);
        assert_eq!(elems::<Complex64>(call.u, U), i * 36);
        assert_eq!(elems::<Complex64>(call.vt, VT), i * 16);
        assert_eq!(elems::<i32>(call.info, INFO), i);
        assert_eq!(call.jobu, b'A' as i8);
        assert_eq!(call.jobvt, b'S' as i8);
        assert_eq!((call.lda, call.ldu, call.ldvt), (6, 6, 4));
        assert_eq!(call.rwork, 0);
        assert_eq!(call.work, WORK);
    }
}

#[test]
fn test_gesvd_overwrite_and_none_do_not_advance_vectors() {
    reset(None);
    let batch = gesvd_batch::<f64>(SvdJob::Overwrite, SvdJob::None, 5, 5, 3);
    unsafe { CudaSolver::gesvd_batched(&gesvd_entry::<f64>(), fake_handle(), &batch) }.unwrap();

    let calls = calls();
    assert_eq!(calls.len(), 3);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(elems::<f64>(call.a, A), i * 25);
        assert_eq!(elems::<f64>(call.aux, S), i * 5);
        assert_eq!(call.u, U);
        assert_eq!(call.vt, VT);
        assert_eq!(call.jobu, b'O' as i8);
        assert_eq!(call.jobvt, b'N' as i8);
    }
}

#[test]
fn test_gesvd_halts_on_failure() {
    reset(Some((1, 5)));
    let batch = gesvd_batch::<f32>(SvdJob::Reduced, SvdJob::Reduced, 4, 3, 4);
    let err = unsafe { CudaSolver::gesvd_batched(&gesvd_entry::<f32>(), fake_handle(), &batch) }
        .unwrap_err();
    assert_eq!(calls().len(), 2);
    assert!(matches!(
        err,
        Error::VendorCall {
            op: "gesvd",
            status: 5,
            index: 1
        }
    ));
}

#[test]
fn test_hip_gesvd_is_a_no_op() {
    reset(None);
    let batch = gesvd_batch::<f32>(SvdJob::All, SvdJob::All, 4, 4, 3);
    // real entry: not called
    unsafe { HipSolver::gesvd_batched(&gesvd_entry::<f32>(), fake_handle(), &batch) }.unwrap();
    // stub entry: not even inspected
    let stub = EntryPoint::Unsupported {
        symbol: "hipsolverDnSgesvd".into(),
    };
    unsafe { HipSolver::gesvd_batched(&stub, fake_handle(), &batch) }.unwrap();
    assert!(calls().is_empty());
}

// ============================================================================
// orgqr
// ============================================================================

#[test]
fn test_orgqr_advances_by_origin_n() {
    reset(None);
    let m = 8;
    let batch = OrgqrBatch::<f32>::new(m, 6, 6, fake_ptr(A), fake_ptr::<f32>(TAU), 3)
        .origin_n(10)
        .workspace(fake_ptr(WORK), 32)
        .info(fake_ptr(INFO));
    unsafe { CudaSolver::orgqr_batched(&orgqr_entry::<f32>(), fake_handle(), &batch) }.unwrap();

    let calls = calls();
    assert_eq!(calls.len(), 3);
    for (i, call) in calls.iter().enumerate() {
        // m * origin_n, not m * n
        assert_eq!(elems::<f32>(call.a, A), i * 80);
        assert_eq!(elems::<f32>(call.aux, TAU), i * 6);
        assert_eq!((call.m, call.n, call.k, call.lda), (8, 6, 6, 8));
    }
}

#[test]
fn test_orgqr_default_origin_n_is_n() {
    reset(None);
    let batch = OrgqrBatch::<Complex128>::new(4, 3, 2, fake_ptr(A), fake_ptr::<Complex128>(TAU), 2);
    unsafe { HipSolver::orgqr_batched(&orgqr_entry::<Complex128>(), fake_handle(), &batch) }
        .unwrap();

    let calls = calls();
    assert_eq!(calls[1].a - calls[0].a, 12 * 16);
    assert_eq!(calls[1].aux - calls[0].aux, 2 * 16);
}

#[test]
fn test_orgqr_rejects_origin_n_below_n() {
    reset(None);
    let batch = OrgqrBatch::<f32>::new(4, 6, 6, fake_ptr(A), fake_ptr::<f32>(TAU), 2).origin_n(5);
    let err = unsafe { HipSolver::orgqr_batched(&orgqr_entry::<f32>(), fake_handle(), &batch) }
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { arg: "origin_n", .. }));
    assert!(calls().is_empty());
}

// ============================================================================
// Stubs
// ============================================================================

#[test]
fn test_stub_entries_fail_without_calling() {
    reset(None);
    let unsupported = EntryPoint::Unsupported {
        symbol: "cusolverDnSgeqrf".into(),
    };
    let missing = EntryPoint::NotFound {
        symbol: "cusolverDnSgeqrf".into(),
        library: "libcusolver.so.11".into(),
    };
    let batch = geqrf_batch::<f32>(4, 4, 2);

    let err = unsafe { DefaultSolver::geqrf_batched(&unsupported, fake_handle(), &batch) }
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
    assert!(err.to_string().contains(softsolve::BUG_REPORT_URL));

    let err =
        unsafe { DefaultSolver::geqrf_batched(&missing, fake_handle(), &batch) }.unwrap_err();
    assert!(matches!(err, Error::SymbolNotFound { .. }));

    assert!(calls().is_empty());
}

// ============================================================================
// Workspace queries
// ============================================================================

#[test]
fn test_buffer_size_queries() {
    let size = unsafe {
        CudaSolver::geqrf_buffer_size::<f32>(
            &geqrf_buffer_size_entry::<f32>(),
            fake_handle(),
            8,
            3,
            fake_ptr(A),
            8,
        )
    }
    .unwrap();
    assert_eq!(size, 192);

    let err = unsafe {
        HipSolver::geqrf_buffer_size::<f32>(
            &geqrf_buffer_size_entry::<f32>(),
            fake_handle(),
            -1,
            3,
            fake_ptr(A),
            8,
        )
    }
    .unwrap_err();
    assert_eq!(err.vendor_status(), Some(3));

    let size = unsafe {
        CudaSolver::gesvd_buffer_size::<f64>(&gesvd_buffer_size_entry(), fake_handle(), 6, 4)
    }
    .unwrap();
    assert_eq!(size, 30);

    let size = unsafe {
        HipSolver::gesvd_buffer_size::<f64>(&gesvd_buffer_size_entry(), fake_handle(), 6, 4)
    }
    .unwrap();
    assert_eq!(size, 0);
}

// ============================================================================
// Offset property
// ============================================================================

proptest! {
    #[test]
    fn prop_item_addresses_are_base_plus_stride(m in 0i32..12, n in 0i32..12, count in 0usize..9) {
        reset(None);
        let batch = geqrf_batch::<f64>(m, n, count);
        unsafe { CudaSolver::geqrf_batched(&geqrf_entry::<f64>(), fake_handle(), &batch) }.unwrap();

        let calls: Vec<Call> = calls();
        prop_assert_eq!(calls.len(), count);
        let stride = (m * n) as usize;
        let k = m.min(n) as usize;
        for (i, call) in calls.iter().enumerate() {
            prop_assert_eq!(call.a, A + i * stride * 8);
            prop_assert_eq!(call.aux, TAU + i * k * 8);
            prop_assert_eq!(call.info, INFO + i * 4);
        }
    }

    #[test]
    fn prop_failure_at_k_makes_k_plus_one_calls(count in 1usize..12, pick in 0usize..100, status in 1i32..20) {
        let k = pick % count;
        reset(Some((k, status)));
        let batch = geqrf_batch::<f32>(3, 3, count);
        let err = unsafe { CudaSolver::geqrf_batched(&geqrf_entry::<f32>(), fake_handle(), &batch) }
            .unwrap_err();
        prop_assert_eq!(calls().len(), k + 1);
        prop_assert_eq!(err, Error::VendorCall { op: "geqrf", status, index: k });
    }
}
