//! Common test utilities
//!
//! Fake vendor routines with the exact cuSOLVER signatures. Each call is
//! recorded on the calling thread, and a call can be told to return a chosen
//! non-zero status, so dispatch loops can be checked without a GPU.
#![allow(dead_code)]

use softsolve::EntryPoint;
use softsolve::dtype::SolverElement;
use softsolve::solver::{
    GeqrfBufferSizeFn, GeqrfFn, GesvdBufferSizeFn, GesvdFn, OrgqrFn, SolverHandle, Status,
};
use std::cell::{Cell, RefCell};
use std::ffi::{c_int, c_schar, c_void};

/// Arguments seen by one fake vendor call (pointers as addresses)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Call {
    pub jobu: c_schar,
    pub jobvt: c_schar,
    pub m: c_int,
    pub n: c_int,
    pub k: c_int,
    pub a: usize,
    pub lda: c_int,
    /// `tau` for QR routines, `S` for gesvd
    pub aux: usize,
    pub u: usize,
    pub ldu: c_int,
    pub vt: usize,
    pub ldvt: c_int,
    pub work: usize,
    pub lwork: c_int,
    pub rwork: usize,
    pub info: usize,
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
    static FAIL_AT: Cell<Option<(usize, Status)>> = const { Cell::new(None) };
}

/// Clear recorded calls; optionally make call number `index` return `status`
pub fn reset(fail_at: Option<(usize, Status)>) {
    CALLS.with(|c| c.borrow_mut().clear());
    FAIL_AT.with(|f| f.set(fail_at));
}

/// Calls recorded on this thread since the last reset
pub fn calls() -> Vec<Call> {
    CALLS.with(|c| c.borrow().clone())
}

fn record(call: Call) -> Status {
    let index = CALLS.with(|c| {
        let mut calls = c.borrow_mut();
        calls.push(call);
        calls.len() - 1
    });
    match FAIL_AT.with(|f| f.get()) {
        Some((at, status)) if at == index => status,
        _ => 0,
    }
}

/// Install a test subscriber so tracing output shows up with --nocapture
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Fake base address; never dereferenced
pub fn fake_ptr<T>(addr: usize) -> *mut T {
    addr as *mut T
}

/// Byte offset from `base` expressed in elements of `T`
pub fn elems<T>(addr: usize, base: usize) -> usize {
    (addr - base) / std::mem::size_of::<T>()
}

// ============================================================================
// Fake routines
// ============================================================================

#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn fake_gesvd<T: SolverElement>(
    _handle: SolverHandle,
    jobu: c_schar,
    jobvt: c_schar,
    m: c_int,
    n: c_int,
    a: *mut T,
    lda: c_int,
    s: *mut T::Real,
    u: *mut T,
    ldu: c_int,
    vt: *mut T,
    ldvt: c_int,
    work: *mut T,
    lwork: c_int,
    rwork: *mut T::Real,
    info: *mut c_int,
) -> Status {
    record(Call {
        jobu,
        jobvt,
        m,
        n,
        a: a as usize,
        lda,
        aux: s as usize,
        u: u as usize,
        ldu,
        vt: vt as usize,
        ldvt,
        work: work as usize,
        lwork,
        rwork: rwork as usize,
        info: info as usize,
        ..Call::default()
    })
}

#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn fake_geqrf<T: SolverElement>(
    _handle: SolverHandle,
    m: c_int,
    n: c_int,
    a: *mut T,
    lda: c_int,
    tau: *mut T,
    work: *mut T,
    lwork: c_int,
    info: *mut c_int,
) -> Status {
    record(Call {
        m,
        n,
        a: a as usize,
        lda,
        aux: tau as usize,
        work: work as usize,
        lwork,
        info: info as usize,
        ..Call::default()
    })
}

#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn fake_orgqr<T: SolverElement>(
    _handle: SolverHandle,
    m: c_int,
    n: c_int,
    k: c_int,
    a: *mut T,
    lda: c_int,
    tau: *const T,
    work: *mut T,
    lwork: c_int,
    info: *mut c_int,
) -> Status {
    record(Call {
        m,
        n,
        k,
        a: a as usize,
        lda,
        aux: tau as usize,
        work: work as usize,
        lwork,
        info: info as usize,
        ..Call::default()
    })
}

pub unsafe extern "C" fn fake_gesvd_buffer_size(
    _handle: SolverHandle,
    m: c_int,
    n: c_int,
    lwork: *mut c_int,
) -> Status {
    unsafe { *lwork = 5 * m.max(n) };
    0
}

pub unsafe extern "C" fn fake_geqrf_buffer_size<T: SolverElement>(
    _handle: SolverHandle,
    m: c_int,
    n: c_int,
    _a: *mut T,
    _lda: c_int,
    lwork: *mut c_int,
) -> Status {
    if m < 0 {
        return 3;
    }
    unsafe { *lwork = n * 64 };
    0
}

// ============================================================================
// Entry points wrapping the fakes
// ============================================================================

pub fn gesvd_entry<T: SolverElement>() -> EntryPoint {
    let f: GesvdFn<T> = fake_gesvd::<T>;
    unsafe { EntryPoint::from_raw("fake_gesvd", f as *const c_void) }
}

pub fn geqrf_entry<T: SolverElement>() -> EntryPoint {
    let f: GeqrfFn<T> = fake_geqrf::<T>;
    unsafe { EntryPoint::from_raw("fake_geqrf", f as *const c_void) }
}

pub fn orgqr_entry<T: SolverElement>() -> EntryPoint {
    let f: OrgqrFn<T> = fake_orgqr::<T>;
    unsafe { EntryPoint::from_raw("fake_orgqr", f as *const c_void) }
}

pub fn gesvd_buffer_size_entry() -> EntryPoint {
    let f: GesvdBufferSizeFn = fake_gesvd_buffer_size;
    unsafe { EntryPoint::from_raw("fake_gesvd_bufferSize", f as *const c_void) }
}

pub fn geqrf_buffer_size_entry<T: SolverElement>() -> EntryPoint {
    let f: GeqrfBufferSizeFn<T> = fake_geqrf_buffer_size::<T>;
    unsafe { EntryPoint::from_raw("fake_geqrf_bufferSize", f as *const c_void) }
}

/// A handle the fakes ignore
pub fn fake_handle() -> SolverHandle {
    unsafe { SolverHandle::from_raw(fake_ptr(0xdead_0000)) }
}
