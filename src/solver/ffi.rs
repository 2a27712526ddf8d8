//! Vendor ABI for the dense solver routines
//!
//! cuSOLVER and hipSOLVER declare these routines with identical parameter
//! layouts, so one set of function pointer types serves both backends.

use crate::dtype::SolverElement;
use std::ffi::{c_int, c_schar, c_void};

/// Vendor status code; zero is success, anything else is passed through
pub type Status = c_int;

/// Success status shared by cuSOLVER and hipSOLVER
pub const STATUS_SUCCESS: Status = 0;

/// Opaque `cusolverDnHandle_t` / `hipsolverDnHandle_t`
///
/// The handle must already be bound to the stream the caller wants the work
/// queued on; dispatchers never touch stream affinity.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SolverHandle(*mut c_void);

impl SolverHandle {
    /// Wrap a raw vendor handle
    ///
    /// # Safety
    ///
    /// `raw` must be a live handle created by the same vendor library the
    /// entry points are resolved from.
    #[inline]
    pub unsafe fn from_raw(raw: *mut c_void) -> Self {
        Self(raw)
    }

    /// Handle as passed to vendor calls
    #[inline]
    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

/// Real part type of `T`
type Real<T> = <T as SolverElement>::Real;

/// `<t>gesvd(handle, jobu, jobvt, m, n, A, lda, S, U, ldu, VT, ldvt, work, lwork, rwork, info)`
pub type GesvdFn<T> = unsafe extern "C" fn(
    SolverHandle,
    c_schar,
    c_schar,
    c_int,
    c_int,
    *mut T,
    c_int,
    *mut Real<T>,
    *mut T,
    c_int,
    *mut T,
    c_int,
    *mut T,
    c_int,
    *mut Real<T>,
    *mut c_int,
) -> Status;

/// cuSOLVER `<t>gesvd_bufferSize(handle, m, n, lwork)`
pub type GesvdBufferSizeFn = unsafe extern "C" fn(SolverHandle, c_int, c_int, *mut c_int) -> Status;

/// `<t>geqrf(handle, m, n, A, lda, tau, work, lwork, info)`
pub type GeqrfFn<T> = unsafe extern "C" fn(
    SolverHandle,
    c_int,
    c_int,
    *mut T,
    c_int,
    *mut T,
    *mut T,
    c_int,
    *mut c_int,
) -> Status;

/// `<t>geqrf_bufferSize(handle, m, n, A, lda, lwork)`
pub type GeqrfBufferSizeFn<T> =
    unsafe extern "C" fn(SolverHandle, c_int, c_int, *mut T, c_int, *mut c_int) -> Status;

/// `<t>orgqr` / `<t>ungqr(handle, m, n, k, A, lda, tau, work, lwork, info)`
pub type OrgqrFn<T> = unsafe extern "C" fn(
    SolverHandle,
    c_int,
    c_int,
    c_int,
    *mut T,
    c_int,
    *const T,
    *mut T,
    c_int,
    *mut c_int,
) -> Status;

/// `<t>orgqr_bufferSize` / `<t>ungqr_bufferSize(handle, m, n, k, A, lda, tau, lwork)`
pub type OrgqrBufferSizeFn<T> = unsafe extern "C" fn(
    SolverHandle,
    c_int,
    c_int,
    c_int,
    *const T,
    c_int,
    *const T,
    *mut c_int,
) -> Status;
