//! cusolver handle wrapper
//!
//! Provides an RAII owner for a cuSOLVER dense handle bound to a cudarc stream,
//! for callers that do not already manage one.

use super::ffi::SolverHandle;
use crate::error::{Error, Result};
use cudarc::cusolver::sys::*;
use cudarc::driver::CudaStream;
use std::ffi::c_void;
use std::ptr::null_mut;
use std::sync::Arc;

/// RAII wrapper for a cusolverDn handle
pub struct CusolverHandle {
    handle: cusolverDnHandle_t,
    stream: Arc<CudaStream>,
}

impl CusolverHandle {
    /// Create a new handle and bind it to `stream`
    pub fn new(stream: Arc<CudaStream>) -> Result<Self> {
        unsafe {
            let mut handle = null_mut();
            check_cusolver(cusolverDnCreate(&mut handle))?;

            // Associate handle with stream
            if let Err(e) = check_cusolver(cusolverDnSetStream(
                handle,
                stream.cu_stream() as cudaStream_t,
            )) {
                let _ = cusolverDnDestroy(handle);
                return Err(e);
            }

            Ok(Self { handle, stream })
        }
    }

    /// Handle in the form the dispatchers take
    #[inline]
    pub fn raw(&self) -> SolverHandle {
        // SAFETY: the handle lives as long as self
        unsafe { SolverHandle::from_raw(self.handle as *mut c_void) }
    }

    /// Get the associated CUDA stream
    #[inline]
    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }
}

impl Drop for CusolverHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = cusolverDnDestroy(self.handle);
        }
    }
}

// cusolverDnHandle_t is a raw pointer, so we need to manually implement Send/Sync
// SAFETY: cusolver work is ordered by the associated CUDA stream; callers
// serialise use of one handle across threads
unsafe impl Send for CusolverHandle {}
unsafe impl Sync for CusolverHandle {}

/// Check cusolver status and convert to Result
fn check_cusolver(status: cusolverStatus_t) -> Result<()> {
    if status == cusolverStatus_t::CUSOLVER_STATUS_SUCCESS {
        Ok(())
    } else {
        Err(Error::Cuda(format!("cusolver error: {:?}", status)))
    }
}
