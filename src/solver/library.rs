//! Registration-time entry point table
//!
//! [`SolverLibrary`] resolves every [`SolverOp`] for every [`DType`] when it
//! is built, so call sites select an entry by type tag instead of branching.
//! Missing routines become stubs in the table and only fail when dispatched.

use super::batch::{GeqrfBatch, GesvdBatch, OrgqrBatch};
use super::ffi::SolverHandle;
use super::{Backend, BatchedSolver, SolverOp};
use crate::config::SolverConfig;
use crate::dtype::{DType, SolverElement};
use crate::error::{Error, Result};
use crate::softlink::{EntryKind, EntryPoint, SoftLink};
use std::sync::OnceLock;
use tracing::debug;

type EntryTable = [[EntryPoint; DType::ALL.len()]; SolverOp::ALL.len()];

/// Process-wide library, built from the environment at first use
static GLOBAL: OnceLock<Result<SolverLibrary>> = OnceLock::new();

/// A soft-linked solver library with every entry point resolved
///
/// A library is bound to the backend it was configured for. Dispatching it
/// through the other backend's [`BatchedSolver`] is rejected.
pub struct SolverLibrary {
    link: SoftLink,
    backend: Backend,
    entries: EntryTable,
}

impl SolverLibrary {
    /// Symbol prefix of the logical names (cuSOLVER naming)
    pub const PREFIX: &'static str = "cusolver";

    /// Open the library described by `config` and resolve all entry points
    ///
    /// Fails only when `config.mandatory` is set and the library cannot be
    /// opened.
    pub fn load(config: &SolverConfig) -> Result<Self> {
        Ok(Self::from_softlink(config.open()?, config.backend))
    }

    /// Resolve all entry points through an existing loader for `backend`
    pub fn from_softlink(link: SoftLink, backend: Backend) -> Self {
        let entries: EntryTable = std::array::from_fn(|op| {
            std::array::from_fn(|dtype| {
                link.resolve(&SolverOp::ALL[op].logical_name(DType::ALL[dtype]))
            })
        });

        let resolved = entries.iter().flatten().filter(|e| e.is_valid()).count();
        debug!(
            library = link.library_name().unwrap_or("<none>"),
            %backend,
            resolved,
            total = SolverOp::ALL.len() * DType::ALL.len(),
            "solver entry points resolved"
        );

        Self {
            link,
            backend,
            entries,
        }
    }

    /// Shared instance configured by [`SolverConfig::from_env`]
    ///
    /// Created on first call and kept for the life of the process. A failed
    /// mandatory open is remembered and returned on every call.
    pub fn global() -> Result<&'static Self> {
        match GLOBAL.get_or_init(|| Self::load(&SolverConfig::from_env())) {
            Ok(lib) => Ok(lib),
            Err(e) => Err(e.clone()),
        }
    }

    /// Underlying loader
    pub fn softlink(&self) -> &SoftLink {
        &self.link
    }

    /// Backend this library was configured for
    #[inline]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    fn check_backend<S: BatchedSolver>(&self) -> Result<()> {
        if S::BACKEND != self.backend {
            return Err(Error::invalid_argument(
                "S",
                format!(
                    "{} dispatcher used on a library configured for {}",
                    S::BACKEND,
                    self.backend
                ),
            ));
        }
        Ok(())
    }

    /// Entry point registered for `op` and `dtype`
    #[inline]
    pub fn entry(&self, op: SolverOp, dtype: DType) -> &EntryPoint {
        &self.entries[op as usize][dtype as usize]
    }

    /// Every `(op, dtype)` pair whose entry point is a stub
    pub fn unavailable(&self) -> Vec<(SolverOp, DType, EntryKind)> {
        let mut missing = Vec::new();
        for op in SolverOp::ALL {
            for dtype in DType::ALL {
                let entry = self.entry(op, dtype);
                if !entry.is_valid() {
                    missing.push((op, dtype, entry.kind()));
                }
            }
        }
        missing
    }

    /// Batched SVD through backend `S`
    ///
    /// # Safety
    ///
    /// See [`BatchedSolver::gesvd_batched`].
    pub unsafe fn gesvd_batched<S: BatchedSolver, T: SolverElement>(
        &self,
        handle: SolverHandle,
        batch: &GesvdBatch<T>,
    ) -> Result<()> {
        self.check_backend::<S>()?;
        unsafe { S::gesvd_batched(self.entry(SolverOp::Gesvd, T::DTYPE), handle, batch) }
    }

    /// Batched QR factorization through backend `S`
    ///
    /// # Safety
    ///
    /// See [`BatchedSolver::geqrf_batched`].
    pub unsafe fn geqrf_batched<S: BatchedSolver, T: SolverElement>(
        &self,
        handle: SolverHandle,
        batch: &GeqrfBatch<T>,
    ) -> Result<()> {
        self.check_backend::<S>()?;
        unsafe { S::geqrf_batched(self.entry(SolverOp::Geqrf, T::DTYPE), handle, batch) }
    }

    /// Batched Q reconstruction through backend `S`
    ///
    /// # Safety
    ///
    /// See [`BatchedSolver::orgqr_batched`].
    pub unsafe fn orgqr_batched<S: BatchedSolver, T: SolverElement>(
        &self,
        handle: SolverHandle,
        batch: &OrgqrBatch<T>,
    ) -> Result<()> {
        self.check_backend::<S>()?;
        unsafe { S::orgqr_batched(self.entry(SolverOp::Orgqr, T::DTYPE), handle, batch) }
    }

    /// Workspace size for one `gesvd` item
    ///
    /// # Safety
    ///
    /// See [`BatchedSolver::gesvd_buffer_size`].
    pub unsafe fn gesvd_buffer_size<S: BatchedSolver, T: SolverElement>(
        &self,
        handle: SolverHandle,
        m: i32,
        n: i32,
    ) -> Result<i32> {
        self.check_backend::<S>()?;
        let entry = self.entry(SolverOp::GesvdBufferSize, T::DTYPE);
        unsafe { S::gesvd_buffer_size::<T>(entry, handle, m, n) }
    }

    /// Workspace size for one `geqrf` item
    ///
    /// # Safety
    ///
    /// See [`BatchedSolver::geqrf_buffer_size`].
    pub unsafe fn geqrf_buffer_size<S: BatchedSolver, T: SolverElement>(
        &self,
        handle: SolverHandle,
        m: i32,
        n: i32,
        a: *mut T,
        lda: i32,
    ) -> Result<i32> {
        self.check_backend::<S>()?;
        let entry = self.entry(SolverOp::GeqrfBufferSize, T::DTYPE);
        unsafe { S::geqrf_buffer_size(entry, handle, m, n, a, lda) }
    }

    /// Workspace size for one `orgqr` item
    ///
    /// # Safety
    ///
    /// See [`BatchedSolver::orgqr_buffer_size`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn orgqr_buffer_size<S: BatchedSolver, T: SolverElement>(
        &self,
        handle: SolverHandle,
        m: i32,
        n: i32,
        k: i32,
        a: *const T,
        lda: i32,
        tau: *const T,
    ) -> Result<i32> {
        self.check_backend::<S>()?;
        let entry = self.entry(SolverOp::OrgqrBufferSize, T::DTYPE);
        unsafe { S::orgqr_buffer_size(entry, handle, m, n, k, a, lda, tau) }
    }
}

impl std::fmt::Debug for SolverLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverLibrary")
            .field("link", &self.link)
            .field("backend", &self.backend)
            .field("unavailable", &self.unavailable().len())
            .finish()
    }
}
