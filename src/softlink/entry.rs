//! Resolved entry points
//!
//! An [`EntryPoint`] is what a lookup always produces: either the address of a
//! real vendor symbol, or one of two stubs recording why no address exists.
//! Stubs never hand out a pointer, so code that uses them fails synchronously
//! with a diagnostic instead of calling through null.

use crate::error::{Error, Result};
use libloading::Library;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

/// Which of the three states an [`EntryPoint`] is in
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Address of a real symbol
    Valid,
    /// The backing library never opened
    Unsupported,
    /// The library opened but does not export the symbol
    NotFound,
}

/// A callable entry point or a stub standing in for one
#[derive(Clone, Debug)]
pub enum EntryPoint {
    /// Address of a real symbol
    Valid {
        /// Symbol name the address was found under
        symbol: String,
        /// Symbol address
        address: NonNull<c_void>,
        /// Keeps the defining library mapped while this entry point lives
        library: Option<Arc<Library>>,
    },
    /// Placeholder used when the library is unavailable
    Unsupported {
        /// Symbol that was requested
        symbol: String,
    },
    /// Placeholder used when the symbol is missing from the library
    NotFound {
        /// Symbol that was searched for
        symbol: String,
        /// Library that was searched
        library: String,
    },
}

// NonNull<c_void> is a raw pointer, so Send/Sync must be implemented manually.
// SAFETY: the address points at immutable code in a mapped library; sharing
// it between threads is no different from sharing a function pointer.
unsafe impl Send for EntryPoint {}
unsafe impl Sync for EntryPoint {}

impl EntryPoint {
    /// Wrap an address obtained outside a [`SoftLink`](super::SoftLink)
    ///
    /// A null address yields a `NotFound` stub.
    ///
    /// # Safety
    ///
    /// A non-null `address` must stay valid for as long as the returned entry
    /// point (or any pointer taken from it) is used.
    pub unsafe fn from_raw(symbol: impl Into<String>, address: *const c_void) -> Self {
        let symbol = symbol.into();
        match NonNull::new(address as *mut c_void) {
            Some(address) => Self::Valid {
                symbol,
                address,
                library: None,
            },
            None => Self::NotFound {
                symbol,
                library: "<raw address>".to_string(),
            },
        }
    }

    /// Current state
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Valid { .. } => EntryKind::Valid,
            Self::Unsupported { .. } => EntryKind::Unsupported,
            Self::NotFound { .. } => EntryKind::NotFound,
        }
    }

    /// Returns true if this entry point wraps a real symbol
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Symbol name this entry point was resolved for
    pub fn symbol(&self) -> &str {
        match self {
            Self::Valid { symbol, .. }
            | Self::Unsupported { symbol }
            | Self::NotFound { symbol, .. } => symbol,
        }
    }

    /// Diagnostic raised when a stub is used, `None` for a valid entry
    pub fn stub_error(&self) -> Option<Error> {
        self.address().err()
    }

    /// Symbol address, or the stub's diagnostic
    pub fn address(&self) -> Result<NonNull<c_void>> {
        match self {
            Self::Valid { address, .. } => Ok(*address),
            Self::Unsupported { symbol } => Err(Error::Unsupported {
                symbol: symbol.clone(),
            }),
            Self::NotFound { symbol, library } => Err(Error::SymbolNotFound {
                symbol: symbol.clone(),
                library: library.clone(),
            }),
        }
    }

    /// Reinterpret the address as a typed function pointer
    ///
    /// This is the single place where an entry point becomes callable. Stubs
    /// return their diagnostic here, before any vendor code can run.
    ///
    /// # Safety
    ///
    /// `F` must be an `unsafe extern "C" fn` type whose signature matches the
    /// vendor's declaration of this symbol.
    pub unsafe fn get<F: Copy>(&self) -> Result<F> {
        if std::mem::size_of::<F>() != std::mem::size_of::<*const c_void>() {
            return Err(Error::invalid_argument(
                "F",
                format!(
                    "function pointer type for '{}' is {} bytes, expected {}",
                    self.symbol(),
                    std::mem::size_of::<F>(),
                    std::mem::size_of::<*const c_void>()
                ),
            ));
        }
        let address = self.address()?;
        // SAFETY: sizes checked above; the caller guarantees F matches the ABI.
        Ok(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&address.as_ptr()) })
    }
}
