//! Error types for softsolve

use crate::softlink::BUG_REPORT_URL;
use thiserror::Error;

/// Result type alias using softsolve's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding to or calling a vendor solver
///
/// Errors are `Clone` so a process-wide registry can hand out the error it
/// recorded while being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The shared library could not be opened (non-mandatory binding)
    #[error("Library '{library}' is unavailable: {reason}")]
    LibraryUnavailable {
        /// Library name or path, or `<none>` for a stub build
        library: String,
        /// Loader message
        reason: String,
    },

    /// The shared library could not be opened for a mandatory binding
    #[error("Failed to open mandatory library '{library}': {reason}")]
    LibraryOpen {
        /// Library name or path
        library: String,
        /// Loader message
        reason: String,
    },

    /// Entry point used after its symbol was missing from an opened library
    #[error(
        "'{symbol}' was not found in {library}. \
         If you believe this is a bug, please report it at {url}",
        url = BUG_REPORT_URL
    )]
    SymbolNotFound {
        /// Symbol that was searched for
        symbol: String,
        /// Library that was searched
        library: String,
    },

    /// Entry point used while the backing library never opened
    #[error(
        "'{symbol}' is not supported in the current CUDA/ROCm toolkit version. \
         If you believe this is a bug, please report it at {url}",
        url = BUG_REPORT_URL
    )]
    Unsupported {
        /// Symbol that was requested
        symbol: String,
    },

    /// A vendor call inside a batch returned a non-zero status
    #[error("{op} failed at batch item {index} with status {status}")]
    VendorCall {
        /// Operation family
        op: &'static str,
        /// Vendor status code, unchanged
        status: i32,
        /// Zero-based batch item that failed
        index: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Name mapping table could not be parsed
    #[error("Invalid name mapping table: {0}")]
    MappingTable(String),

    /// CUDA driver or cusolver error
    #[cfg(feature = "cuda")]
    #[error("CUDA error: {0}")]
    Cuda(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Vendor status code carried by a [`Error::VendorCall`]
    ///
    /// Returns `None` for every other variant.
    pub fn vendor_status(&self) -> Option<i32> {
        match self {
            Self::VendorCall { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error comes from a stub entry point
    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::SymbolNotFound { .. })
    }
}
