//! Soft-linking to vendor shared libraries
//!
//! A [`SoftLink`] opens a shared library once and turns logical function names
//! into [`EntryPoint`]s. It tolerates a missing or partially populated library:
//! lookups against a library that never opened produce `Unsupported` stubs,
//! and lookups for symbols the library lacks produce `NotFound` stubs. Nothing
//! fails until a stub is actually used.
//!
//! # Cross-vendor mode
//!
//! When a [`NameMappingTable`] is attached, the prefixed name is translated
//! before the symbol search. This is how code written against cuSOLVER names
//! reaches hipSOLVER on ROCm builds.
//!
//! # Thread Safety
//!
//! A `SoftLink` is immutable after construction. Lookups only read the library
//! handle and the mapping table, so any number of threads may resolve
//! concurrently.

mod entry;
mod mapping;

pub use entry::{EntryKind, EntryPoint};
pub use mapping::{MappingEntry, NameMappingTable};

use crate::error::{Error, Result};
use libloading::{Library, Symbol};
use std::ffi::c_void;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where to report problems with stub entry points
pub const BUG_REPORT_URL: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/issues");

/// Library name recorded for loaders built without one
const NO_LIBRARY: &str = "<none>";

enum LinkState {
    Open(Arc<Library>),
    Failed(Error),
}

/// Deferred, failure-tolerant binding to a shared library
pub struct SoftLink {
    library_name: Option<String>,
    prefix: String,
    state: LinkState,
    mapping: Option<Arc<NameMappingTable>>,
}

impl SoftLink {
    /// Open `library` and resolve names under `prefix`
    ///
    /// - `library == None` (no backend in this build): the loader starts in the
    ///   failed state and every lookup returns an `Unsupported` stub.
    /// - Open failure with `mandatory`: returns [`Error::LibraryOpen`].
    /// - Open failure otherwise: logs a warning and continues in the failed
    ///   state.
    ///
    /// Builds with the `hip` feature attach the built-in cuSOLVER to hipSOLVER
    /// table; use [`SoftLink::with_mapping`] to choose a table explicitly.
    pub fn new(library: Option<&str>, prefix: &str, mandatory: bool) -> Result<Self> {
        let mapping = if cfg!(feature = "hip") {
            Some(NameMappingTable::hip())
        } else {
            None
        };
        Self::open(library, prefix, mandatory, mapping)
    }

    /// Like [`SoftLink::new`], translating names through `mapping`
    pub fn with_mapping(
        library: Option<&str>,
        prefix: &str,
        mandatory: bool,
        mapping: Arc<NameMappingTable>,
    ) -> Result<Self> {
        Self::open(library, prefix, mandatory, Some(mapping))
    }

    pub(crate) fn open(
        library: Option<&str>,
        prefix: &str,
        mandatory: bool,
        mapping: Option<Arc<NameMappingTable>>,
    ) -> Result<Self> {
        let state = match library {
            None => LinkState::Failed(Error::LibraryUnavailable {
                library: NO_LIBRARY.to_string(),
                reason: "library unavailable in this build".to_string(),
            }),
            // SAFETY: loading a library runs its initialisers; vendor solver
            // libraries have no initialisers with preconditions on the caller.
            Some(name) => match unsafe { Library::new(name) } {
                Ok(lib) => {
                    info!(library = name, prefix, "opened shared library");
                    LinkState::Open(Arc::new(lib))
                }
                Err(e) if mandatory => {
                    return Err(Error::LibraryOpen {
                        library: name.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(library = name, error = %e, "failed to open shared library, entry points will be stubs");
                    LinkState::Failed(Error::LibraryUnavailable {
                        library: name.to_string(),
                        reason: e.to_string(),
                    })
                }
            },
        };

        Ok(Self {
            library_name: library.map(str::to_string),
            prefix: prefix.to_string(),
            state,
            mapping,
        })
    }

    /// Returns true if the library is open
    #[inline]
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LinkState::Open(_))
    }

    /// Error recorded when the library could not be opened
    pub fn load_error(&self) -> Option<&Error> {
        match &self.state {
            LinkState::Open(_) => None,
            LinkState::Failed(e) => Some(e),
        }
    }

    /// Library name or path this loader was built for
    pub fn library_name(&self) -> Option<&str> {
        self.library_name.as_deref()
    }

    /// Prefix prepended to every logical name
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if names are translated through a mapping table
    #[inline]
    pub fn is_cross_vendor(&self) -> bool {
        self.mapping.is_some()
    }

    /// Symbol name a lookup of `logical` searches for
    ///
    /// `prefix + logical`, replaced by its first mapped equivalent in
    /// cross-vendor mode. Names absent from the table pass through.
    pub fn search_name(&self, logical: &str) -> String {
        let qualified = format!("{}{}", self.prefix, logical);
        match self
            .mapping
            .as_deref()
            .and_then(|table| table.lookup(&qualified))
        {
            Some(translated) => translated.to_string(),
            None => qualified,
        }
    }

    /// Resolve `logical` to an entry point
    ///
    /// Always returns something usable: a `Valid` entry for a found symbol,
    /// otherwise a stub whose diagnostic surfaces on first use.
    pub fn resolve(&self, logical: &str) -> EntryPoint {
        let lib = match &self.state {
            LinkState::Open(lib) => lib,
            LinkState::Failed(_) => {
                return EntryPoint::Unsupported {
                    symbol: format!("{}{}", self.prefix, logical),
                };
            }
        };

        let symbol = self.search_name(logical);
        // SAFETY: the symbol is only read as an address here. Its signature is
        // asserted later by whoever calls EntryPoint::get.
        let found: std::result::Result<Symbol<'_, unsafe extern "C" fn()>, _> =
            unsafe { lib.get(symbol.as_bytes()) };
        match found {
            Ok(sym) => {
                let raw = *sym as *mut c_void;
                match std::ptr::NonNull::new(raw) {
                    Some(address) => {
                        debug!(symbol = %symbol, "resolved symbol");
                        EntryPoint::Valid {
                            symbol,
                            address,
                            library: Some(lib.clone()),
                        }
                    }
                    None => self.not_found(symbol),
                }
            }
            Err(_) => self.not_found(symbol),
        }
    }

    fn not_found(&self, symbol: String) -> EntryPoint {
        debug!(symbol = %symbol, "symbol not found, using stub");
        EntryPoint::NotFound {
            symbol,
            library: self
                .library_name
                .clone()
                .unwrap_or_else(|| NO_LIBRARY.to_string()),
        }
    }
}

impl std::fmt::Debug for SoftLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftLink")
            .field("library", &self.library_name)
            .field("prefix", &self.prefix)
            .field("loaded", &self.is_loaded())
            .field("cross_vendor", &self.is_cross_vendor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_library_is_failed() {
        let link = SoftLink::new(None, "cusolver", true).unwrap();
        assert!(!link.is_loaded());
        assert!(matches!(
            link.load_error(),
            Some(Error::LibraryUnavailable { .. })
        ));

        let entry = link.resolve("DnSgesvd");
        assert_eq!(entry.kind(), EntryKind::Unsupported);
        assert_eq!(entry.symbol(), "cusolverDnSgesvd");
    }

    #[test]
    fn test_unopenable_library_non_mandatory_degrades() {
        let link = SoftLink::new(Some("libdefinitely_not_here_softsolve.so"), "x_", false).unwrap();
        assert!(!link.is_loaded());
        assert_eq!(link.resolve("anything").kind(), EntryKind::Unsupported);
    }

    #[test]
    fn test_unopenable_library_mandatory_fails() {
        let err = SoftLink::new(Some("libdefinitely_not_here_softsolve.so"), "x_", true).unwrap_err();
        assert!(matches!(err, Error::LibraryOpen { .. }));
    }

    #[test]
    fn test_bug_report_url_follows_manifest() {
        assert!(!env!("CARGO_PKG_REPOSITORY").is_empty());
        assert_eq!(
            BUG_REPORT_URL,
            format!("{}/issues", env!("CARGO_PKG_REPOSITORY"))
        );
    }

    #[test]
    fn test_search_name_translation() {
        let table = Arc::new(NameMappingTable::from_pairs([(
            "cupy_A",
            &["B1", "B2"][..],
        )]));
        let link = SoftLink::with_mapping(None, "cupy_", false, table).unwrap();
        assert!(link.is_cross_vendor());
        assert_eq!(link.search_name("A"), "B1");
        assert_eq!(link.search_name("C"), "cupy_C");
    }
}
