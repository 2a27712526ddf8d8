//! Loader configuration
//!
//! # Environment Variables
//!
//! - `SOFTSOLVE_LIBRARY`: library name or path to open instead of the backend
//!   default. An empty value means "no library" (all entry points are stubs).
//! - `SOFTSOLVE_MANDATORY`: `1`, `true` or `yes` makes a failed open an error
//!   instead of a warning.

use crate::error::Result;
use crate::softlink::{NameMappingTable, SoftLink};
use crate::solver::{Backend, SolverLibrary};

/// Environment variable overriding the library to open
pub const ENV_LIBRARY: &str = "SOFTSOLVE_LIBRARY";

/// Environment variable making the binding mandatory
pub const ENV_MANDATORY: &str = "SOFTSOLVE_MANDATORY";

/// How to open and name the vendor solver library
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Library to open; `None` builds a loader with only stub entry points
    pub library: Option<String>,
    /// Prefix prepended to logical names
    pub prefix: String,
    /// Fail construction if the library cannot be opened
    pub mandatory: bool,
    /// Vendor naming to resolve against
    pub backend: Backend,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::for_backend(Backend::compiled())
    }
}

impl SolverConfig {
    /// Defaults for `backend`: its platform library, `cusolver` prefix,
    /// non-mandatory
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            library: backend.default_library().map(str::to_string),
            prefix: SolverLibrary::PREFIX.to_string(),
            mandatory: false,
            backend,
        }
    }

    /// Defaults overridden by `SOFTSOLVE_LIBRARY` / `SOFTSOLVE_MANDATORY`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(library) = lookup(ENV_LIBRARY) {
            let library = library.trim();
            config.library = if library.is_empty() {
                None
            } else {
                Some(library.to_string())
            };
        }
        if let Some(mandatory) = lookup(ENV_MANDATORY) {
            config.mandatory = matches!(
                mandatory.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        config
    }

    /// Open `library` instead of the default
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Open nothing; every entry point becomes a stub
    pub fn without_library(mut self) -> Self {
        self.library = None;
        self
    }

    /// Use a different symbol prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Make a failed open fatal
    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Build the loader this configuration describes
    ///
    /// HIP configurations translate names through the built-in table.
    pub fn open(&self) -> Result<SoftLink> {
        let mapping = match self.backend {
            Backend::Hip => Some(NameMappingTable::hip()),
            Backend::Cuda => None,
        };
        SoftLink::open(
            self.library.as_deref(),
            &self.prefix,
            self.mandatory,
            mapping,
        )
    }
}
