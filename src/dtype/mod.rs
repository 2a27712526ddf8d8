//! Element types accepted by the vendor solvers
//!
//! Dense solver libraries expose one symbol per element type, distinguished by
//! a single letter (`S`, `D`, `C`, `Z`). [`DType`] is the runtime tag for those
//! four types and [`SolverElement`] ties each Rust type to its tag.

pub mod complex;
mod element;

pub use complex::{Complex64, Complex128};
pub use element::SolverElement;

use std::fmt;

// ============================================================================
// DType Enum
// ============================================================================

/// Element types supported by cuSOLVER / hipSOLVER dense routines
///
/// Used as the key of the registration-time entry point table, so every
/// operation is resolved once per type rather than branched on at call sites.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DType {
    /// 32-bit floating point
    F32 = 0,
    /// 64-bit floating point
    F64 = 1,
    /// 64-bit complex (two f32: re, im)
    Complex64 = 2,
    /// 128-bit complex (two f64: re, im)
    Complex128 = 3,
}

impl DType {
    /// Every supported type, in vendor letter order S, D, C, Z
    pub const ALL: [DType; 4] = [Self::F32, Self::F64, Self::Complex64, Self::Complex128];

    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
        }
    }

    /// Returns true for the complex types
    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// LAPACK-style type letter used in vendor symbol names
    #[inline]
    pub const fn vendor_letter(self) -> char {
        match self {
            Self::F32 => 'S',
            Self::F64 => 'D',
            Self::Complex64 => 'C',
            Self::Complex128 => 'Z',
        }
    }

    /// Type of the (always real) singular values produced for this type
    #[inline]
    pub const fn real_dtype(self) -> DType {
        match self {
            Self::F32 | Self::Complex64 => Self::F32,
            Self::F64 | Self::Complex128 => Self::F64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
        };
        f.write_str(name)
    }
}
