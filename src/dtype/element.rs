//! Element trait for mapping Rust types to DType

use super::{Complex64, Complex128, DType};
use bytemuck::Pod;

/// Trait for types a vendor dense solver operates on
///
/// Connects the Rust type used for device buffer pointers to the runtime
/// [`DType`] tag under which its entry points are registered.
///
/// # Bounds
/// - `Pod` - the type has the exact layout the vendor ABI expects
/// - `Send + Sync + 'static` - pointers to it may cross threads with the handle
pub trait SolverElement: Copy + Pod + Send + Sync + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Real counterpart used for singular values (`f32` for `Complex64`, ...)
    type Real: SolverElement;
}

macro_rules! impl_solver_element {
    ($ty:ty, $dtype:expr, $real:ty) => {
        impl SolverElement for $ty {
            const DTYPE: DType = $dtype;
            type Real = $real;
        }
    };
}

impl_solver_element!(f32, DType::F32, f32);
impl_solver_element!(f64, DType::F64, f64);
impl_solver_element!(Complex64, DType::Complex64, f32);
impl_solver_element!(Complex128, DType::Complex128, f64);
