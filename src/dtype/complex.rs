//! Complex element types
//!
//! Complex numbers are stored in interleaved format (re, im, re, im...),
//! matching `cuComplex` / `cuDoubleComplex` and `hipFloatComplex` /
//! `hipDoubleComplex`, so device buffers can be handed to either vendor
//! unchanged.

use bytemuck::{Pod, Zeroable};

/// Macro to implement a complex layout type
///
/// This avoids code duplication between Complex64 and Complex128.
macro_rules! impl_complex {
    (
        $name:ident,
        $float:ty,
        $doc_bits:literal,
        $doc_float_bits:literal,
        $doc_gpu_type:literal
    ) => {
        #[doc = concat!($doc_bits, "-bit complex number with ", $doc_float_bits, " real and imaginary parts")]
        ///
        #[doc = concat!("Memory layout: ", stringify!($name), " is ", stringify!($float), " × 2, interleaved format.")]
        #[doc = concat!("This matches the layout expected by ", $doc_gpu_type, ".")]
        #[repr(C)]
        #[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
        pub struct $name {
            /// Real part
            pub re: $float,
            /// Imaginary part
            pub im: $float,
        }

        impl $name {
            /// Create a new complex number
            #[inline]
            pub const fn new(re: $float, im: $float) -> Self {
                Self { re, im }
            }
        }
    };
}

impl_complex!(Complex64, f32, "64", "f32", "cuComplex / hipFloatComplex");
impl_complex!(
    Complex128,
    f64,
    "128",
    "f64",
    "cuDoubleComplex / hipDoubleComplex"
);
