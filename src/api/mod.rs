//! Outer surfaces: HTML rendering and the C ABI for host display layers.

pub mod ffi;
pub mod html;
