//! Host-provided globals bound into every new VM.

pub mod core;
pub mod math;
