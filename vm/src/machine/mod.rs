//! Machine module - VM implementation
//!
//! The interpreter is split into focused submodules. Each instruction family
//! is an extension trait implemented for [`VM`].

mod arithmetic;
mod control;
mod frame;
mod globals;
mod native;
mod property;
mod stack;
mod vm;

// Public API
pub use arithmetic::{parse_numeric_prefix, ArithmeticOps};
pub use control::ControlFlowOps;
pub use frame::Frame;
pub use globals::GlobalOps;
pub use native::NativeRegistry;
pub use property::PropertyOps;
pub use stack::StackOps;
pub use vm::VM;
