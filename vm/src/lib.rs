//! Linker and interpreter for decoded ABC programs.

pub mod config;
pub mod disasm;
pub mod error;
pub mod globals;
pub mod loader;
pub mod machine;
pub mod native;
pub mod opcode;
pub mod stdlib;

pub use config::VmConfig;
pub use error::{LinkError, RuntimeError};
pub use globals::Globals;
pub use machine::{
    ArithmeticOps, ControlFlowOps, Frame, GlobalOps, NativeRegistry, PropertyOps, StackOps, VM,
};
pub use native::{NativeFn, NativeObj};
pub use opcode::OpCode;
