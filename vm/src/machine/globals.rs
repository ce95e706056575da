use memory::Value;
use tracing::trace;

use super::frame::Frame;
use super::stack::StackOps;
use crate::error::RuntimeError;
use crate::opcode::OpCode;

/// Trait for global variable handlers
pub trait GlobalOps {
    fn handle_globals(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError>;

    /// Binds a global unless the name is taken. Returns whether it was bound.
    fn define_global(&mut self, name: &str, value: Value) -> bool;
}

impl GlobalOps for super::vm::VM {
    fn handle_globals(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError> {
        match op {
            OpCode::GetLex => {
                let name = self.pool_string(frame.read_u30()?);
                let val = self.globals.get(&name).unwrap_or_default();
                frame.push(val)?;
            }
            _ => unreachable!("{op} is not a global opcode"),
        }
        Ok(())
    }

    fn define_global(&mut self, name: &str, value: Value) -> bool {
        let added = self.globals.define(name, value);
        if !added {
            trace!(name, "global already bound");
        }
        added
    }
}
