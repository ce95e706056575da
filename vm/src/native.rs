use crate::error::RuntimeError;
use crate::machine::VM;
use memory::{ObjectRef, Value};

// The unified signature for every host function.
// this: the receiver object, absent for global and static calls.
// Return: one value; errors abort the whole run.
pub type NativeFn =
    fn(vm: &mut VM, this: Option<ObjectRef>, args: &[Value]) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub struct NativeObj {
    pub name: String,
    pub func: NativeFn,
}

impl std::fmt::Debug for NativeObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeObj").field("name", &self.name).finish()
    }
}
