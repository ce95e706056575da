use memory::{ClassRef, Function, FunctionRef, NativeId, TraitDescriptor, Value};

use super::globals::GlobalOps;
use crate::native::{NativeFn, NativeObj};

/// Trait for native function registration
pub trait NativeRegistry {
    /// Allocates a native function without binding it anywhere.
    fn alloc_native(&mut self, name: &str, func: NativeFn) -> FunctionRef;

    /// Binds a native as a global.
    fn define_native(&mut self, name: &str, func: NativeFn) -> FunctionRef;

    /// Binds a native as a method trait of `class`.
    fn define_class_native(&mut self, class: ClassRef, name: &str, func: NativeFn)
        -> FunctionRef;

    fn bootstrap_natives(&mut self);
}

impl NativeRegistry for super::vm::VM {
    fn alloc_native(&mut self, name: &str, func: NativeFn) -> FunctionRef {
        let id = NativeId(self.natives.len() as u32);
        self.natives.push(NativeObj {
            name: name.to_string(),
            func,
        });
        self.heap.alloc_function(Function::native(name, id))
    }

    fn define_native(&mut self, name: &str, func: NativeFn) -> FunctionRef {
        let f = self.alloc_native(name, func);
        self.define_global(name, Value::Function(f));
        f
    }

    fn define_class_native(
        &mut self,
        class: ClassRef,
        name: &str,
        func: NativeFn,
    ) -> FunctionRef {
        let f = self.alloc_native(name, func);
        self.heap.add_class_trait(class, TraitDescriptor::method(name, f));
        f
    }

    fn bootstrap_natives(&mut self) {
        crate::stdlib::core::bind(self);
    }
}
