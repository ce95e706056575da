pub mod function;
pub mod heap;
pub mod object;
pub mod resolve;
pub mod value;

pub use function::{BytecodeBody, Function, FunctionKind, NativeId};
pub use heap::{format_number, Arena, Heap};
pub use object::{Class, Namespace, Object, PropertySlot, TraitBinding, TraitDescriptor, TraitSort};
pub use value::{ClassRef, FunctionRef, NamespaceRef, ObjectRef, StringRef, Value};
