use std::rc::Rc;

/// Index into the VM's native function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeId(pub u32);

/// A linked method body.
#[derive(Debug, Clone, PartialEq)]
pub struct BytecodeBody {
    /// Method signature index.
    pub method: u32,
    /// Method body index.
    pub body: u32,
    pub code: Rc<[u8]>,
    pub max_stack: u32,
    pub local_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionKind {
    Native(NativeId),
    Bytecode(BytecodeBody),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
}

impl Function {
    pub fn native(name: impl Into<String>, id: NativeId) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Native(id),
        }
    }

    pub fn bytecode(name: impl Into<String>, body: BytecodeBody) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Bytecode(body),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, FunctionKind::Native(_))
    }
}
