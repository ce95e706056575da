//! The supported instruction subset.
//!
//! Instructions are one opcode byte followed by zero or more operands. Index
//! and count operands are u30 varints, `pushbyte` carries one sign-extended
//! byte and branches carry a signed 24-bit offset relative to the end of the
//! instruction.

use std::fmt;

/// Encoding of a single operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// One byte, sign-extended.
    Byte,
    /// Variable-length index or count.
    U30,
    /// Little-endian signed 24-bit branch offset.
    S24,
}

/// Virtual machine instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ===== Control =====
    /// No operation
    Nop = 0x02,
    /// Branch target marker, no operation
    Label = 0x09,
    /// Unconditional relative branch
    Jump = 0x10,
    /// Pop; branch if truthy
    IfTrue = 0x11,
    /// Pop; branch if falsy
    IfFalse = 0x12,

    // ===== Literals =====
    /// Push null
    PushNull = 0x20,
    /// Push undefined
    PushUndefined = 0x21,
    /// Push a sign-extended byte as int
    PushByte = 0x24,
    /// Push a u30 truncated to a signed 16-bit int
    PushShort = 0x25,
    /// Push true
    PushTrue = 0x26,
    /// Push false
    PushFalse = 0x27,
    /// Push NaN
    PushNaN = 0x28,
    /// Push string-pool entry
    PushString = 0x2C,
    /// Push int-pool entry
    PushInt = 0x2D,
    /// Push uint-pool entry
    PushUint = 0x2E,
    /// Push double-pool entry
    PushDouble = 0x2F,

    // ===== Stack =====
    /// Discard top of stack
    Pop = 0x29,
    /// Exchange the top two values
    Swap = 0x2B,

    // ===== Arithmetic =====
    /// a + b, numeric
    Add = 0x2A,
    /// a - b
    Subtract = 0xA1,
    /// a * b
    Multiply = 0xA2,
    /// a / b
    Divide = 0xA3,
    /// a % b
    Modulo = 0xA4,
    /// -a
    Negate = 0x90,
    /// a + 1
    Increment = 0x91,
    /// a - 1
    Decrement = 0x93,

    // ===== Comparison =====
    /// Logical not of truthiness
    Not = 0x96,
    /// a == b
    Equals = 0xAB,
    /// a < b
    LessThan = 0xAD,
    /// a <= b
    LessEquals = 0xAE,
    /// a > b
    GreaterThan = 0xAF,
    /// a >= b
    GreaterEquals = 0xB0,

    // ===== Objects & Classes =====
    /// Push function for a method-body index
    NewFunction = 0x40,
    /// Enumerate: pop index, pop object; push more?, key, next index
    HasNext = 0x41,
    /// Construct: pop argc args and a class or function
    Construct = 0x42,
    /// Push a class by name
    NewClass = 0x43,
    /// Set a property and push the value
    InitProperty = 0x46,
    /// Same as `HasNext`
    HasNext2 = 0x47,
    /// Pop argc args and the receiver; run the superclass constructor on it
    ConstructSuper = 0x49,
    /// Call a named property of the receiver, push the result
    CallProp = 0x4E,
    /// Call a named property of the receiver, discard the result
    CallPropVoid = 0x4F,
    /// Pop a class and push a new instance
    ConstructProp = 0x53,
    /// Build an object from argc name/value pairs
    NewObject = 0x55,
    /// Global lookup by name
    GetLex = 0x62,
    /// setlocal index
    SetLocal = 0x63,
    /// Get a property, walking the prototype chain
    GetProperty = 0x66,
    /// Set an own property and push the value
    SetProperty = 0x67,

    // ===== Functions =====
    /// Return top of stack, or undefined if empty
    ReturnValue = 0x48,

    // ===== Scope =====
    /// Pop an object onto the scope stack
    PushScope = 0x9F,
    /// No-op
    PopScope = 0xA0,

    // ===== Locals =====
    GetLocal0 = 0xD0,
    GetLocal1 = 0xD1,
    GetLocal2 = 0xD2,
    GetLocal3 = 0xD3,
    SetLocal0 = 0xD4,
    SetLocal1 = 0xD5,
    SetLocal2 = 0xD6,
    SetLocal3 = 0xD7,
}

impl OpCode {
    /// Get opcode from byte value. Unsupported bytes yield `None`.
    pub fn from_u8(byte: u8) -> Option<Self> {
        use OpCode::*;
        Some(match byte {
            0x02 => Nop,
            0x09 => Label,
            0x10 => Jump,
            0x11 => IfTrue,
            0x12 => IfFalse,
            0x20 => PushNull,
            0x21 => PushUndefined,
            0x24 => PushByte,
            0x25 => PushShort,
            0x26 => PushTrue,
            0x27 => PushFalse,
            0x28 => PushNaN,
            0x29 => Pop,
            0x2A => Add,
            0x2B => Swap,
            0x2C => PushString,
            0x2D => PushInt,
            0x2E => PushUint,
            0x2F => PushDouble,
            0x40 => NewFunction,
            0x41 => HasNext,
            0x42 => Construct,
            0x43 => NewClass,
            0x46 => InitProperty,
            0x47 => HasNext2,
            0x48 => ReturnValue,
            0x49 => ConstructSuper,
            0x4E => CallProp,
            0x4F => CallPropVoid,
            0x53 => ConstructProp,
            0x55 => NewObject,
            0x62 => GetLex,
            0x63 => SetLocal,
            0x66 => GetProperty,
            0x67 => SetProperty,
            0x90 => Negate,
            0x91 => Increment,
            0x93 => Decrement,
            0x96 => Not,
            0x9F => PushScope,
            0xA0 => PopScope,
            0xA1 => Subtract,
            0xA2 => Multiply,
            0xA3 => Divide,
            0xA4 => Modulo,
            0xAB => Equals,
            0xAD => LessThan,
            0xAE => LessEquals,
            0xAF => GreaterThan,
            0xB0 => GreaterEquals,
            0xD0 => GetLocal0,
            0xD1 => GetLocal1,
            0xD2 => GetLocal2,
            0xD3 => GetLocal3,
            0xD4 => SetLocal0,
            0xD5 => SetLocal1,
            0xD6 => SetLocal2,
            0xD7 => SetLocal3,
            _ => return None,
        })
    }

    /// Convert opcode to byte value
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Operand layout following the opcode byte.
    pub fn operands(self) -> &'static [Operand] {
        use OpCode::*;
        match self {
            PushByte => &[Operand::Byte],
            Jump | IfTrue | IfFalse => &[Operand::S24],
            CallProp | CallPropVoid => &[Operand::U30, Operand::U30],
            PushShort | PushString | PushInt | PushUint | PushDouble | NewFunction
            | Construct | NewClass | InitProperty | ConstructSuper | NewObject | GetLex
            | SetLocal | GetProperty | SetProperty => &[Operand::U30],
            _ => &[],
        }
    }

    /// Get the assembler mnemonic
    pub fn name(self) -> &'static str {
        use OpCode::*;
        match self {
            Nop => "nop",
            Label => "label",
            Jump => "jump",
            IfTrue => "iftrue",
            IfFalse => "iffalse",
            PushNull => "pushnull",
            PushUndefined => "pushundefined",
            PushByte => "pushbyte",
            PushShort => "pushshort",
            PushTrue => "pushtrue",
            PushFalse => "pushfalse",
            PushNaN => "pushnan",
            PushString => "pushstring",
            PushInt => "pushint",
            PushUint => "pushuint",
            PushDouble => "pushdouble",
            Pop => "pop",
            Swap => "swap",
            Add => "add",
            Subtract => "subtract",
            Multiply => "multiply",
            Divide => "divide",
            Modulo => "modulo",
            Negate => "negate",
            Increment => "increment",
            Decrement => "decrement",
            Not => "not",
            Equals => "equals",
            LessThan => "lessthan",
            LessEquals => "lessequals",
            GreaterThan => "greaterthan",
            GreaterEquals => "greaterequals",
            NewFunction => "newfunction",
            HasNext => "hasnext",
            Construct => "construct",
            NewClass => "newclass",
            InitProperty => "initproperty",
            HasNext2 => "hasnext2",
            ConstructSuper => "constructsuper",
            CallProp => "callproperty",
            CallPropVoid => "callpropvoid",
            ConstructProp => "constructprop",
            NewObject => "newobject",
            GetLex => "getlex",
            SetLocal => "setlocal",
            GetProperty => "getproperty",
            SetProperty => "setproperty",
            ReturnValue => "returnvalue",
            PushScope => "pushscope",
            PopScope => "popscope",
            GetLocal0 => "getlocal_0",
            GetLocal1 => "getlocal_1",
            GetLocal2 => "getlocal_2",
            GetLocal3 => "getlocal_3",
            SetLocal0 => "setlocal_0",
            SetLocal1 => "setlocal_1",
            SetLocal2 => "setlocal_2",
            SetLocal3 => "setlocal_3",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Instruction encoding utilities
pub mod instruction {
    use abc::Writer;

    use super::{OpCode, Operand};

    /// Appends `op` and its operands to `code`.
    ///
    /// Operands are matched positionally against [`OpCode::operands`];
    /// missing ones are written as zero and extras are ignored.
    pub fn emit(code: &mut Vec<u8>, op: OpCode, operands: &[i32]) {
        let mut w = Writer::new();
        w.write_u8(op.as_u8());
        for (i, kind) in op.operands().iter().enumerate() {
            let v = operands.get(i).copied().unwrap_or(0);
            match kind {
                Operand::Byte => w.write_u8(v as u8),
                Operand::U30 => w.write_u30(v as u32),
                Operand::S24 => w.write_s24(v),
            }
        }
        code.extend_from_slice(w.as_slice());
    }

    /// Builds a code sequence from `(opcode, operands)` pairs.
    pub fn assemble(instructions: &[(OpCode, &[i32])]) -> Vec<u8> {
        let mut code = Vec::new();
        for (op, operands) in instructions {
            emit(&mut code, *op, operands);
        }
        code
    }

    /// Encoded size of `op` with the given operands.
    pub fn encoded_len(op: OpCode, operands: &[i32]) -> usize {
        let mut code = Vec::new();
        emit(&mut code, op, operands);
        code.len()
    }
}
