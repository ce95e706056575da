//! Decoded program entities.
//!
//! Everything here refers to the constant pool and to sibling tables by
//! index. The decoded file is read-only once built.

use serde::Serialize;

use crate::constant_pool::ConstantPool;

/// A `(value index, value kind)` pair naming a constant default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DefaultValue {
    pub index: u32,
    pub kind: u8,
}

/// Constant kinds used by [`DefaultValue::kind`].
pub mod constant_kind {
    pub const INT: u8 = 0x03;
    pub const UINT: u8 = 0x04;
    pub const DOUBLE: u8 = 0x06;
    pub const UTF8: u8 = 0x01;
    pub const TRUE: u8 = 0x0B;
    pub const FALSE: u8 = 0x0A;
    pub const NULL: u8 = 0x0C;
    pub const UNDEFINED: u8 = 0x00;
    pub const NAMESPACE: u8 = 0x08;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    pub param_types: Vec<u32>,
    pub return_type: u32,
    pub name: u32,
    pub flags: u8,
    /// Defaults for the trailing optional parameters (`HAS_OPTIONAL`).
    pub options: Vec<DefaultValue>,
    /// One name per parameter (`HAS_PARAM_NAMES`).
    pub param_names: Vec<u32>,
}

impl MethodInfo {
    pub const NEED_ARGUMENTS: u8 = 0x01;
    pub const NEED_ACTIVATION: u8 = 0x02;
    pub const NEED_REST: u8 = 0x04;
    pub const HAS_OPTIONAL: u8 = 0x08;
    pub const SET_DXNS: u8 = 0x40;
    pub const HAS_PARAM_NAMES: u8 = 0x80;

    pub fn has_optional(&self) -> bool {
        self.flags & Self::HAS_OPTIONAL != 0
    }

    pub fn has_param_names(&self) -> bool {
        self.flags & Self::HAS_PARAM_NAMES != 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataInfo {
    pub name: u32,
    /// Raw `(key, value)` string indices; never interpreted.
    pub items: Vec<(u32, u32)>,
}

/// Payload shared by slot and const traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotTrait {
    pub slot_id: u32,
    pub type_name: u32,
    /// Present only when the encoded value index is non-zero.
    pub default: Option<DefaultValue>,
}

/// Payload shared by method, getter and setter traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodTrait {
    pub disp_id: u32,
    /// Index into the method table.
    pub method: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraitKind {
    Slot(SlotTrait),
    Method(MethodTrait),
    Getter(MethodTrait),
    Setter(MethodTrait),
    Class { slot_id: u32, class: u32 },
    Function { slot_id: u32, function: u32 },
    Const(SlotTrait),
}

impl TraitKind {
    pub const SLOT: u8 = 0;
    pub const METHOD: u8 = 1;
    pub const GETTER: u8 = 2;
    pub const SETTER: u8 = 3;
    pub const CLASS: u8 = 4;
    pub const FUNCTION: u8 = 5;
    pub const CONST: u8 = 6;

    /// The low-nibble tag this kind is encoded with.
    pub fn tag(&self) -> u8 {
        match self {
            TraitKind::Slot(_) => Self::SLOT,
            TraitKind::Method(_) => Self::METHOD,
            TraitKind::Getter(_) => Self::GETTER,
            TraitKind::Setter(_) => Self::SETTER,
            TraitKind::Class { .. } => Self::CLASS,
            TraitKind::Function { .. } => Self::FUNCTION,
            TraitKind::Const(_) => Self::CONST,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TraitKind::Slot(_) => "slot",
            TraitKind::Method(_) => "method",
            TraitKind::Getter(_) => "getter",
            TraitKind::Setter(_) => "setter",
            TraitKind::Class { .. } => "class",
            TraitKind::Function { .. } => "function",
            TraitKind::Const(_) => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitInfo {
    pub name: u32,
    /// Upper nibble of the kind byte (`ATTR_*`).
    pub attributes: u8,
    pub kind: TraitKind,
    pub metadata: Vec<u32>,
}

impl TraitInfo {
    pub const ATTR_FINAL: u8 = 0x1;
    pub const ATTR_OVERRIDE: u8 = 0x2;
    pub const ATTR_METADATA: u8 = 0x4;

    pub fn new(name: u32, kind: TraitKind) -> Self {
        Self {
            name,
            attributes: 0,
            kind,
            metadata: Vec::new(),
        }
    }

    /// The kind byte as it appears in the stream.
    pub fn kind_byte(&self) -> u8 {
        let mut attributes = self.attributes;
        if !self.metadata.is_empty() {
            attributes |= Self::ATTR_METADATA;
        }
        (attributes << 4) | self.kind.tag()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    pub name: u32,
    /// `0` means the class has no superclass.
    pub super_name: u32,
    pub flags: u8,
    pub protected_ns: Option<u32>,
    pub interfaces: Vec<u32>,
    /// Method index of the instance initializer.
    pub initializer: u32,
    pub traits: Vec<TraitInfo>,
}

impl InstanceInfo {
    pub const SEALED: u8 = 0x01;
    pub const FINAL: u8 = 0x02;
    pub const INTERFACE: u8 = 0x04;
    pub const PROTECTED_NS: u8 = 0x08;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    /// Method index of the static initializer.
    pub initializer: u32,
    pub traits: Vec<TraitInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptInfo {
    pub initializer: u32,
    pub traits: Vec<TraitInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    pub from: u32,
    pub to: u32,
    pub target: u32,
    /// Caught type name, `0` for catch-all.
    pub exc_type: u32,
    /// Binding name, `0` when unnamed.
    pub var_name: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodBody {
    /// Index of the owning method signature.
    pub method: u32,
    pub max_stack: u32,
    pub local_count: u32,
    pub init_scope_depth: u32,
    #[serde(skip_serializing)]
    pub code: Vec<u8>,
    pub exceptions: Vec<ExceptionInfo>,
    /// Activation traits.
    pub traits: Vec<TraitInfo>,
}

/// A fully decoded ABC program.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AbcFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub methods: Vec<MethodInfo>,
    pub metadata: Vec<MetadataInfo>,
    pub instances: Vec<InstanceInfo>,
    /// Parallel to `instances`: same length, same index space.
    pub classes: Vec<ClassInfo>,
    pub scripts: Vec<ScriptInfo>,
    pub method_bodies: Vec<MethodBody>,
}

impl AbcFile {
    pub const MINOR_VERSION: u16 = 16;
    pub const MAJOR_VERSION: u16 = 46;

    /// An empty program with the standard version numbers.
    pub fn new() -> Self {
        Self {
            minor_version: Self::MINOR_VERSION,
            major_version: Self::MAJOR_VERSION,
            ..Self::default()
        }
    }

    /// Body whose owning method is `method`, first match.
    pub fn body_for_method(&self, method: u32) -> Option<&MethodBody> {
        self.method_bodies.iter().find(|b| b.method == method)
    }
}
