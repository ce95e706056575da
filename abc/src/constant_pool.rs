//! The shared constant pool.
//!
//! Every table reserves index 0 as a sentinel that is never read from the
//! stream; real entries start at index 1.

use serde::Serialize;

/// Visibility kind of a namespace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NamespaceKind {
    /// `0x08`, the plain public namespace.
    Namespace,
    /// `0x16`, a public package namespace.
    Package,
    /// `0x17`, package-internal.
    PackageInternal,
    /// `0x18`
    Protected,
    /// `0x19`
    Explicit,
    /// `0x1A`
    StaticProtected,
    /// `0x05`
    Private,
    Other(u8),
}

impl NamespaceKind {
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0x08 => NamespaceKind::Namespace,
            0x16 => NamespaceKind::Package,
            0x17 => NamespaceKind::PackageInternal,
            0x18 => NamespaceKind::Protected,
            0x19 => NamespaceKind::Explicit,
            0x1A => NamespaceKind::StaticProtected,
            0x05 => NamespaceKind::Private,
            other => NamespaceKind::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            NamespaceKind::Namespace => 0x08,
            NamespaceKind::Package => 0x16,
            NamespaceKind::PackageInternal => 0x17,
            NamespaceKind::Protected => 0x18,
            NamespaceKind::Explicit => 0x19,
            NamespaceKind::StaticProtected => 0x1A,
            NamespaceKind::Private => 0x05,
            NamespaceKind::Other(b) => b,
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, NamespaceKind::Namespace | NamespaceKind::Package)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamespaceInfo {
    pub kind: NamespaceKind,
    /// Index into the string table.
    pub name: u32,
}

impl Default for NamespaceInfo {
    fn default() -> Self {
        Self {
            kind: NamespaceKind::Other(0),
            name: 0,
        }
    }
}

/// Namespace indices of one set. Out-of-range references decode as `None`.
pub type NamespaceSet = Vec<Option<u32>>;

/// A qualified-name descriptor.
///
/// `attribute` distinguishes the `...A` kinds (`@name` lookups).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Multiname {
    /// The index-0 sentinel.
    Void,
    QName {
        name: u32,
        namespace: u32,
        attribute: bool,
    },
    RtqName {
        attribute: bool,
    },
    RtqNameL {
        attribute: bool,
    },
    Multiname {
        name: u32,
        ns_set: u32,
        attribute: bool,
    },
    MultinameL {
        attribute: bool,
    },
    TypeName,
}

impl Default for Multiname {
    fn default() -> Self {
        Multiname::Void
    }
}

impl Multiname {
    pub const QNAME: u8 = 0x07;
    pub const QNAME_A: u8 = 0x0D;
    pub const RTQNAME: u8 = 0x0F;
    pub const RTQNAME_A: u8 = 0x10;
    pub const RTQNAME_L: u8 = 0x11;
    pub const RTQNAME_LA: u8 = 0x12;
    pub const MULTINAME: u8 = 0x09;
    pub const MULTINAME_A: u8 = 0x0E;
    pub const MULTINAME_L: u8 = 0x1B;
    pub const MULTINAME_LA: u8 = 0x1C;
    pub const TYPENAME: u8 = 0x1D;

    /// The kind byte this entry is encoded with. `Void` has none.
    pub fn kind_byte(&self) -> Option<u8> {
        Some(match *self {
            Multiname::Void => return None,
            Multiname::QName { attribute, .. } => pick(attribute, Self::QNAME_A, Self::QNAME),
            Multiname::RtqName { attribute } => pick(attribute, Self::RTQNAME_A, Self::RTQNAME),
            Multiname::RtqNameL { attribute } => {
                pick(attribute, Self::RTQNAME_LA, Self::RTQNAME_L)
            }
            Multiname::Multiname { attribute, .. } => {
                pick(attribute, Self::MULTINAME_A, Self::MULTINAME)
            }
            Multiname::MultinameL { attribute } => {
                pick(attribute, Self::MULTINAME_LA, Self::MULTINAME_L)
            }
            Multiname::TypeName => Self::TYPENAME,
        })
    }

    /// The name string index, when the kind carries one.
    pub fn name(&self) -> Option<u32> {
        match *self {
            Multiname::QName { name, .. } | Multiname::Multiname { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The single namespace index of qualified kinds.
    pub fn namespace(&self) -> Option<u32> {
        match *self {
            Multiname::QName { namespace, .. } => Some(namespace),
            _ => None,
        }
    }

    /// The namespace-set index of set kinds.
    pub fn ns_set(&self) -> Option<u32> {
        match *self {
            Multiname::Multiname { ns_set, .. } => Some(ns_set),
            _ => None,
        }
    }
}

fn pick(attribute: bool, a: u8, plain: u8) -> u8 {
    if attribute {
        a
    } else {
        plain
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantPool {
    pub ints: Vec<i32>,
    pub uints: Vec<u32>,
    pub doubles: Vec<f64>,
    pub strings: Vec<String>,
    pub namespaces: Vec<NamespaceInfo>,
    pub ns_sets: Vec<NamespaceSet>,
    pub multinames: Vec<Multiname>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// A pool holding only the index-0 sentinels.
    pub fn new() -> Self {
        Self {
            ints: vec![0],
            uints: vec![0],
            doubles: vec![0.0],
            strings: vec![String::new()],
            namespaces: vec![NamespaceInfo::default()],
            ns_sets: vec![Vec::new()],
            multinames: vec![Multiname::Void],
        }
    }

    /// String at `index`; the sentinel and out-of-range indices yield `None`.
    pub fn string(&self, index: u32) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.strings.get(index as usize).map(String::as_str)
    }

    pub fn int(&self, index: u32) -> Option<i32> {
        real(index).and_then(|i| self.ints.get(i).copied())
    }

    pub fn uint(&self, index: u32) -> Option<u32> {
        real(index).and_then(|i| self.uints.get(i).copied())
    }

    pub fn double(&self, index: u32) -> Option<f64> {
        real(index).and_then(|i| self.doubles.get(i).copied())
    }

    pub fn namespace(&self, index: u32) -> Option<&NamespaceInfo> {
        real(index).and_then(|i| self.namespaces.get(i))
    }

    pub fn ns_set(&self, index: u32) -> Option<&NamespaceSet> {
        real(index).and_then(|i| self.ns_sets.get(i))
    }

    pub fn multiname(&self, index: u32) -> Option<&Multiname> {
        real(index).and_then(|i| self.multinames.get(i))
    }

    /// Appends a string and returns its index. Used when building programs.
    pub fn push_string(&mut self, s: impl Into<String>) -> u32 {
        self.strings.push(s.into());
        (self.strings.len() - 1) as u32
    }

    pub fn push_int(&mut self, v: i32) -> u32 {
        self.ints.push(v);
        (self.ints.len() - 1) as u32
    }

    pub fn push_double(&mut self, v: f64) -> u32 {
        self.doubles.push(v);
        (self.doubles.len() - 1) as u32
    }

    pub fn push_namespace(&mut self, kind: NamespaceKind, name: u32) -> u32 {
        self.namespaces.push(NamespaceInfo { kind, name });
        (self.namespaces.len() - 1) as u32
    }
}

fn real(index: u32) -> Option<usize> {
    (index != 0).then_some(index as usize)
}
