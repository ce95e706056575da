//! Namespaces, classes, objects and the trait descriptors that bind them.

use abc::NamespaceKind;
use indexmap::IndexMap;

use crate::value::{ClassRef, FunctionRef, NamespaceRef, ObjectRef, StringRef, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub kind: NamespaceKind,
    pub name: StringRef,
}

impl Namespace {
    pub fn is_public(&self) -> bool {
        self.kind.is_public()
    }
}

/// What a trait was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitSort {
    Slot,
    Const,
    Method,
    Getter,
    Setter,
    Class,
}

/// What a trait resolves to at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitBinding {
    /// A storage slot; its value lives in the object's data properties.
    Slot(u32),
    Function(FunctionRef),
    Class(ClassRef),
}

/// A named member bound to a class or an object.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitDescriptor {
    pub name: String,
    /// `None` is the public namespace.
    pub namespace: Option<NamespaceRef>,
    pub sort: TraitSort,
    pub binding: TraitBinding,
}

impl TraitDescriptor {
    pub fn method(name: impl Into<String>, function: FunctionRef) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            sort: TraitSort::Method,
            binding: TraitBinding::Function(function),
        }
    }

    pub fn slot(name: impl Into<String>, slot_id: u32) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            sort: TraitSort::Slot,
            binding: TraitBinding::Slot(slot_id),
        }
    }

    pub fn class(name: impl Into<String>, class: ClassRef) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            sort: TraitSort::Class,
            binding: TraitBinding::Class(class),
        }
    }

    pub fn in_namespace(mut self, ns: NamespaceRef) -> Self {
        self.namespace = Some(ns);
        self
    }

    /// The value a plain property read of this trait produces.
    pub fn bound_value(&self) -> Value {
        match self.binding {
            TraitBinding::Function(f) => Value::Function(f),
            TraitBinding::Class(c) => Value::Class(c),
            TraitBinding::Slot(_) => Value::Undefined,
        }
    }
}

/// One entry of an object's property table.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySlot {
    /// Plain data, always publicly visible.
    Value(Value),
    Trait(TraitDescriptor),
}

impl PropertySlot {
    pub fn value(&self) -> Value {
        match self {
            PropertySlot::Value(v) => *v,
            PropertySlot::Trait(t) => t.bound_value(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    /// Insertion order is the enumeration order.
    pub properties: IndexMap<String, PropertySlot>,
    pub prototype: Option<ObjectRef>,
    pub class: Option<ClassRef>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prototype(prototype: Option<ObjectRef>, class: Option<ClassRef>) -> Self {
        Self {
            properties: IndexMap::new(),
            prototype,
            class,
        }
    }

    pub fn own(&self, name: &str) -> Option<&PropertySlot> {
        self.properties.get(name)
    }

    /// Own property name at enumeration position `index`.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.properties.get_index(index).map(|(k, _)| k.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Class {
    pub name: String,
    pub super_class: Option<ClassRef>,
    /// Instance and static traits share this table.
    pub traits: IndexMap<String, TraitDescriptor>,
    pub constructor: Option<FunctionRef>,
    /// Built on first construction; see [`Heap::class_prototype`](crate::Heap::class_prototype).
    pub prototype: Option<ObjectRef>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
