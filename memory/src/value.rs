use std::fmt;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// An interned string. Equal handles mean equal contents.
    StringRef
);
handle!(
    /// A namespace. Two namespaces are the same only if their handles are.
    NamespaceRef
);
handle!(ClassRef);
handle!(ObjectRef);
handle!(FunctionRef);

/// A runtime value.
///
/// Every variant is a scalar or a non-owning handle into the [`Heap`](crate::Heap),
/// so values are `Copy` and cheap to push around the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i32),
    Uint(u32),
    Number(f64),
    String(StringRef),
    Object(ObjectRef),
    Class(ClassRef),
    Function(FunctionRef),
    Namespace(NamespaceRef),
}

impl Value {
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The numeric payload of `Int`, `Uint` and `Number`. No coercion.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Value::Int(i) => Some(f64::from(i)),
            Value::Uint(u) => Some(f64::from(u)),
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_string(&self) -> Option<StringRef> {
        match *self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<ObjectRef> {
        match *self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    #[inline]
    pub fn as_class(&self) -> Option<ClassRef> {
        match *self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_function(&self) -> Option<FunctionRef> {
        match *self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Object(_) => "Object",
            Value::Class(_) => "Class",
            Value::Function(_) => "Function",
            Value::Namespace(_) => "Namespace",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_undefined() {
        assert!(Value::default().is_undefined());
    }

    #[test]
    fn numeric_accessor_covers_all_numeric_variants() {
        assert_eq!(Value::Int(-3).as_number(), Some(-3.0));
        assert_eq!(Value::Uint(7).as_number(), Some(7.0));
        assert_eq!(Value::Number(1.5).as_number(), Some(1.5));
        assert_eq!(Value::Bool(true).as_number(), None);
    }

    #[test]
    fn handles_compare_by_identity() {
        assert_eq!(Value::Object(ObjectRef(1)), Value::Object(ObjectRef(1)));
        assert_ne!(Value::Object(ObjectRef(1)), Value::Object(ObjectRef(2)));
        assert_ne!(Value::Object(ObjectRef(1)), Value::Class(ClassRef(1)));
    }

    #[test]
    fn handle_debug_names_the_kind() {
        assert_eq!(format!("{:?}", NamespaceRef(4)), "NamespaceRef(4)");
    }
}
