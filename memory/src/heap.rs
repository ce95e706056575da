use abc::NamespaceKind;
use indexmap::IndexSet;

use crate::function::Function;
use crate::object::{Class, Namespace, Object};
use crate::value::{ClassRef, FunctionRef, NamespaceRef, ObjectRef, StringRef, Value};

/// Append-only typed storage. Entries live as long as the heap.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    pub data: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn alloc(&mut self, item: T) -> u32 {
        let index = self.data.len() as u32;
        self.data.push(item);
        index
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.data.get(index as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.data.get_mut(index as usize)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Owner of every runtime entity of a session.
///
/// Handles are plain indices and stay valid for the heap's lifetime; there is
/// no collector.
#[derive(Debug, Default)]
pub struct Heap {
    strings: IndexSet<String>,
    pub namespaces: Arena<Namespace>,
    pub classes: Arena<Class>,
    pub objects: Arena<Object>,
    pub functions: Arena<Function>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Strings ---

    /// Interns `s`, returning the existing handle for equal contents.
    pub fn intern(&mut self, s: &str) -> StringRef {
        if let Some(index) = self.strings.get_index_of(s) {
            return StringRef(index as u32);
        }
        let (index, _) = self.strings.insert_full(s.to_owned());
        StringRef(index as u32)
    }

    pub fn alloc_string(&mut self, s: String) -> StringRef {
        let (index, _) = self.strings.insert_full(s);
        StringRef(index as u32)
    }

    pub fn get_string(&self, s: StringRef) -> Option<&str> {
        self.strings.get_index(s.index()).map(String::as_str)
    }

    /// Convenience for natives: interns and wraps in a [`Value`].
    pub fn string_value(&mut self, s: &str) -> Value {
        Value::String(self.intern(s))
    }

    // --- Namespaces ---

    /// Allocates a distinct namespace. Equal names still yield distinct handles.
    pub fn alloc_namespace(&mut self, kind: NamespaceKind, name: &str) -> NamespaceRef {
        let name = self.intern(name);
        NamespaceRef(self.namespaces.alloc(Namespace { kind, name }))
    }

    pub fn get_namespace(&self, ns: NamespaceRef) -> Option<&Namespace> {
        self.namespaces.get(ns.0)
    }

    // --- Classes, objects, functions ---

    pub fn alloc_class(&mut self, class: Class) -> ClassRef {
        ClassRef(self.classes.alloc(class))
    }

    pub fn get_class(&self, class: ClassRef) -> Option<&Class> {
        self.classes.get(class.0)
    }

    pub fn get_class_mut(&mut self, class: ClassRef) -> Option<&mut Class> {
        self.classes.get_mut(class.0)
    }

    pub fn alloc_object(&mut self, object: Object) -> ObjectRef {
        ObjectRef(self.objects.alloc(object))
    }

    pub fn get_object(&self, object: ObjectRef) -> Option<&Object> {
        self.objects.get(object.0)
    }

    pub fn get_object_mut(&mut self, object: ObjectRef) -> Option<&mut Object> {
        self.objects.get_mut(object.0)
    }

    pub fn alloc_function(&mut self, function: Function) -> FunctionRef {
        FunctionRef(self.functions.alloc(function))
    }

    pub fn get_function(&self, function: FunctionRef) -> Option<&Function> {
        self.functions.get(function.0)
    }

    // --- Rendering ---

    /// Renders a value the way `trace` prints it.
    pub fn display(&self, value: Value) -> String {
        match value {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Uint(u) => u.to_string(),
            Value::Number(n) => format_number(n),
            Value::String(s) => self.get_string(s).unwrap_or_default().to_owned(),
            Value::Object(o) => {
                let class = self
                    .get_object(o)
                    .and_then(|obj| obj.class)
                    .and_then(|c| self.get_class(c))
                    .map_or("Object", |c| c.name.as_str());
                format!("[object {class}]")
            }
            Value::Class(c) => {
                let name = self.get_class(c).map_or("?", |c| c.name.as_str());
                format!("[class {name}]")
            }
            Value::Function(f) => {
                let name = self.get_function(f).map_or("?", |f| f.name.as_str());
                format!("function {name}() {{}}")
            }
            Value::Namespace(ns) => self
                .get_namespace(ns)
                .and_then(|n| self.get_string(n.name))
                .unwrap_or_default()
                .to_owned(),
        }
    }
}

/// Integral values print without a fraction, like the player does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.into()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
