//! Property lookup along prototype chains.
//!
//! A trait in a public namespace (or in none) is visible to everyone. A trait
//! in any other namespace is visible only to a caller presenting that exact
//! namespace handle. Plain data properties are always public.

use crate::heap::Heap;
use crate::object::{Object, PropertySlot, TraitDescriptor};
use crate::value::{ClassRef, NamespaceRef, ObjectRef, Value};

impl Heap {
    pub fn is_visible(&self, t: &TraitDescriptor, caller_ns: Option<NamespaceRef>) -> bool {
        match t.namespace {
            None => true,
            Some(ns) => {
                caller_ns == Some(ns) || self.get_namespace(ns).is_some_and(|n| n.is_public())
            }
        }
    }

    /// Finds the first slot named `name` visible to `caller_ns`, searching
    /// `obj` and then its prototype chain.
    ///
    /// A trait that is present but hidden does not stop the search.
    pub fn resolve_trait(
        &self,
        obj: ObjectRef,
        name: &str,
        caller_ns: Option<NamespaceRef>,
    ) -> Option<&PropertySlot> {
        self.chain(obj).find_map(|o| {
            let slot = o.own(name)?;
            match slot {
                PropertySlot::Trait(t) if !self.is_visible(t, caller_ns) => None,
                _ => Some(slot),
            }
        })
    }

    /// Plain read: own table, then the prototype chain. `None` if absent.
    pub fn get_property(&self, obj: ObjectRef, name: &str) -> Option<Value> {
        self.chain(obj)
            .find_map(|o| o.own(name))
            .map(PropertySlot::value)
    }

    /// Plain write. Always lands on `obj` itself, shadowing any inherited slot.
    pub fn set_property(&mut self, obj: ObjectRef, name: &str, value: Value) -> bool {
        match self.get_object_mut(obj) {
            Some(o) => {
                o.properties
                    .insert(name.to_owned(), PropertySlot::Value(value));
                true
            }
            None => false,
        }
    }

    /// Binds `t` on `obj` itself.
    pub fn define_trait(&mut self, obj: ObjectRef, t: TraitDescriptor) -> bool {
        match self.get_object_mut(obj) {
            Some(o) => {
                o.properties.insert(t.name.clone(), PropertySlot::Trait(t));
                true
            }
            None => false,
        }
    }

    /// Iterates `obj` and its prototypes, nearest first.
    ///
    /// Stops after visiting as many objects as the heap holds, so a cyclic
    /// prototype link cannot loop forever.
    pub fn chain(&self, obj: ObjectRef) -> impl Iterator<Item = &Object> + '_ {
        let mut next = Some(obj);
        let limit = self.objects.len();
        std::iter::from_fn(move || {
            let o = self.get_object(next?)?;
            next = o.prototype;
            Some(o)
        })
        .take(limit)
    }

    /// Adds a trait to a class, keeping an already built prototype in sync.
    pub fn add_class_trait(&mut self, class: ClassRef, t: TraitDescriptor) {
        let Some(c) = self.get_class_mut(class) else {
            return;
        };
        let prototype = c.prototype;
        c.traits.insert(t.name.clone(), t.clone());
        if let Some(proto) = prototype {
            self.define_trait(proto, t);
        }
    }

    /// The prototype object for instances of `class`, built on first use.
    ///
    /// The object carries the class trait table and links to the
    /// superclass's prototype. Missing ancestors are built root first.
    pub fn class_prototype(&mut self, class: ClassRef) -> Option<ObjectRef> {
        let mut pending = Vec::new();
        let mut cursor = Some(class);
        while let Some(c) = cursor {
            let info = self.get_class(c)?;
            if info.prototype.is_some() || pending.contains(&c) {
                break;
            }
            pending.push(c);
            cursor = info.super_class;
        }

        for &c in pending.iter().rev() {
            let info = self.get_class(c)?;
            let parent = info
                .super_class
                .and_then(|s| self.get_class(s))
                .and_then(|s| s.prototype);
            let mut proto = Object::with_prototype(parent, Some(c));
            for (name, t) in &info.traits {
                proto
                    .properties
                    .insert(name.clone(), PropertySlot::Trait(t.clone()));
            }
            let proto = self.alloc_object(proto);
            if let Some(info) = self.get_class_mut(c) {
                info.prototype = Some(proto);
            }
        }
        self.get_class(class)?.prototype
    }

    /// Allocates an instance of `class` linked to its prototype.
    pub fn new_instance(&mut self, class: ClassRef) -> ObjectRef {
        let proto = self.class_prototype(class);
        self.alloc_object(Object::with_prototype(proto, Some(class)))
    }

    /// Looks `name` up in a class's own trait table, then its superclasses.
    pub fn class_trait(
        &self,
        class: ClassRef,
        name: &str,
        caller_ns: Option<NamespaceRef>,
    ) -> Option<&TraitDescriptor> {
        let mut cursor = Some(class);
        for _ in 0..=self.classes.len() {
            let c = self.get_class(cursor?)?;
            if let Some(t) = c.traits.get(name) {
                if self.is_visible(t, caller_ns) {
                    return Some(t);
                }
            }
            cursor = c.super_class;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use abc::NamespaceKind;

    use super::*;
    use crate::function::{Function, NativeId};
    use crate::object::Class;

    fn heap_with_function() -> (Heap, crate::FunctionRef) {
        let mut heap = Heap::new();
        let f = heap.alloc_function(Function::native("f", NativeId(0)));
        (heap, f)
    }

    #[test]
    fn own_property_wins_over_prototype() {
        let mut heap = Heap::new();
        let proto = heap.alloc_object(Object::new());
        let obj = heap.alloc_object(Object::with_prototype(Some(proto), None));
        heap.set_property(proto, "x", Value::Int(1));
        heap.set_property(obj, "x", Value::Int(2));
        assert_eq!(heap.get_property(obj, "x"), Some(Value::Int(2)));
        assert_eq!(heap.get_property(proto, "x"), Some(Value::Int(1)));
    }

    #[test]
    fn lookup_falls_through_to_prototype() {
        let mut heap = Heap::new();
        let proto = heap.alloc_object(Object::new());
        let obj = heap.alloc_object(Object::with_prototype(Some(proto), None));
        heap.set_property(proto, "inherited", Value::Bool(true));
        assert_eq!(heap.get_property(obj, "inherited"), Some(Value::Bool(true)));
        assert_eq!(heap.get_property(obj, "missing"), None);
    }

    #[test]
    fn set_never_writes_through_to_prototype() {
        let mut heap = Heap::new();
        let proto = heap.alloc_object(Object::new());
        let obj = heap.alloc_object(Object::with_prototype(Some(proto), None));
        heap.set_property(obj, "x", Value::Null);
        assert!(heap.get_object(proto).is_some_and(|p| p.own("x").is_none()));
    }

    #[test]
    fn private_trait_needs_the_same_namespace_handle() {
        let (mut heap, f) = heap_with_function();
        let ns = heap.alloc_namespace(NamespaceKind::Private, "secret");
        let lookalike = heap.alloc_namespace(NamespaceKind::Private, "secret");
        let obj = heap.alloc_object(Object::new());
        heap.define_trait(obj, TraitDescriptor::method("m", f).in_namespace(ns));

        assert!(heap.resolve_trait(obj, "m", None).is_none());
        assert!(heap.resolve_trait(obj, "m", Some(lookalike)).is_none());
        assert!(heap.resolve_trait(obj, "m", Some(ns)).is_some());
    }

    #[test]
    fn public_namespace_trait_is_visible_to_all() {
        let (mut heap, f) = heap_with_function();
        let ns = heap.alloc_namespace(NamespaceKind::Package, "");
        let obj = heap.alloc_object(Object::new());
        heap.define_trait(obj, TraitDescriptor::method("m", f).in_namespace(ns));
        assert!(heap.resolve_trait(obj, "m", None).is_some());
    }

    #[test]
    fn hidden_trait_does_not_stop_search() {
        let (mut heap, f) = heap_with_function();
        let g = heap.alloc_function(Function::native("g", NativeId(1)));
        let ns = heap.alloc_namespace(NamespaceKind::Protected, "p");
        let proto = heap.alloc_object(Object::new());
        let obj = heap.alloc_object(Object::with_prototype(Some(proto), None));
        heap.define_trait(proto, TraitDescriptor::method("m", g));
        heap.define_trait(obj, TraitDescriptor::method("m", f).in_namespace(ns));

        let found = heap.resolve_trait(obj, "m", None).map(PropertySlot::value);
        assert_eq!(found, Some(Value::Function(g)));
    }

    #[test]
    fn cyclic_prototypes_terminate() {
        let mut heap = Heap::new();
        let a = heap.alloc_object(Object::new());
        let b = heap.alloc_object(Object::with_prototype(Some(a), None));
        if let Some(o) = heap.get_object_mut(a) {
            o.prototype = Some(b);
        }
        assert_eq!(heap.get_property(a, "nothing"), None);
    }

    #[test]
    fn prototypes_chain_through_superclasses() {
        let (mut heap, f) = heap_with_function();
        let base = heap.alloc_class(Class::new("Base"));
        heap.add_class_trait(base, TraitDescriptor::method("hello", f));
        let mut derived = Class::new("Derived");
        derived.super_class = Some(base);
        let derived = heap.alloc_class(derived);

        let obj = heap.new_instance(derived);
        assert_eq!(heap.get_property(obj, "hello"), Some(Value::Function(f)));

        let base_proto = heap.get_class(base).and_then(|c| c.prototype);
        let derived_proto = heap.class_prototype(derived);
        assert!(base_proto.is_some());
        assert_eq!(
            derived_proto.and_then(|p| heap.get_object(p)).and_then(|p| p.prototype),
            base_proto
        );
    }

    #[test]
    fn late_class_traits_reach_existing_prototype() {
        let (mut heap, f) = heap_with_function();
        let class = heap.alloc_class(Class::new("C"));
        let obj = heap.new_instance(class);
        heap.add_class_trait(class, TraitDescriptor::method("late", f));
        assert_eq!(heap.get_property(obj, "late"), Some(Value::Function(f)));
    }

    #[test]
    fn class_trait_walks_superclasses() {
        let (mut heap, f) = heap_with_function();
        let base = heap.alloc_class(Class::new("Base"));
        heap.add_class_trait(base, TraitDescriptor::method("s", f));
        let mut derived = Class::new("Derived");
        derived.super_class = Some(base);
        let derived = heap.alloc_class(derived);
        assert!(heap.class_trait(derived, "s", None).is_some());
        assert!(heap.class_trait(derived, "t", None).is_none());
    }
}
