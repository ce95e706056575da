//! Linking: turns a decoded [`AbcFile`] into classes, functions and globals.
//!
//! Every step is a single pass over one program table. Name lookups go
//! through indices built once, and the first entry registered under a name
//! wins. Nothing after the "is there a program" check can fail: dangling
//! references degrade to absent bindings.

use std::rc::Rc;

use abc::program::constant_kind;
use abc::{AbcFile, ConstantPool, DefaultValue, NamespaceKind, TraitInfo, TraitKind};
use memory::{
    BytecodeBody, Class, ClassRef, Function, TraitBinding, TraitDescriptor, TraitSort, Value,
};
use tracing::{debug, info};

use crate::error::LinkError;
use crate::machine::{GlobalOps, VM};

impl VM {
    /// Links `program` into this VM. `None` is rejected.
    pub fn load(&mut self, program: Option<Rc<AbcFile>>) -> Result<(), LinkError> {
        let program = program.ok_or(LinkError::InvalidProgram)?;
        self.load_abc(program)
    }

    /// Links a decoded program, replacing any previously linked one.
    ///
    /// Globals bound earlier (the stdlib, a previous program) are kept, and
    /// a program name never replaces an existing global.
    pub fn load_abc(&mut self, program: Rc<AbcFile>) -> Result<(), LinkError> {
        self.program = Some(Rc::clone(&program));
        self.classes.clear();
        self.functions.clear();
        self.namespaces.clear();
        self.class_by_name.clear();
        self.function_by_method.clear();

        let pool = &program.constant_pool;

        for ns in &pool.namespaces {
            let name = pool.string(ns.name).unwrap_or_default();
            let handle = self.heap.alloc_namespace(ns.kind, name);
            self.namespaces.push(handle);
        }

        self.link_classes(&program);
        self.link_superclasses(&program);
        self.link_functions(&program);

        for (i, inst) in program.instances.iter().enumerate() {
            let class = self.classes[i];
            for t in &inst.traits {
                if let Some(desc) = self.link_trait(pool, t) {
                    self.heap.add_class_trait(class, desc);
                }
            }
            let constructor = self.function_for_method(inst.initializer);
            if let Some(c) = self.heap.get_class_mut(class) {
                c.constructor = constructor;
            }
        }

        for (i, info) in program.classes.iter().enumerate() {
            let Some(&class) = self.classes.get(i) else {
                break;
            };
            for t in &info.traits {
                let Some(desc) = self.link_trait(pool, t) else {
                    continue;
                };
                if let TraitBinding::Class(inner) = desc.binding {
                    self.register_class_global(inner);
                }
                self.heap.add_class_trait(class, desc);
            }
        }

        for script in &program.scripts {
            for t in &script.traits {
                self.link_script_trait(pool, t);
            }
        }

        info!(
            classes = self.classes.len(),
            functions = self.functions.len(),
            namespaces = self.namespaces.len(),
            globals = self.globals.len(),
            "program linked"
        );
        Ok(())
    }

    fn link_classes(&mut self, program: &AbcFile) {
        for (i, inst) in program.instances.iter().enumerate() {
            let name = match program.constant_pool.string(inst.name) {
                Some(s) if inst.name != 0 => s.to_owned(),
                _ => format!("Class#{i}"),
            };
            let class = self.heap.alloc_class(Class::new(name.clone()));
            self.classes.push(class);
            self.class_by_name.entry(name).or_insert(class);
            self.register_class_global(class);
        }
    }

    fn link_superclasses(&mut self, program: &AbcFile) {
        for (i, inst) in program.instances.iter().enumerate() {
            if inst.super_name == 0 {
                continue;
            }
            let super_name = self.pool_string(inst.super_name);
            let Some(parent) = self.class_named(&super_name) else {
                debug!(class = i, super_name = %super_name, "superclass not found");
                continue;
            };
            if let Some(c) = self.heap.get_class_mut(self.classes[i]) {
                c.super_class = Some(parent);
            }
        }
    }

    fn link_functions(&mut self, program: &AbcFile) {
        for (index, body) in program.method_bodies.iter().enumerate() {
            let name = program
                .methods
                .get(body.method as usize)
                .and_then(|m| program.constant_pool.string(m.name))
                .filter(|s| !s.is_empty())
                .map_or_else(|| format!("method_{}", body.method), str::to_owned);

            let function = self.heap.alloc_function(Function::bytecode(
                name,
                BytecodeBody {
                    method: body.method,
                    body: index as u32,
                    code: Rc::from(body.code.as_slice()),
                    max_stack: body.max_stack,
                    local_count: body.local_count,
                },
            ));
            self.functions.push(function);
            self.function_by_method.entry(body.method).or_insert(function);
        }
    }

    /// Runtime descriptor for a class or instance trait, or `None` when it
    /// refers to something that was never linked.
    fn link_trait(&self, pool: &ConstantPool, t: &TraitInfo) -> Option<TraitDescriptor> {
        let name = pool.string(t.name).unwrap_or_default().to_owned();
        let (sort, binding) = match &t.kind {
            TraitKind::Slot(s) => (TraitSort::Slot, TraitBinding::Slot(s.slot_id)),
            TraitKind::Const(s) => (TraitSort::Const, TraitBinding::Slot(s.slot_id)),
            TraitKind::Method(m) | TraitKind::Getter(m) | TraitKind::Setter(m) => {
                let Some(f) = self.function_for_method(m.method) else {
                    debug!(trait_name = %name, method = m.method, "method has no body");
                    return None;
                };
                let sort = match t.kind {
                    TraitKind::Getter(_) => TraitSort::Getter,
                    TraitKind::Setter(_) => TraitSort::Setter,
                    _ => TraitSort::Method,
                };
                (sort, TraitBinding::Function(f))
            }
            TraitKind::Function { function, .. } => {
                let f = self.function_for_method(*function)?;
                (TraitSort::Method, TraitBinding::Function(f))
            }
            TraitKind::Class { class, .. } => {
                let c = *self.classes.get(*class as usize)?;
                (TraitSort::Class, TraitBinding::Class(c))
            }
        };
        Some(TraitDescriptor {
            name,
            namespace: None,
            sort,
            binding,
        })
    }

    fn link_script_trait(&mut self, pool: &ConstantPool, t: &TraitInfo) {
        let name = pool.string(t.name).unwrap_or_default().to_owned();
        let value = match &t.kind {
            TraitKind::Slot(s) | TraitKind::Const(s) => self.constant_value(pool, s.default),
            _ => match self.link_trait(pool, t) {
                Some(desc) => desc.bound_value(),
                None => return,
            },
        };
        self.define_global(&name, value);
    }

    fn register_class_global(&mut self, class: ClassRef) {
        let Some(name) = self.heap.get_class(class).map(|c| c.name.clone()) else {
            return;
        };
        self.define_global(&name, Value::Class(class));
    }

    /// Resolves a slot default against the constant pool.
    pub fn constant_value(&mut self, pool: &ConstantPool, default: Option<DefaultValue>) -> Value {
        let Some(DefaultValue { index, kind }) = default else {
            return Value::Undefined;
        };
        match kind {
            constant_kind::INT => pool.int(index).map_or(Value::Undefined, Value::Int),
            constant_kind::UINT => pool.uint(index).map_or(Value::Undefined, Value::Uint),
            constant_kind::DOUBLE => pool.double(index).map_or(Value::Undefined, Value::Number),
            constant_kind::UTF8 => {
                let s = pool.string(index).unwrap_or_default();
                self.heap.string_value(s)
            }
            constant_kind::TRUE => Value::Bool(true),
            constant_kind::FALSE => Value::Bool(false),
            constant_kind::NULL => Value::Null,
            k if !matches!(NamespaceKind::from_u8(k), NamespaceKind::Other(_)) => self
                .namespaces
                .get(index as usize)
                .map_or(Value::Undefined, |&ns| Value::Namespace(ns)),
            _ => Value::Undefined,
        }
    }
}
