//! Serialises an [`AbcFile`] back to bytes, mirroring the decoder field for
//! field. Tools use it to write programs; tests use it to build them.

use crate::constant_pool::{ConstantPool, Multiname};
use crate::program::*;
use crate::writer::Writer;

pub fn encode(file: &AbcFile) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u16(file.minor_version);
    w.write_u16(file.major_version);
    write_constant_pool(&mut w, &file.constant_pool);

    w.write_u30(file.methods.len() as u32);
    for method in &file.methods {
        write_method_info(&mut w, method);
    }

    w.write_u30(file.metadata.len() as u32);
    for meta in &file.metadata {
        w.write_u30(meta.name);
        w.write_u30(meta.items.len() as u32);
        for &(key, value) in &meta.items {
            w.write_u30(key);
            w.write_u30(value);
        }
    }

    w.write_u30(file.instances.len() as u32);
    for inst in &file.instances {
        write_instance_info(&mut w, inst);
    }
    // No count prefix: classes pair 1:1 with instances.
    for class in &file.classes {
        w.write_u30(class.initializer);
        write_traits(&mut w, &class.traits);
    }

    w.write_u30(file.scripts.len() as u32);
    for script in &file.scripts {
        w.write_u30(script.initializer);
        write_traits(&mut w, &script.traits);
    }

    w.write_u30(file.method_bodies.len() as u32);
    for body in &file.method_bodies {
        write_method_body(&mut w, body);
    }
    w.into_vec()
}

/// Count for a pool table: the sentinel-only table is written as 0.
fn pool_count<T>(items: &[T]) -> u32 {
    if items.len() <= 1 {
        0
    } else {
        items.len() as u32
    }
}

pub fn write_constant_pool(w: &mut Writer, pool: &ConstantPool) {
    w.write_u30(pool_count(&pool.ints));
    for &v in pool.ints.iter().skip(1) {
        w.write_s32(v);
    }
    w.write_u30(pool_count(&pool.uints));
    for &v in pool.uints.iter().skip(1) {
        w.write_u30(v);
    }
    w.write_u30(pool_count(&pool.doubles));
    for &v in pool.doubles.iter().skip(1) {
        w.write_d64(v);
    }
    w.write_u30(pool_count(&pool.strings));
    for s in pool.strings.iter().skip(1) {
        w.write_string(s);
    }
    w.write_u30(pool_count(&pool.namespaces));
    for ns in pool.namespaces.iter().skip(1) {
        w.write_u8(ns.kind.to_u8());
        w.write_u30(ns.name);
    }
    w.write_u30(pool_count(&pool.ns_sets));
    for set in pool.ns_sets.iter().skip(1) {
        w.write_u30(set.len() as u32);
        for ns in set {
            w.write_u30(ns.unwrap_or(0));
        }
    }
    w.write_u30(pool_count(&pool.multinames));
    for mn in pool.multinames.iter().skip(1) {
        write_multiname(w, mn);
    }
}

fn write_multiname(w: &mut Writer, mn: &Multiname) {
    let Some(kind) = mn.kind_byte() else {
        // A sentinel stored past index 0; the closest valid encoding.
        w.write_u8(Multiname::RTQNAME_L);
        return;
    };
    w.write_u8(kind);
    match *mn {
        Multiname::QName {
            name, namespace, ..
        } => {
            w.write_u30(name);
            w.write_u30(namespace);
        }
        Multiname::Multiname { name, ns_set, .. } => {
            w.write_u30(name);
            w.write_u30(ns_set);
        }
        _ => {}
    }
}

fn write_method_info(w: &mut Writer, method: &MethodInfo) {
    w.write_u30(method.param_types.len() as u32);
    w.write_u30(method.return_type);
    for &t in &method.param_types {
        w.write_u30(t);
    }
    w.write_u30(method.name);
    w.write_u8(method.flags);
    if method.has_optional() {
        w.write_u30(method.options.len() as u32);
        for opt in &method.options {
            w.write_u30(opt.index);
            w.write_u8(opt.kind);
        }
    }
    if method.has_param_names() {
        for i in 0..method.param_types.len() {
            w.write_u30(method.param_names.get(i).copied().unwrap_or(0));
        }
    }
}

fn write_instance_info(w: &mut Writer, inst: &InstanceInfo) {
    w.write_u30(inst.name);
    w.write_u30(inst.super_name);
    let mut flags = inst.flags;
    if inst.protected_ns.is_some() {
        flags |= InstanceInfo::PROTECTED_NS;
    }
    w.write_u8(flags);
    if flags & InstanceInfo::PROTECTED_NS != 0 {
        w.write_u30(inst.protected_ns.unwrap_or(0));
    }
    w.write_u30(inst.interfaces.len() as u32);
    for &i in &inst.interfaces {
        w.write_u30(i);
    }
    w.write_u30(inst.initializer);
    write_traits(w, &inst.traits);
}

fn write_method_body(w: &mut Writer, body: &MethodBody) {
    w.write_u30(body.method);
    w.write_u30(body.max_stack);
    w.write_u30(body.local_count);
    w.write_u30(body.init_scope_depth);
    w.write_len_prefixed(&body.code);
    w.write_u30(body.exceptions.len() as u32);
    for ex in &body.exceptions {
        w.write_u30(ex.from);
        w.write_u30(ex.to);
        w.write_u30(ex.target);
        w.write_u30(ex.exc_type);
        w.write_u30(ex.var_name);
    }
    write_traits(w, &body.traits);
}

fn write_traits(w: &mut Writer, traits: &[TraitInfo]) {
    w.write_u30(traits.len() as u32);
    for t in traits {
        write_trait(w, t);
    }
}

pub fn write_trait(w: &mut Writer, t: &TraitInfo) {
    w.write_u30(t.name);
    let kind_byte = t.kind_byte();
    w.write_u8(kind_byte);
    match t.kind {
        TraitKind::Slot(slot) | TraitKind::Const(slot) => {
            w.write_u30(slot.slot_id);
            w.write_u30(slot.type_name);
            match slot.default {
                Some(DefaultValue { index, kind }) if index != 0 => {
                    w.write_u30(index);
                    w.write_u8(kind);
                }
                _ => w.write_u30(0),
            }
        }
        TraitKind::Method(m) | TraitKind::Getter(m) | TraitKind::Setter(m) => {
            w.write_u30(m.disp_id);
            w.write_u30(m.method);
        }
        TraitKind::Class { slot_id, class } => {
            w.write_u30(slot_id);
            w.write_u30(class);
        }
        TraitKind::Function { slot_id, function } => {
            w.write_u30(slot_id);
            w.write_u30(function);
        }
    }
    if (kind_byte >> 4) & TraitInfo::ATTR_METADATA != 0 {
        w.write_u30(t.metadata.len() as u32);
        for &m in &t.metadata {
            w.write_u30(m);
        }
    }
}
