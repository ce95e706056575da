//! The program decoder.
//!
//! Tables are read in fixed format order. Any field failure aborts the whole
//! decode; the returned error names the field path (for example
//! `instances[2].traits[0].kind`) and the offset where the field began.

use tracing::debug;

use crate::constant_pool::{ConstantPool, Multiname, NamespaceInfo, NamespaceKind};
use crate::error::DecodeError;
use crate::program::*;
use crate::reader::Reader;

/// Decodes a complete ABC program from `bytes`.
pub fn decode(bytes: &[u8]) -> Result<AbcFile, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    let file = decoder.file()?;
    if !decoder.reader.is_empty() {
        debug!(
            trailing = decoder.reader.remaining(),
            "ignoring bytes after the method body table"
        );
    }
    debug!(
        major = file.major_version,
        minor = file.minor_version,
        strings = file.constant_pool.strings.len(),
        methods = file.methods.len(),
        instances = file.instances.len(),
        scripts = file.scripts.len(),
        bodies = file.method_bodies.len(),
        "decoded abc program"
    );
    Ok(file)
}

/// Decodes only the constant pool, starting at the reader's position.
pub fn decode_constant_pool(reader: &mut Reader<'_>) -> Result<ConstantPool, DecodeError> {
    let mut decoder = Decoder {
        reader: reader.clone(),
        path: vec!["constant_pool".to_string()],
    };
    let pool = decoder.constant_pool()?;
    *reader = decoder.reader;
    Ok(pool)
}

/// Decodes a single trait entry, starting at the reader's position.
pub fn decode_trait(reader: &mut Reader<'_>) -> Result<TraitInfo, DecodeError> {
    let mut decoder = Decoder {
        reader: reader.clone(),
        path: vec!["trait".to_string()],
    };
    let info = decoder.trait_info()?;
    *reader = decoder.reader;
    Ok(info)
}

struct Decoder<'a> {
    reader: Reader<'a>,
    path: Vec<String>,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(bytes),
            path: Vec::new(),
        }
    }

    fn qualified(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path.join("."), name)
        }
    }

    fn wrap(&self, name: &str, offset: usize, err: DecodeError) -> DecodeError {
        DecodeError::Field {
            field: self.qualified(name),
            offset,
            source: Box::new(err),
        }
    }

    fn field<T>(
        &mut self,
        name: &str,
        read: impl FnOnce(&mut Reader<'a>) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let offset = self.reader.offset();
        read(&mut self.reader).map_err(|e| self.wrap(name, offset, e))
    }

    fn u30(&mut self, name: &str) -> Result<u32, DecodeError> {
        self.field(name, Reader::read_u30)
    }

    fn u8(&mut self, name: &str) -> Result<u8, DecodeError> {
        self.field(name, Reader::read_u8)
    }

    fn scoped<T>(
        &mut self,
        segment: String,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    /// Reads a count-prefixed table of `T`.
    fn table<T>(
        &mut self,
        name: &str,
        mut item: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let count = self.u30(&format!("{name}.count"))?;
        self.items(name, count, &mut item)
    }

    fn items<T>(
        &mut self,
        name: &str,
        count: u32,
        item: &mut impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        // Counts are untrusted; cap the up-front reservation by what is left.
        let mut out = Vec::with_capacity((count as usize).min(self.reader.remaining()));
        for i in 0..count {
            out.push(self.scoped(format!("{name}[{i}]"), &mut *item)?);
        }
        Ok(out)
    }

    /// Reads one pool sequence: a count where 0 means 1, entries from index 1.
    fn pool<T>(
        &mut self,
        name: &str,
        sentinel: T,
        mut item: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let count = self.u30(&format!("{name}.count"))?.max(1);
        let mut out = Vec::with_capacity((count as usize).min(self.reader.remaining() + 1));
        out.push(sentinel);
        for i in 1..count {
            out.push(self.scoped(format!("{name}[{i}]"), &mut item)?);
        }
        Ok(out)
    }

    fn file(&mut self) -> Result<AbcFile, DecodeError> {
        let minor_version = self.field("minor_version", Reader::read_u16)?;
        let major_version = self.field("major_version", Reader::read_u16)?;
        let constant_pool = self.scoped("constant_pool".into(), Self::constant_pool)?;
        let methods = self.table("methods", Self::method_info)?;
        let metadata = self.table("metadata", Self::metadata_info)?;
        let instances = self.table("instances", Self::instance_info)?;
        let class_count = instances.len() as u32;
        let classes = self.items("classes", class_count, &mut Self::class_info)?;
        let scripts = self.table("scripts", Self::script_info)?;
        let method_bodies = self.table("method_bodies", Self::method_body)?;

        Ok(AbcFile {
            minor_version,
            major_version,
            constant_pool,
            methods,
            metadata,
            instances,
            classes,
            scripts,
            method_bodies,
        })
    }

    fn constant_pool(&mut self) -> Result<ConstantPool, DecodeError> {
        let ints = self.pool("ints", 0, |d| d.field("value", Reader::read_s32))?;
        let uints = self.pool("uints", 0, |d| d.u30("value"))?;
        let doubles = self.pool("doubles", 0.0, |d| d.field("value", Reader::read_d64))?;
        let strings = self.pool("strings", String::new(), |d| {
            d.field("value", Reader::read_string)
        })?;
        let namespaces = self.pool("namespaces", NamespaceInfo::default(), |d| {
            let kind = NamespaceKind::from_u8(d.u8("kind")?);
            let name = d.u30("name")?;
            Ok(NamespaceInfo { kind, name })
        })?;
        let ns_count = namespaces.len() as u32;
        let ns_sets = self.pool("ns_sets", Vec::new(), |d| {
            d.table("namespaces", |d| {
                let index = d.u30("index")?;
                Ok((index != 0 && index < ns_count).then_some(index))
            })
        })?;
        let multinames = self.pool("multinames", Multiname::Void, Self::multiname)?;

        Ok(ConstantPool {
            ints,
            uints,
            doubles,
            strings,
            namespaces,
            ns_sets,
            multinames,
        })
    }

    fn multiname(&mut self) -> Result<Multiname, DecodeError> {
        let offset = self.reader.offset();
        let kind = self.u8("kind")?;
        Ok(match kind {
            Multiname::QNAME | Multiname::QNAME_A => Multiname::QName {
                name: self.u30("name")?,
                namespace: self.u30("namespace")?,
                attribute: kind == Multiname::QNAME_A,
            },
            Multiname::RTQNAME | Multiname::RTQNAME_A => Multiname::RtqName {
                attribute: kind == Multiname::RTQNAME_A,
            },
            Multiname::RTQNAME_L | Multiname::RTQNAME_LA => Multiname::RtqNameL {
                attribute: kind == Multiname::RTQNAME_LA,
            },
            Multiname::MULTINAME | Multiname::MULTINAME_A => Multiname::Multiname {
                name: self.u30("name")?,
                ns_set: self.u30("ns_set")?,
                attribute: kind == Multiname::MULTINAME_A,
            },
            Multiname::MULTINAME_L | Multiname::MULTINAME_LA => Multiname::MultinameL {
                attribute: kind == Multiname::MULTINAME_LA,
            },
            Multiname::TYPENAME => Multiname::TypeName,
            other => {
                return Err(self.wrap(
                    "kind",
                    offset,
                    DecodeError::InvalidMultinameKind {
                        kind: other,
                        offset,
                    },
                ))
            }
        })
    }

    fn method_info(&mut self) -> Result<MethodInfo, DecodeError> {
        let param_count = self.u30("param_count")?;
        let return_type = self.u30("return_type")?;
        let param_types = self.items("param_types", param_count, &mut |d: &mut Self| d.u30("type"))?;
        let name = self.u30("name")?;
        let flags = self.u8("flags")?;
        let mut info = MethodInfo {
            param_types,
            return_type,
            name,
            flags,
            options: Vec::new(),
            param_names: Vec::new(),
        };
        if info.has_optional() {
            info.options = self.table("options", |d| {
                let index = d.u30("value")?;
                let kind = d.u8("kind")?;
                Ok(DefaultValue { index, kind })
            })?;
        }
        if info.has_param_names() {
            info.param_names = self.items("param_names", param_count, &mut |d: &mut Self| d.u30("name"))?;
        }
        Ok(info)
    }

    fn metadata_info(&mut self) -> Result<MetadataInfo, DecodeError> {
        let name = self.u30("name")?;
        let items = self.table("items", |d| Ok((d.u30("key")?, d.u30("value")?)))?;
        Ok(MetadataInfo { name, items })
    }

    fn instance_info(&mut self) -> Result<InstanceInfo, DecodeError> {
        let name = self.u30("name")?;
        let super_name = self.u30("super_name")?;
        let flags = self.u8("flags")?;
        let protected_ns = if flags & InstanceInfo::PROTECTED_NS != 0 {
            Some(self.u30("protected_ns")?)
        } else {
            None
        };
        let interfaces = self.table("interfaces", |d| d.u30("interface"))?;
        let initializer = self.u30("initializer")?;
        let traits = self.table("traits", Self::trait_info)?;
        Ok(InstanceInfo {
            name,
            super_name,
            flags,
            protected_ns,
            interfaces,
            initializer,
            traits,
        })
    }

    fn class_info(&mut self) -> Result<ClassInfo, DecodeError> {
        let initializer = self.u30("initializer")?;
        let traits = self.table("traits", Self::trait_info)?;
        Ok(ClassInfo {
            initializer,
            traits,
        })
    }

    fn script_info(&mut self) -> Result<ScriptInfo, DecodeError> {
        let initializer = self.u30("initializer")?;
        let traits = self.table("traits", Self::trait_info)?;
        Ok(ScriptInfo {
            initializer,
            traits,
        })
    }

    fn method_body(&mut self) -> Result<MethodBody, DecodeError> {
        let method = self.u30("method")?;
        let max_stack = self.u30("max_stack")?;
        let local_count = self.u30("local_count")?;
        let init_scope_depth = self.u30("init_scope_depth")?;
        let code = self.field("code", |r| r.read_len_prefixed().map(<[u8]>::to_vec))?;
        let exceptions = self.table("exceptions", |d| {
            Ok(ExceptionInfo {
                from: d.u30("from")?,
                to: d.u30("to")?,
                target: d.u30("target")?,
                exc_type: d.u30("exc_type")?,
                var_name: d.u30("var_name")?,
            })
        })?;
        let traits = self.table("traits", Self::trait_info)?;
        Ok(MethodBody {
            method,
            max_stack,
            local_count,
            init_scope_depth,
            code,
            exceptions,
            traits,
        })
    }

    fn trait_info(&mut self) -> Result<TraitInfo, DecodeError> {
        let name = self.u30("name")?;
        let kind_offset = self.reader.offset();
        let kind_byte = self.u8("kind")?;
        let kind = match kind_byte & 0x0F {
            TraitKind::SLOT => TraitKind::Slot(self.slot_trait()?),
            TraitKind::CONST => TraitKind::Const(self.slot_trait()?),
            TraitKind::METHOD => TraitKind::Method(self.method_trait()?),
            TraitKind::GETTER => TraitKind::Getter(self.method_trait()?),
            TraitKind::SETTER => TraitKind::Setter(self.method_trait()?),
            TraitKind::CLASS => TraitKind::Class {
                slot_id: self.u30("slot_id")?,
                class: self.u30("class")?,
            },
            TraitKind::FUNCTION => TraitKind::Function {
                slot_id: self.u30("slot_id")?,
                function: self.u30("function")?,
            },
            other => {
                return Err(self.wrap(
                    "kind",
                    kind_offset,
                    DecodeError::InvalidTraitKind {
                        kind: other,
                        offset: kind_offset,
                    },
                ))
            }
        };
        let attributes = kind_byte >> 4;
        let metadata = if attributes & TraitInfo::ATTR_METADATA != 0 {
            self.table("metadata", |d| d.u30("index"))?
        } else {
            Vec::new()
        };
        Ok(TraitInfo {
            name,
            attributes,
            kind,
            metadata,
        })
    }

    fn slot_trait(&mut self) -> Result<SlotTrait, DecodeError> {
        let slot_id = self.u30("slot_id")?;
        let type_name = self.u30("type_name")?;
        let index = self.u30("value_index")?;
        let default = if index != 0 {
            let kind = self.u8("value_kind")?;
            Some(DefaultValue { index, kind })
        } else {
            None
        };
        Ok(SlotTrait {
            slot_id,
            type_name,
            default,
        })
    }

    fn method_trait(&mut self) -> Result<MethodTrait, DecodeError> {
        Ok(MethodTrait {
            disp_id: self.u30("disp_id")?,
            method: self.u30("method")?,
        })
    }
}
