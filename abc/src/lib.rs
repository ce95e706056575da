//! ABC (ActionScript Byte Code) container format.
//!
//! [`decode`] turns a program payload into an [`AbcFile`]; [`encode`] is its
//! inverse. Container framing (SWF tags, compression) is not handled here:
//! callers hand over the bare program bytes.

pub mod constant_pool;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod program;
pub mod reader;
pub mod writer;

pub use constant_pool::{ConstantPool, Multiname, NamespaceInfo, NamespaceKind, NamespaceSet};
pub use decoder::{decode, decode_constant_pool, decode_trait};
pub use encoder::encode;
pub use error::DecodeError;
pub use program::{
    AbcFile, ClassInfo, DefaultValue, ExceptionInfo, InstanceInfo, MetadataInfo, MethodBody,
    MethodInfo, MethodTrait, ScriptInfo, SlotTrait, TraitInfo, TraitKind,
};
pub use reader::Reader;
pub use writer::Writer;
