use std::rc::Rc;

use abc::{DecodeError, Reader};
use memory::{ObjectRef, Value};

use crate::config::VmConfig;
use crate::error::RuntimeError;

/// Execution state of one call.
///
/// Each frame tracks:
/// - `code`: the instruction bytes, shared with the owning function
/// - `ip`: offset of the next byte to read
/// - `stack`: the operand stack, private to this call
/// - `locals`: argument and local slots
/// - `scope`: objects pushed by `pushscope`
#[derive(Debug, Clone)]
pub struct Frame {
    pub code: Rc<[u8]>,
    pub ip: usize,
    pub stack: Vec<Value>,
    pub locals: Vec<Value>,
    pub scope: Vec<Value>,
    pub this: Option<ObjectRef>,
    pub(crate) stack_limit: usize,
    pub(crate) local_limit: usize,
}

impl Frame {
    pub fn new(code: Rc<[u8]>, max_stack: u32, local_count: u32, config: &VmConfig) -> Self {
        let capacity = (max_stack as usize).min(config.operand_stack_limit);
        Self::with_stack(code, Vec::with_capacity(capacity), local_count, config)
    }

    /// A frame that runs against an existing operand stack.
    pub fn with_stack(
        code: Rc<[u8]>,
        stack: Vec<Value>,
        local_count: u32,
        config: &VmConfig,
    ) -> Self {
        let local_count = (local_count as usize).min(config.max_locals);
        Self {
            code,
            ip: 0,
            stack,
            locals: vec![Value::Undefined; local_count],
            scope: Vec::new(),
            this: None,
            stack_limit: config.operand_stack_limit,
            local_limit: config.max_locals,
        }
    }

    /// Binds `args` into the first locals. Extra arguments are dropped.
    pub fn bind_args(&mut self, args: &[Value]) {
        for (slot, arg) in self.locals.iter_mut().zip(args) {
            *slot = *arg;
        }
    }

    pub fn local(&self, index: usize) -> Value {
        self.locals.get(index).copied().unwrap_or_default()
    }

    /// Stores into a local slot, growing the local table up to the
    /// configured slot limit.
    pub fn set_local(&mut self, index: usize, value: Value) -> Result<(), RuntimeError> {
        if index >= self.local_limit {
            return Err(RuntimeError::LocalOutOfRange {
                index,
                limit: self.local_limit,
            });
        }
        if index >= self.locals.len() {
            self.locals.resize(index + 1, Value::Undefined);
        }
        self.locals[index] = value;
        Ok(())
    }

    // --- Operand decoding ---

    fn operand<T>(
        &mut self,
        read: impl FnOnce(&mut Reader<'_>) -> Result<T, DecodeError>,
    ) -> Result<T, RuntimeError> {
        let mut reader = Reader::at(&self.code, self.ip);
        let value = read(&mut reader)
            .map_err(|_| RuntimeError::TruncatedInstruction { offset: self.ip })?;
        self.ip = reader.offset();
        Ok(value)
    }

    pub fn read_u30(&mut self) -> Result<u32, RuntimeError> {
        self.operand(|r| r.read_u30())
    }

    /// One sign-extended byte.
    pub fn read_i8(&mut self) -> Result<i8, RuntimeError> {
        self.operand(|r| r.read_u8().map(|b| b as i8))
    }

    pub fn read_s24(&mut self) -> Result<i32, RuntimeError> {
        self.operand(|r| r.read_s24())
    }

    /// Moves `ip` by `offset` bytes. Landing exactly on the end is allowed
    /// and ends the call.
    pub fn branch(&mut self, offset: i32) -> Result<(), RuntimeError> {
        let target = self.ip as i64 + i64::from(offset);
        if target < 0 || target > self.code.len() as i64 {
            return Err(RuntimeError::InvalidBranch {
                offset: self.ip,
                target,
            });
        }
        self.ip = target as usize;
        Ok(())
    }
}
