use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use abc::AbcFile;
use memory::{ClassRef, FunctionKind, FunctionRef, Heap, NamespaceRef, ObjectRef, Value};
use tracing::trace;

use crate::config::VmConfig;
use crate::error::RuntimeError;
use crate::globals::Globals;
use crate::native::NativeObj;
use crate::opcode::OpCode;

use super::arithmetic::ArithmeticOps;
use super::control::ControlFlowOps;
use super::frame::Frame;
use super::globals::GlobalOps;
use super::native::NativeRegistry;
use super::property::PropertyOps;
use super::stack::StackOps;

/// The Virtual Machine struct
pub struct VM {
    pub heap: Heap,
    /// Operand stack of the top-level run, kept after it ends.
    pub stack: Vec<Value>,
    pub globals: Globals,
    pub natives: Vec<NativeObj>,
    pub config: VmConfig,

    /// The linked program, if any.
    pub program: Option<Rc<AbcFile>>,
    /// One class per instance descriptor, in program order.
    pub classes: Vec<ClassRef>,
    /// One function per method body, in program order.
    pub functions: Vec<FunctionRef>,
    /// One runtime namespace per constant-pool namespace entry.
    pub namespaces: Vec<NamespaceRef>,

    /// First class registered under each name.
    pub(crate) class_by_name: HashMap<String, ClassRef>,
    /// First function whose body belongs to each method signature.
    pub(crate) function_by_method: HashMap<u32, FunctionRef>,

    depth: usize,
    interrupt: Arc<AtomicBool>,
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl VM {
    /// Create a new VM with the standard natives bound
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        let mut vm = Self {
            heap: Heap::new(),
            stack: Vec::new(),
            globals: Globals::new(),
            natives: Vec::new(),
            config,
            program: None,
            classes: Vec::new(),
            functions: Vec::new(),
            namespaces: Vec::new(),
            class_by_name: HashMap::new(),
            function_by_method: HashMap::new(),
            depth: 0,
            interrupt: Arc::new(AtomicBool::new(false)),
        };

        vm.bootstrap_natives();

        vm
    }

    /// Flag checked before every instruction. Setting it fails the current
    /// run with [`RuntimeError::Interrupted`]; clear it before the next run.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Current nesting depth of calls below the top-level run.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// First linked class with this name.
    pub fn class_named(&self, name: &str) -> Option<ClassRef> {
        self.class_by_name.get(name).copied()
    }

    /// Function linked for a method signature index.
    pub fn function_for_method(&self, method: u32) -> Option<FunctionRef> {
        self.function_by_method.get(&method).copied()
    }

    /// Renders a value for display.
    pub fn val_to_string(&self, val: Value) -> String {
        self.heap.display(val)
    }

    /// Runs method body `index` of the linked program as the top-level run.
    pub fn run_method(&mut self, index: u32) -> Result<Value, RuntimeError> {
        let program = self.program.as_ref().ok_or(RuntimeError::NoProgram)?;
        let body = program
            .method_bodies
            .get(index as usize)
            .ok_or(RuntimeError::MethodBodyNotFound(index))?;
        let local_count = body.local_count;
        let code: Rc<[u8]> = Rc::from(body.code.as_slice());
        self.run_root(code, local_count)
    }

    /// Runs a bare instruction sequence as the top-level run.
    pub fn run_code(&mut self, code: &[u8]) -> Result<Value, RuntimeError> {
        self.run_root(Rc::from(code), 0)
    }

    fn run_root(&mut self, code: Rc<[u8]>, local_count: u32) -> Result<Value, RuntimeError> {
        let mut stack = std::mem::take(&mut self.stack);
        stack.clear();
        let mut frame = Frame::with_stack(code, stack, local_count, &self.config);
        // A native may start a run from inside a call; the outer depth
        // must survive it.
        let outer_depth = std::mem::replace(&mut self.depth, 0);
        let result = self.interpret(&mut frame);
        self.depth = outer_depth;
        self.stack = std::mem::take(&mut frame.stack);
        result
    }

    /// Invokes a function with a fresh frame.
    pub fn call_function(
        &mut self,
        function: FunctionRef,
        this: Option<ObjectRef>,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let func = self
            .heap
            .get_function(function)
            .ok_or(RuntimeError::FunctionNotFound)?;
        trace!(name = %func.name, argc = args.len(), depth = self.depth, "call");

        match &func.kind {
            FunctionKind::Native(id) => {
                let native = self
                    .natives
                    .get(id.0 as usize)
                    .ok_or(RuntimeError::FunctionNotFound)?
                    .func;
                native(self, this, args)
            }
            FunctionKind::Bytecode(body) => {
                let limit = self.config.max_call_depth;
                if self.depth >= limit {
                    return Err(RuntimeError::CallDepthExceeded { limit });
                }
                let mut frame = Frame::new(
                    Rc::clone(&body.code),
                    body.max_stack,
                    body.local_count,
                    &self.config,
                );
                frame.bind_args(args);
                frame.this = this;

                self.depth += 1;
                let result = self.interpret(&mut frame);
                self.depth -= 1;
                result
            }
        }
    }

    /// Main interpretation loop. Runs `frame` until `returnvalue` or until
    /// its code is exhausted, which yields `Undefined`.
    pub(crate) fn interpret(&mut self, frame: &mut Frame) -> Result<Value, RuntimeError> {
        loop {
            if self.interrupt.load(Ordering::Relaxed) {
                return Err(RuntimeError::Interrupted);
            }

            let offset = frame.ip;
            let Some(&byte) = frame.code.get(offset) else {
                return Ok(Value::Undefined);
            };
            frame.ip += 1;

            let op = OpCode::from_u8(byte).ok_or(RuntimeError::UnsupportedOpcode {
                opcode: byte,
                offset,
            })?;
            trace!(offset, op = op.name(), "dispatch");

            use crate::opcode::OpCode::*;

            match op {
                Nop | Label => {}

                // Literals
                PushNull => frame.push(Value::Null)?,
                PushUndefined => frame.push(Value::Undefined)?,
                PushTrue => frame.push(Value::Bool(true))?,
                PushFalse => frame.push(Value::Bool(false))?,
                PushNaN => frame.push(Value::Number(f64::NAN))?,
                PushByte => {
                    let b = frame.read_i8()?;
                    frame.push(Value::Int(i32::from(b)))?;
                }
                PushShort => {
                    let v = frame.read_u30()? as u16 as i16;
                    frame.push(Value::Int(i32::from(v)))?;
                }
                PushString | PushInt | PushUint | PushDouble => {
                    let index = frame.read_u30()?;
                    let val = self.pool_constant(op, index);
                    frame.push(val)?;
                }

                // Stack
                Pop => {
                    frame.pop()?;
                }
                Swap => {
                    let b = frame.pop()?;
                    let a = frame.pop()?;
                    frame.push(b)?;
                    frame.push(a)?;
                }

                // Arithmetic & comparison (delegated to arithmetic.rs)
                Add | Subtract | Multiply | Divide | Modulo | Negate | Increment | Decrement
                | Not | Equals | LessThan | LessEquals | GreaterThan | GreaterEquals => {
                    self.handle_arithmetic(op, frame)?;
                }

                // Branches & calls (delegated to control.rs)
                Jump | IfTrue | IfFalse | CallProp | CallPropVoid | Construct
                | ConstructProp | ConstructSuper => {
                    self.handle_control(op, frame)?;
                }

                // Objects, scope, enumeration (delegated to property.rs)
                GetProperty | SetProperty | InitProperty | NewClass | NewObject
                | NewFunction | HasNext | HasNext2 | PushScope | PopScope => {
                    self.handle_property(op, frame)?;
                }

                // Globals (delegated to globals.rs)
                GetLex => {
                    self.handle_globals(op, frame)?;
                }

                // Locals
                GetLocal0 | GetLocal1 | GetLocal2 | GetLocal3 => {
                    let index = (op.as_u8() - GetLocal0.as_u8()) as usize;
                    frame.push(frame.local(index))?;
                }
                SetLocal0 | SetLocal1 | SetLocal2 | SetLocal3 => {
                    let index = (op.as_u8() - SetLocal0.as_u8()) as usize;
                    let val = frame.pop()?;
                    frame.set_local(index, val)?;
                }
                SetLocal => {
                    let index = frame.read_u30()? as usize;
                    let val = frame.pop()?;
                    frame.set_local(index, val)?;
                }

                ReturnValue => {
                    return Ok(frame.stack.pop().unwrap_or_default());
                }
            }
        }
    }

    /// Resolves a string-pool index to an interned string. Index 0 and
    /// out-of-range indices read as the empty string.
    pub fn pool_string(&self, index: u32) -> String {
        self.program
            .as_ref()
            .and_then(|p| p.constant_pool.string(index))
            .unwrap_or_default()
            .to_owned()
    }

    fn pool_constant(&mut self, op: OpCode, index: u32) -> Value {
        let Some(program) = self.program.as_ref() else {
            return match op {
                OpCode::PushString => self.heap.string_value(""),
                _ => Value::Undefined,
            };
        };
        let pool = &program.constant_pool;
        match op {
            OpCode::PushInt => pool.int(index).map_or(Value::Undefined, Value::Int),
            OpCode::PushUint => pool.uint(index).map_or(Value::Undefined, Value::Uint),
            OpCode::PushDouble => pool.double(index).map_or(Value::Undefined, Value::Number),
            _ => {
                let s = self.pool_string(index);
                self.heap.string_value(&s)
            }
        }
    }
}
