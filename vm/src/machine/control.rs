use memory::{ClassRef, ObjectRef, PropertySlot, TraitBinding, Value};
use tracing::debug;

use super::arithmetic::ArithmeticOps;
use super::frame::Frame;
use super::stack::StackOps;
use crate::error::RuntimeError;
use crate::opcode::OpCode;

/// Trait for control flow instruction handlers
pub trait ControlFlowOps {
    fn handle_control(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError>;

    /// Invokes property `name` of `receiver`, or reads it when it is data.
    fn call_property(
        &mut self,
        receiver: Value,
        name: &str,
        args: &[Value],
    ) -> Result<Value, RuntimeError>;

    /// Allocates an instance of `class` and runs its constructor on it.
    fn construct(&mut self, class: ClassRef, args: &[Value]) -> Result<Value, RuntimeError>;
}

impl ControlFlowOps for super::vm::VM {
    fn handle_control(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError> {
        match op {
            OpCode::Jump => {
                let offset = frame.read_s24()?;
                frame.branch(offset)?;
            }

            OpCode::IfTrue | OpCode::IfFalse => {
                let offset = frame.read_s24()?;
                let cond = self.is_truthy(frame.pop()?);
                if cond == (op == OpCode::IfTrue) {
                    frame.branch(offset)?;
                }
            }

            OpCode::CallProp | OpCode::CallPropVoid => {
                let name = self.pool_string(frame.read_u30()?);
                let argc = frame.read_u30()? as usize;
                let args = frame.pop_args(argc)?;
                let receiver = frame.pop()?;

                let result = self.call_property(receiver, &name, &args)?;
                if op == OpCode::CallProp {
                    frame.push(result)?;
                }
            }

            OpCode::Construct => {
                let argc = frame.read_u30()? as usize;
                let args = frame.pop_args(argc)?;
                let result = match frame.pop()? {
                    Value::Class(class) => self.construct(class, &args)?,
                    _ => Value::Undefined,
                };
                frame.push(result)?;
            }

            OpCode::ConstructProp => {
                let result = match frame.pop()? {
                    Value::Class(class) => self.construct(class, &[])?,
                    _ => Value::Undefined,
                };
                frame.push(result)?;
            }

            OpCode::ConstructSuper => {
                let argc = frame.read_u30()? as usize;
                let args = frame.pop_args(argc)?;
                // Locals hold arguments, not the receiver, so a non-object
                // operand falls back to the running constructor's `this`.
                let receiver = frame.pop()?;
                if let Some(obj) = receiver.as_object().or(frame.this) {
                    self.construct_super(obj, &args)?;
                }
            }

            _ => unreachable!("{op} is not a control opcode"),
        }

        Ok(())
    }

    fn call_property(
        &mut self,
        receiver: Value,
        name: &str,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::Object(obj) => {
                let slot = self.heap.resolve_trait(obj, name, None).cloned();
                match slot {
                    Some(PropertySlot::Trait(t)) => match t.binding {
                        TraitBinding::Function(f) => self.call_function(f, Some(obj), args),
                        _ => Ok(self.heap.get_property(obj, name).unwrap_or_default()),
                    },
                    Some(PropertySlot::Value(v)) => Ok(v),
                    None => {
                        debug!(name, "callprop: no such property");
                        Ok(Value::Undefined)
                    }
                }
            }

            Value::Class(class) => {
                let binding = self.heap.class_trait(class, name, None).map(|t| t.binding);
                match binding {
                    Some(TraitBinding::Function(f)) => self.call_function(f, None, args),
                    Some(TraitBinding::Class(c)) => Ok(Value::Class(c)),
                    Some(TraitBinding::Slot(_)) | None => Ok(Value::Undefined),
                }
            }

            Value::Function(f) if name == "call" => self.call_function(f, None, args),

            _ => Ok(Value::Undefined),
        }
    }

    fn construct(&mut self, class: ClassRef, args: &[Value]) -> Result<Value, RuntimeError> {
        let obj = self.heap.new_instance(class);
        let constructor = self.heap.get_class(class).and_then(|c| c.constructor);
        if let Some(ctor) = constructor {
            self.call_function(ctor, Some(obj), args)?;
        }
        Ok(Value::Object(obj))
    }
}

impl super::vm::VM {
    /// Runs the superclass constructor of `obj`'s class on `obj`.
    fn construct_super(&mut self, obj: ObjectRef, args: &[Value]) -> Result<(), RuntimeError> {
        let constructor = self
            .heap
            .get_object(obj)
            .and_then(|o| o.class)
            .and_then(|c| self.heap.get_class(c))
            .and_then(|c| c.super_class)
            .and_then(|s| self.heap.get_class(s))
            .and_then(|s| s.constructor);
        if let Some(ctor) = constructor {
            self.call_function(ctor, Some(obj), args)?;
        }
        Ok(())
    }
}
