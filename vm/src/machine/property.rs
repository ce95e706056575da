use memory::{Class, Object, PropertySlot, Value};
use tracing::debug;

use super::arithmetic::ArithmeticOps;
use super::frame::Frame;
use super::stack::StackOps;
use crate::error::RuntimeError;
use crate::opcode::OpCode;

/// Trait for object, scope and enumeration instruction handlers
pub trait PropertyOps {
    fn handle_property(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError>;
}

impl PropertyOps for super::vm::VM {
    fn handle_property(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError> {
        match op {
            OpCode::GetProperty => {
                let name = self.pool_string(frame.read_u30()?);
                let result = match frame.pop()? {
                    Value::Object(obj) => self.heap.get_property(obj, &name).unwrap_or_default(),
                    Value::Class(class) => self
                        .heap
                        .class_trait(class, &name, None)
                        .map_or(Value::Undefined, |t| t.bound_value()),
                    _ => Value::Undefined,
                };
                frame.push(result)?;
            }

            OpCode::SetProperty | OpCode::InitProperty => {
                let name = self.pool_string(frame.read_u30()?);
                let value = frame.pop()?;
                let stored = match frame.pop()? {
                    Value::Object(obj) => self.heap.set_property(obj, &name, value),
                    _ => false,
                };
                frame.push(if stored { value } else { Value::Undefined })?;
            }

            OpCode::NewClass => {
                let name = self.pool_string(frame.read_u30()?);
                let class = match self.class_named(&name) {
                    Some(class) => class,
                    None => {
                        debug!(name = %name, "newclass: allocating unlinked class");
                        self.heap.alloc_class(Class::new(name))
                    }
                };
                frame.push(Value::Class(class))?;
            }

            OpCode::NewObject => {
                let argc = frame.read_u30()? as usize;
                let pairs = frame.pop_args(argc * 2)?;
                let mut obj = Object::new();
                for pair in pairs.chunks_exact(2) {
                    let key = self.val_to_string(pair[0]);
                    obj.properties.insert(key, PropertySlot::Value(pair[1]));
                }
                let obj = self.heap.alloc_object(obj);
                frame.push(Value::Object(obj))?;
            }

            OpCode::NewFunction => {
                let index = frame.read_u30()?;
                let result = self
                    .functions
                    .get(index as usize)
                    .map_or(Value::Undefined, |&f| Value::Function(f));
                frame.push(result)?;
            }

            OpCode::HasNext | OpCode::HasNext2 => {
                let index = frame.pop()?;
                let target = frame.pop()?;
                let index = self.to_number(index).max(0.0) as usize;

                let key = target
                    .as_object()
                    .and_then(|obj| self.heap.get_object(obj))
                    .and_then(|o| o.key_at(index))
                    .map(str::to_owned);
                match key {
                    Some(key) => {
                        let key = self.heap.string_value(&key);
                        frame.push(Value::Bool(true))?;
                        frame.push(key)?;
                        frame.push(Value::Int(index as i32 + 1))?;
                    }
                    None => frame.push(Value::Bool(false))?,
                }
            }

            OpCode::PushScope => {
                let scope = frame.pop()?;
                frame.scope.push(scope);
            }

            // Scope chains are not modelled; lookups never consult `frame.scope`.
            OpCode::PopScope => {}

            _ => unreachable!("{op} is not a property opcode"),
        }

        Ok(())
    }
}
