use memory::Value;

use super::frame::Frame;
use crate::error::RuntimeError;

/// Trait for operand stack operations
pub trait StackOps {
    fn push(&mut self, val: Value) -> Result<(), RuntimeError>;
    fn pop(&mut self) -> Result<Value, RuntimeError>;
    fn peek(&self) -> Result<Value, RuntimeError>;
    /// Pops `count` values, returned in push order.
    fn pop_args(&mut self, count: usize) -> Result<Vec<Value>, RuntimeError>;
}

impl StackOps for Frame {
    #[inline(always)]
    fn push(&mut self, val: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.stack_limit {
            return Err(RuntimeError::StackOverflow {
                limit: self.stack_limit,
            });
        }
        self.stack.push(val);
        Ok(())
    }

    #[inline(always)]
    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    #[inline(always)]
    fn peek(&self) -> Result<Value, RuntimeError> {
        self.stack.last().copied().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop_args(&mut self, count: usize) -> Result<Vec<Value>, RuntimeError> {
        let start = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or(RuntimeError::StackUnderflow)?;
        Ok(self.stack.split_off(start))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::VmConfig;

    fn frame(limit: usize) -> Frame {
        let config = VmConfig {
            operand_stack_limit: limit,
            ..VmConfig::default()
        };
        Frame::new(Rc::from(&[][..]), 4, 0, &config)
    }

    #[test]
    fn pop_args_keeps_push_order() {
        let mut f = frame(8);
        for i in 0..4 {
            f.push(Value::Int(i)).unwrap();
        }
        let args = f.pop_args(3).unwrap();
        assert_eq!(args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(f.stack, vec![Value::Int(0)]);
    }

    #[test]
    fn underflow_and_overflow() {
        let mut f = frame(1);
        assert_eq!(f.pop(), Err(RuntimeError::StackUnderflow));
        f.push(Value::Null).unwrap();
        assert_eq!(
            f.push(Value::Null),
            Err(RuntimeError::StackOverflow { limit: 1 })
        );
        assert_eq!(f.pop_args(2), Err(RuntimeError::StackUnderflow));
        assert_eq!(f.stack.len(), 1);
    }
}
