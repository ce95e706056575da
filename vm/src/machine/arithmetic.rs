use memory::Value;

use super::frame::Frame;
use super::stack::StackOps;
use crate::error::RuntimeError;
use crate::opcode::OpCode;

/// Trait for arithmetic and comparison instruction handlers
pub trait ArithmeticOps {
    fn handle_arithmetic(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError>;

    /// Numeric coercion: numbers pass through, booleans are 0/1, strings
    /// read their leading decimal prefix, everything else is 0.
    fn to_number(&self, val: Value) -> f64;

    fn is_truthy(&self, val: Value) -> bool;

    fn values_equal(&self, a: Value, b: Value) -> bool;
}

impl ArithmeticOps for super::vm::VM {
    fn handle_arithmetic(&mut self, op: OpCode, frame: &mut Frame) -> Result<(), RuntimeError> {
        let result = match op {
            OpCode::Negate | OpCode::Increment | OpCode::Decrement | OpCode::Not => {
                let a = frame.pop()?;
                match op {
                    OpCode::Negate => Value::Number(-self.to_number(a)),
                    OpCode::Increment => Value::Number(self.to_number(a) + 1.0),
                    OpCode::Decrement => Value::Number(self.to_number(a) - 1.0),
                    _ => Value::Bool(!self.is_truthy(a)),
                }
            }

            OpCode::Equals => {
                let b = frame.pop()?;
                let a = frame.pop()?;
                Value::Bool(self.values_equal(a, b))
            }

            _ => {
                let b = frame.pop()?;
                let a = frame.pop()?;
                let (x, y) = (self.to_number(a), self.to_number(b));
                match op {
                    OpCode::Add => Value::Number(x + y),
                    OpCode::Subtract => Value::Number(x - y),
                    OpCode::Multiply => Value::Number(x * y),
                    OpCode::Divide => Value::Number(x / y),
                    OpCode::Modulo => Value::Number(x % y),
                    OpCode::LessThan => Value::Bool(x < y),
                    OpCode::LessEquals => Value::Bool(x <= y),
                    OpCode::GreaterThan => Value::Bool(x > y),
                    OpCode::GreaterEquals => Value::Bool(x >= y),
                    _ => unreachable!("{op} is not an arithmetic opcode"),
                }
            }
        };
        frame.push(result)
    }

    fn to_number(&self, val: Value) -> f64 {
        match val {
            Value::Int(i) => f64::from(i),
            Value::Uint(u) => f64::from(u),
            Value::Number(n) => n,
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::String(s) => self.heap.get_string(s).map_or(0.0, parse_numeric_prefix),
            _ => 0.0,
        }
    }

    fn is_truthy(&self, val: Value) -> bool {
        match val {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
            Value::Uint(u) => u != 0,
            Value::Number(n) => n != 0.0 && !n.is_nan(),
            Value::String(s) => self.heap.get_string(s).is_some_and(|s| !s.is_empty()),
            Value::Object(_) | Value::Class(_) | Value::Function(_) | Value::Namespace(_) => true,
        }
    }

    fn values_equal(&self, a: Value, b: Value) -> bool {
        match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => match (a, b) {
                (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
                _ => a == b,
            },
        }
    }
}

/// Parses the longest leading decimal number in `s`, after leading
/// whitespace: optional sign, digits, fraction, exponent. No digits is 0.
pub fn parse_numeric_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits(end + 1);
        mantissa_digits += frac_end - end - 1;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}
