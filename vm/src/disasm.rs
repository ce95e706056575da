//! Static decoding of method bodies into readable instruction listings.

use abc::{ConstantPool, Reader};
use memory::format_number;

use crate::opcode::{OpCode, Operand};

/// One decoded position in a code sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Op {
        offset: usize,
        op: OpCode,
        operands: Vec<i32>,
    },
    /// A byte with no known opcode. Decoding resumes at the next byte.
    Unknown { offset: usize, byte: u8 },
    /// Operands ran past the end of the code. Always the last entry.
    Truncated { offset: usize, op: OpCode },
}

/// Decodes `code` front to back.
pub fn decode(code: &[u8]) -> Vec<Instruction> {
    let mut out = Vec::new();
    let mut reader = Reader::new(code);

    while let Ok(byte) = reader.read_u8() {
        let offset = reader.offset() - 1;
        let Some(op) = OpCode::from_u8(byte) else {
            out.push(Instruction::Unknown { offset, byte });
            continue;
        };

        let mut operands = Vec::with_capacity(op.operands().len());
        for kind in op.operands() {
            let value = match kind {
                Operand::Byte => reader.read_u8().map(|b| i32::from(b as i8)),
                Operand::U30 => reader.read_u30().map(|v| v as i32),
                Operand::S24 => reader.read_s24(),
            };
            match value {
                Ok(v) => operands.push(v),
                Err(_) => {
                    out.push(Instruction::Truncated { offset, op });
                    return out;
                }
            }
        }
        out.push(Instruction::Op {
            offset,
            op,
            operands,
        });
    }
    out
}

/// Renders `code` one instruction per line, resolving pool references
/// when a pool is given.
pub fn disassemble(code: &[u8], pool: Option<&ConstantPool>) -> String {
    let mut text = String::new();
    let instructions = decode(code);
    for (i, inst) in instructions.iter().enumerate() {
        let end = instructions
            .get(i + 1)
            .map_or(code.len(), Instruction::offset);
        text.push_str(&render(inst, end, pool));
        text.push('\n');
    }
    text
}

impl Instruction {
    pub fn offset(&self) -> usize {
        match self {
            Instruction::Op { offset, .. }
            | Instruction::Unknown { offset, .. }
            | Instruction::Truncated { offset, .. } => *offset,
        }
    }
}

fn render(inst: &Instruction, end: usize, pool: Option<&ConstantPool>) -> String {
    match inst {
        Instruction::Unknown { offset, byte } => format!("{offset:04}  .byte 0x{byte:02X}"),
        Instruction::Truncated { offset, op } => format!("{offset:04}  {op} <truncated>"),
        Instruction::Op {
            offset,
            op,
            operands,
        } => {
            let mut line = format!("{offset:04}  {:<16}", op.name());
            let args: Vec<String> = operands.iter().map(i32::to_string).collect();
            line.push_str(&args.join(", "));
            if let Some(note) = annotate(*op, operands, end, pool) {
                line.push_str("    ; ");
                line.push_str(&note);
            }
            line.trim_end().to_string()
        }
    }
}

fn annotate(op: OpCode, operands: &[i32], end: usize, pool: Option<&ConstantPool>) -> Option<String> {
    let first = *operands.first()?;
    match op {
        OpCode::Jump | OpCode::IfTrue | OpCode::IfFalse => {
            Some(format!("-> {}", end as i64 + i64::from(first)))
        }
        OpCode::PushString
        | OpCode::GetProperty
        | OpCode::SetProperty
        | OpCode::InitProperty
        | OpCode::NewClass
        | OpCode::GetLex
        | OpCode::CallProp
        | OpCode::CallPropVoid => {
            let s = pool?.string(first as u32)?;
            Some(format!("{s:?}"))
        }
        OpCode::PushInt => pool?.int(first as u32).map(|v| v.to_string()),
        OpCode::PushUint => pool?.uint(first as u32).map(|v| v.to_string()),
        OpCode::PushDouble => pool?.double(first as u32).map(format_number),
        _ => None,
    }
}
