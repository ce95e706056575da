use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

/// Lists every method body's instructions, with pool references resolved.
pub fn disassemble_file(path: &Path, swf: bool) -> Result<String> {
    let program = super::load_program(path, swf)?;
    let pool = &program.constant_pool;

    let mut out = String::new();
    for (i, body) in program.method_bodies.iter().enumerate() {
        let name = program
            .methods
            .get(body.method as usize)
            .and_then(|m| pool.string(m.name))
            .filter(|s| !s.is_empty())
            .unwrap_or("<anonymous>");
        writeln!(
            out,
            "== body {i}: method {} {name} (max_stack {}, locals {}) ==",
            body.method, body.max_stack, body.local_count
        )?;
        out.push_str(&vm::disasm::disassemble(&body.code, Some(pool)));
        out.push('\n');
    }
    Ok(out)
}
