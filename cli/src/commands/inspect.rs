use std::fmt::Write as _;
use std::path::Path;
use std::rc::Rc;

use abc::AbcFile;
use anyhow::{Context, Result};
use vm::VM;

/// Summarises a program, or dumps it whole as JSON.
pub fn inspect_file(path: &Path, json: bool, swf: bool) -> Result<String> {
    let program = super::load_program(path, swf)?;
    if json {
        return serde_json::to_string_pretty(&program).context("failed to serialise program");
    }
    summary(program)
}

fn summary(program: AbcFile) -> Result<String> {
    let mut out = String::new();
    let pool = &program.constant_pool;
    let entries = |n: usize| n.saturating_sub(1);

    writeln!(out, "version        {}.{}", program.major_version, program.minor_version)?;
    writeln!(out, "strings        {}", entries(pool.strings.len()))?;
    writeln!(out, "ints           {}", entries(pool.ints.len()))?;
    writeln!(out, "uints          {}", entries(pool.uints.len()))?;
    writeln!(out, "doubles        {}", entries(pool.doubles.len()))?;
    writeln!(out, "namespaces     {}", entries(pool.namespaces.len()))?;
    writeln!(out, "ns sets        {}", entries(pool.ns_sets.len()))?;
    writeln!(out, "multinames     {}", entries(pool.multinames.len()))?;
    writeln!(out, "methods        {}", program.methods.len())?;
    writeln!(out, "metadata       {}", program.metadata.len())?;
    writeln!(out, "classes        {}", program.instances.len())?;
    writeln!(out, "scripts        {}", program.scripts.len())?;
    writeln!(out, "method bodies  {}", program.method_bodies.len())?;

    let round_trip = abc::decode(&abc::encode(&program)).is_ok_and(|p| p == program);
    writeln!(out, "round trip     {}", if round_trip { "ok" } else { "MISMATCH" })?;

    let mut vm = VM::new();
    vm.load_abc(Rc::new(program)).context("failed to link program")?;

    writeln!(out, "\nclasses:")?;
    for &class in &vm.classes {
        let Some(c) = vm.heap.get_class(class) else {
            continue;
        };
        let parent = c
            .super_class
            .and_then(|s| vm.heap.get_class(s))
            .map_or(String::new(), |s| format!(" extends {}", s.name));
        writeln!(out, "  {}{parent} ({} traits)", c.name, c.traits.len())?;
    }

    writeln!(out, "\nglobals:")?;
    for (name, value) in vm.globals.iter() {
        writeln!(out, "  {name} = {}", vm.val_to_string(value))?;
    }
    Ok(out)
}
