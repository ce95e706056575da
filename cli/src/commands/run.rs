use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::info;
use vm::{VmConfig, VM};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub method: u32,
    pub swf: bool,
    pub config: Option<PathBuf>,
    pub max_call_depth: Option<usize>,
}

/// Reads VM limits from a TOML file, or the defaults without one.
pub fn load_config(path: Option<&Path>) -> Result<VmConfig> {
    let Some(path) = path else {
        return Ok(VmConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Decodes, links and runs one method body. Returns the printed result.
pub fn run_file(path: &Path, options: &RunOptions) -> Result<String> {
    let program = super::load_program(path, options.swf)?;

    let mut config = load_config(options.config.as_deref())?;
    if let Some(depth) = options.max_call_depth {
        config.max_call_depth = depth;
    }

    let mut vm = VM::with_config(config);
    vm.load_abc(Rc::new(program)).context("failed to link program")?;
    info!(method = options.method, "running");

    let result = vm
        .run_method(options.method)
        .with_context(|| format!("method body {} failed", options.method))?;
    Ok(vm.val_to_string(result))
}
