use serde::Deserialize;

/// Each nested call costs several native stack frames; 128 levels fit a
/// default 2 MiB thread stack in unoptimised builds.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;
pub const DEFAULT_OPERAND_STACK_LIMIT: usize = 65_536;
pub const DEFAULT_MAX_LOCALS: usize = 65_536;

/// Execution limits. Every field is optional in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
    /// Nested calls allowed below the top-level run.
    pub max_call_depth: usize,
    /// Values a single frame's operand stack may hold.
    pub operand_stack_limit: usize,
    /// Local slots a single frame may address.
    pub max_locals: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            operand_stack_limit: DEFAULT_OPERAND_STACK_LIMIT,
            max_locals: DEFAULT_MAX_LOCALS,
        }
    }
}
