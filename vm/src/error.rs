use thiserror::Error;

/// Raised when a decoded program cannot be linked at all.
///
/// Everything short of a missing program degrades to "absent" during
/// linking, so this enum is deliberately small.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("no program to link")]
    InvalidProgram,
}

/// Fatal to the current top-level run. Linked state is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("unsupported opcode 0x{opcode:02X} at offset {offset}")]
    UnsupportedOpcode { opcode: u8, offset: usize },

    #[error("instruction at offset {offset} is missing its operands")]
    TruncatedInstruction { offset: usize },

    #[error("branch at offset {offset} targets {target}, outside the method")]
    InvalidBranch { offset: usize, target: i64 },

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("operand stack exceeded {limit} values")]
    StackOverflow { limit: usize },

    #[error("local {index} is beyond the limit of {limit} slots")]
    LocalOutOfRange { index: usize, limit: usize },

    #[error("call depth exceeded {limit}")]
    CallDepthExceeded { limit: usize },

    #[error("execution interrupted")]
    Interrupted,

    #[error("no program has been loaded")]
    NoProgram,

    #[error("method body {0} does not exist")]
    MethodBodyNotFound(u32),

    #[error("function not found")]
    FunctionNotFound,

    #[error("{0}")]
    Native(String),
}

impl From<String> for RuntimeError {
    fn from(s: String) -> Self {
        RuntimeError::Native(s)
    }
}

impl From<&str> for RuntimeError {
    fn from(s: &str) -> Self {
        RuntimeError::Native(s.to_string())
    }
}
