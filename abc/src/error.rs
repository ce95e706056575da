use thiserror::Error;

/// Errors raised while decoding an ABC byte stream.
///
/// Cursor-level failures (`UnexpectedEndOfInput`, `MalformedVarint`) come
/// straight from the [`Reader`](crate::Reader). The program decoder wraps
/// every failure in [`DecodeError::Field`] so the caller sees which field
/// was being read and where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended in the middle of a field.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEndOfInput { offset: usize },

    /// A variable-length integer did not terminate within five bytes.
    #[error("malformed variable-length integer at offset {offset}")]
    MalformedVarint { offset: usize },

    /// A multiname entry carried a kind byte this decoder does not know.
    #[error("invalid multiname kind 0x{kind:02X} at offset {offset}")]
    InvalidMultinameKind { kind: u8, offset: usize },

    /// A trait carried a kind nibble outside 0..=6.
    #[error("invalid trait kind {kind} at offset {offset}")]
    InvalidTraitKind { kind: u8, offset: usize },

    /// A failure while decoding a named field of the program.
    #[error("failed to decode `{field}` at offset {offset}: {source}")]
    Field {
        field: String,
        offset: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// The innermost error, with all field context stripped.
    pub fn root_cause(&self) -> &DecodeError {
        let mut err = self;
        while let DecodeError::Field { source, .. } = err {
            err = source;
        }
        err
    }

    /// The dotted path of the outermost field, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            DecodeError::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}
