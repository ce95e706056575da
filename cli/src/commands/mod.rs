pub mod disassemble;
pub mod inspect;
pub mod run;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use abc::AbcFile;
use anyhow::{Context, Result};
use tracing::warn;

use crate::container;

/// Reads and decodes a program, unwrapping it from a SWF first if asked.
pub fn load_program(path: &Path, swf: bool) -> Result<AbcFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let payload = if swf {
        let mut payloads = container::extract_abc(&bytes)
            .with_context(|| format!("failed to extract ABC from {}", path.display()))?;
        if payloads.len() > 1 {
            warn!(count = payloads.len(), "SWF has several ABC blocks; using the first");
        }
        Cow::Owned(payloads.swap_remove(0))
    } else {
        Cow::Borrowed(&bytes[..])
    };

    abc::decode(&payload).with_context(|| format!("failed to decode {}", path.display()))
}
