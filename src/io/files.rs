//! Whole-file text access for the codecs.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Read};
use std::path::Path;

use anyhow::{Context, Result};

use super::compression::{decompressing_reader, write_compressed};

/// Read a file fully into memory, decompressing it when needed.
///
/// # Errors
/// Fails when the file cannot be opened or is not valid UTF-8.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = decompressing_reader(file, path)?;
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(text)
}

/// Write `text` to `path`, creating parent directories and compressing by
/// extension.
pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_compressed(BufWriter::new(file), text.as_bytes(), path)
}
