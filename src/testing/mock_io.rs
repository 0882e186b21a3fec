//! Temporary files for exercising the file-level helpers.

use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};

use crate::io::files::{read_text, write_text};

/// A temporary file, deleted on drop.
pub struct TempFilePath {
    _file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn new() -> std::io::Result<Self> {
        Self::from_file(NamedTempFile::new()?)
    }

    /// A temporary file named `*.{extension}`; `"csv.gz"` yields a gzip target.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn with_extension(extension: &str) -> std::io::Result<Self> {
        Self::from_file(
            tempfile::Builder::new()
                .suffix(&format!(".{extension}"))
                .tempfile()?,
        )
    }

    fn from_file(file: NamedTempFile) -> std::io::Result<Self> {
        let path = file.path().to_path_buf();
        Ok(Self { _file: file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temporary directory, deleted recursively on drop.
pub struct TempDirPath {
    dir: TempDir,
}

impl TempDirPath {
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self { dir: TempDir::new()? })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A path inside this directory; nothing is created.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Write `contents` to a fresh temporary file with the given extension.
///
/// The extension picks compression the same way the marshaller does, so
/// `mock_flat_file(text, "csv.gz")` produces a gzip file.
///
/// ```
/// use ironflat::testing::{mock_flat_file, read_flat_output, SAMPLE_TRADES_PIPE};
///
/// let file = mock_flat_file(SAMPLE_TRADES_PIPE, "psv").unwrap();
/// assert_eq!(read_flat_output(file.path()).unwrap(), SAMPLE_TRADES_PIPE);
/// ```
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn mock_flat_file(contents: &str, extension: &str) -> anyhow::Result<TempFilePath> {
    let temp = TempFilePath::with_extension(extension)?;
    write_text(temp.path(), contents)?;
    Ok(temp)
}

/// Read a written file back as text, decompressing when needed.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_flat_output(path: impl AsRef<Path>) -> anyhow::Result<String> {
    read_text(path)
}
