//! Flat-file codecs and the file collaborators that feed them.
//!
//! - [`delimited`]: CSV-like files with auto-detected delimiters
//! - [`fixed_width`]: fixed character-offset lines with implied decimals
//! - [`files`]: whole-file read and buffered write, with transparent compression
//! - [`compression`]: pluggable compression codecs used by [`files`]

pub mod compression;
pub mod delimited;
pub mod files;
pub mod fixed_width;

pub use delimited::{ColumnMapping, DelimitedCodec, DelimitedOptions, RawRow};
pub use fixed_width::{FixedWidthCodec, FixedWidthOptions, StartBase};
