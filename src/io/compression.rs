//! Transparent compression for flat files.
//!
//! A compressed export such as `trades.csv.gz` is decompressed on read and a
//! target path ending in a known extension is compressed on write, so the
//! codecs only ever see plain text.
//!
//! Detection checks the file extension first and falls back to the stream's
//! magic bytes on read. Built-in codecs are enabled by feature flags:
//! - **gzip** (`.gz`), feature `compression-gzip`
//! - **zstd** (`.zst`), feature `compression-zstd`
//! - **bzip2** (`.bz2`), feature `compression-bzip2`
//! - **xz** (`.xz`), feature `compression-xz`
//!
//! Extra codecs can be added at runtime with [`register_codec`].
//!
//! ```
//! use ironflat::io::compression::{codec_for_path, registered_codecs};
//!
//! let names = registered_codecs();
//! if names.contains(&"gzip") {
//!     assert_eq!(codec_for_path("TRADES.CSV.GZ").map(|c| c.name()), Some("gzip"));
//! }
//! assert!(codec_for_path("trades.csv").is_none());
//! ```

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use anyhow::{Context, Result};
use tracing::debug;

/// A compression format usable for whole flat files.
pub trait CompressionCodec: Send + Sync {
    /// Short name, e.g. `"gzip"`.
    fn name(&self) -> &'static str;

    /// Lowercase extensions including the dot, e.g. `&[".gz"]`.
    fn extensions(&self) -> &'static [&'static str];

    /// Leading signature of a compressed stream, if the format has one.
    fn magic(&self) -> Option<&'static [u8]>;

    /// Wrap `input` so reads yield decompressed bytes.
    fn decoder(&self, input: Box<dyn Read>) -> io::Result<Box<dyn Read>>;

    /// Compress all of `data` into `output` and finish the stream.
    fn encode(&self, data: &[u8], output: &mut dyn Write) -> io::Result<()>;
}

static CODECS: LazyLock<RwLock<Vec<Arc<dyn CompressionCodec>>>> =
    LazyLock::new(|| RwLock::new(builtin_codecs()));

fn builtin_codecs() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(Gzip),
        #[cfg(feature = "compression-zstd")]
        Arc::new(Zstd),
        #[cfg(feature = "compression-bzip2")]
        Arc::new(Bzip2),
        #[cfg(feature = "compression-xz")]
        Arc::new(Xz),
    ]
}

fn codecs() -> Vec<Arc<dyn CompressionCodec>> {
    CODECS.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Add a codec process-wide. Later registrations are consulted after built-ins.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    CODECS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(codec);
}

/// Names of every registered codec, built-ins first.
pub fn registered_codecs() -> Vec<&'static str> {
    codecs().iter().map(|c| c.name()).collect()
}

/// The codec whose extension ends `path` (case-insensitive).
pub fn codec_for_path(path: impl AsRef<Path>) -> Option<Arc<dyn CompressionCodec>> {
    let lower = path.as_ref().to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|c| c.extensions().iter().any(|ext| lower.ends_with(ext)))
}

/// The codec whose magic bytes start `head`.
pub fn codec_for_magic(head: &[u8]) -> Option<Arc<dyn CompressionCodec>> {
    codecs()
        .into_iter()
        .find(|c| c.magic().is_some_and(|m| head.starts_with(m)))
}

/// Wrap `reader` with a decoder chosen from `path_hint`, or from the first
/// bytes of the stream when the extension is not recognised.
pub fn decompressing_reader<R: Read + 'static>(reader: R, path_hint: impl AsRef<Path>) -> Result<Box<dyn Read>> {
    let path = path_hint.as_ref();
    let mut buffered = BufReader::new(reader);
    let codec = match codec_for_path(path) {
        Some(codec) => Some(codec),
        None => {
            let head = buffered
                .fill_buf()
                .with_context(|| format!("peek {}", path.display()))?;
            codec_for_magic(head)
        }
    };
    match codec {
        Some(codec) => {
            debug!(codec = codec.name(), path = %path.display(), "decompressing input");
            codec
                .decoder(Box::new(buffered))
                .with_context(|| format!("open {} decoder for {}", codec.name(), path.display()))
        }
        None => Ok(Box::new(buffered)),
    }
}

/// Write `data` to `writer`, compressed when `path_hint` has a codec extension.
pub fn write_compressed<W: Write>(mut writer: W, data: &[u8], path_hint: impl AsRef<Path>) -> Result<()> {
    let path = path_hint.as_ref();
    match codec_for_path(path) {
        Some(codec) => {
            debug!(codec = codec.name(), path = %path.display(), bytes = data.len(), "compressing output");
            codec
                .encode(data, &mut writer)
                .with_context(|| format!("{} encode {}", codec.name(), path.display()))?;
        }
        None => writer
            .write_all(data)
            .with_context(|| format!("write {}", path.display()))?,
    }
    writer.flush().with_context(|| format!("flush {}", path.display()))
}

#[cfg(feature = "compression-gzip")]
struct Gzip;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for Gzip {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".gz", ".gzip"]
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn decoder(&self, input: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(input)))
    }

    fn encode(&self, data: &[u8], output: &mut dyn Write) -> io::Result<()> {
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish().map(drop)
    }
}

#[cfg(feature = "compression-zstd")]
struct Zstd;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for Zstd {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zst", ".zstd"]
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn decoder(&self, input: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(zstd::stream::read::Decoder::new(input)?))
    }

    fn encode(&self, data: &[u8], output: &mut dyn Write) -> io::Result<()> {
        zstd::stream::copy_encode(data, output, 3)
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2 {
    fn name(&self) -> &'static str {
        "bzip2"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".bz2", ".bzip2"]
    }

    // "BZh" plus the block-size digit; plain "BZ" would match ordinary text.
    fn magic(&self) -> Option<&'static [u8]> {
        Some(b"BZh")
    }

    fn decoder(&self, input: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(bzip2::read::MultiBzDecoder::new(input)))
    }

    fn encode(&self, data: &[u8], output: &mut dyn Write) -> io::Result<()> {
        let mut encoder = bzip2::write::BzEncoder::new(output, bzip2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish().map(drop)
    }
}

#[cfg(feature = "compression-xz")]
struct Xz;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for Xz {
    fn name(&self) -> &'static str {
        "xz"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".xz"]
    }

    fn magic(&self) -> Option<&'static [u8]> {
        Some(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00])
    }

    fn decoder(&self, input: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(xz2::read::XzDecoder::new(input)))
    }

    fn encode(&self, data: &[u8], output: &mut dyn Write) -> io::Result<()> {
        let mut encoder = xz2::write::XzEncoder::new(output, 6);
        encoder.write_all(data)?;
        encoder.finish().map(drop)
    }
}
