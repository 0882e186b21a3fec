//! Driver tying the schema registry, the coercer and a codec together.
//!
//! ```
//! use ironflat::io::DelimitedCodec;
//! use ironflat::marshal::Marshaller;
//! use ironflat::testing::Trade;
//!
//! let marshaller = Marshaller::new();
//! let trades: Vec<Trade> = marshaller
//!     .to_list(&DelimitedCodec::default(), "SYMBOL|QTY|PRICE\nAAPL|100|123.456\n")
//!     .unwrap();
//! assert_eq!(trades[0].qty, 100);
//! assert_eq!(trades[0].price.to_string(), "123.46");
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::coerce::ValueCoercer;
use crate::config::MarshalConfig;
use crate::error::MarshalResult;
use crate::io::files::{read_text, write_text};
use crate::schema::{Record, SchemaDescriptor, SchemaRegistry};

/// A flat-file format that turns whole-file text into records and back.
pub trait RecordCodec {
    fn decode<T: Record>(
        &self,
        content: &str,
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<Vec<T>>;

    fn encode<T: Record>(
        &self,
        records: &[T],
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<String>;
}

/// Entry point for reading and writing records.
///
/// Holds the schema cache, so one `Marshaller` is typically shared for the
/// life of the process (it is `Send + Sync`).
#[derive(Debug, Default)]
pub struct Marshaller {
    schemas: SchemaRegistry,
    coercer: ValueCoercer,
}

impl Marshaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coercer(coercer: ValueCoercer) -> Self {
        Self {
            schemas: SchemaRegistry::new(),
            coercer,
        }
    }

    /// A marshaller using the coercion settings of `config`.
    pub fn from_config(config: &MarshalConfig) -> Self {
        Self::with_coercer(ValueCoercer::with_options(config.coercion.clone()))
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn coercer(&self) -> &ValueCoercer {
        &self.coercer
    }

    /// Coercer access for registering custom kinds before first use.
    pub fn coercer_mut(&mut self) -> &mut ValueCoercer {
        &mut self.coercer
    }

    pub fn schema<T: Record>(&self) -> MarshalResult<Arc<SchemaDescriptor<T>>> {
        self.schemas.schema::<T>()
    }

    /// Decode `source` into records in file order.
    pub fn to_list<T: Record, C: RecordCodec>(&self, codec: &C, source: &str) -> MarshalResult<Vec<T>> {
        let schema = self.schema::<T>()?;
        codec.decode(source, &schema, &self.coercer)
    }

    /// Decode `source` and index the records by `key`.
    ///
    /// A later record with the same key replaces the earlier one.
    pub fn to_map<T, K, C, F>(&self, codec: &C, source: &str, key: F) -> MarshalResult<HashMap<K, T>>
    where
        T: Record,
        K: Eq + Hash,
        C: RecordCodec,
        F: Fn(&T) -> K,
    {
        let records = self.to_list::<T, C>(codec, source)?;
        let total = records.len();
        let map: HashMap<K, T> = records.into_iter().map(|r| (key(&r), r)).collect();
        if map.len() < total {
            debug!(records = total, keys = map.len(), "duplicate keys replaced earlier records");
        }
        Ok(map)
    }

    /// Encode records to text.
    pub fn to_text<T: Record, C: RecordCodec>(&self, codec: &C, records: &[T]) -> MarshalResult<String> {
        let schema = self.schema::<T>()?;
        codec.encode(records, &schema, &self.coercer)
    }

    /// Read and decode a file. Conversion errors name the file.
    pub fn read_list<T: Record, C: RecordCodec>(&self, codec: &C, path: impl AsRef<Path>) -> Result<Vec<T>> {
        let path = path.as_ref();
        let text = read_text(path)?;
        let records = self
            .to_list(codec, &text)
            .map_err(|e| e.in_file(path))
            .with_context(|| format!("decode {}", path.display()))?;
        debug!(records = records.len(), path = %path.display(), "read records");
        Ok(records)
    }

    /// Read and decode a file into a keyed map (last write wins).
    pub fn read_map<T, K, C, F>(&self, codec: &C, path: impl AsRef<Path>, key: F) -> Result<HashMap<K, T>>
    where
        T: Record,
        K: Eq + Hash,
        C: RecordCodec,
        F: Fn(&T) -> K,
    {
        let path = path.as_ref();
        let text = read_text(path)?;
        self.to_map(codec, &text, key)
            .map_err(|e| e.in_file(path))
            .with_context(|| format!("decode {}", path.display()))
    }

    /// Encode records and write them to `path`, compressing by extension.
    pub fn write_file<T: Record, C: RecordCodec>(&self, codec: &C, path: impl AsRef<Path>, records: &[T]) -> Result<()> {
        let path = path.as_ref();
        let text = self
            .to_text(codec, records)
            .map_err(|e| e.in_file(path))
            .with_context(|| format!("encode {}", path.display()))?;
        write_text(path, &text)?;
        debug!(records = records.len(), path = %path.display(), "wrote records");
        Ok(())
    }
}
