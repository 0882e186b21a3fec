//! # Ironflat
//!
//! A **flat-record marshaling engine**: it maps delimited (CSV, pipe, tab)
//! and fixed-width text files to typed Rust records and back.
//!
//! ## Key Features
//!
//! - **Declarative schemas** - a record type lists its fields once with
//!   [`flat_record!`]; the schema is built on first use and cached
//! - **Value coercion** - strings, integers, floats, decimals, dates and custom
//!   kinds, with cleanup of spreadsheet-style numbers (`1,234.50`, `$99`, `100-`)
//! - **Delimited files** - delimiter auto-detection, header/trailer skipping,
//!   mapping by column position, header name or explicit column list
//! - **Fixed-width files** - character offsets, implied-decimal numerics,
//!   overflow detection on write
//! - **Transparent compression** - gzip, zstd, bzip2 and xz by file extension
//!   (optional via feature flags)
//!
//! ## Quick Start
//!
//! ```
//! use ironflat::flat_record;
//! use ironflat::io::DelimitedCodec;
//! use ironflat::marshal::Marshaller;
//! use ironflat::schema::FieldSpec;
//! use rust_decimal::Decimal;
//!
//! #[derive(Debug, Default)]
//! struct Position {
//!     symbol: String,
//!     qty: i32,
//!     price: Decimal,
//! }
//!
//! flat_record!(Position {
//!     symbol => FieldSpec::new(0).name("SYMBOL"),
//!     qty => FieldSpec::new(1).name("QTY"),
//!     price => FieldSpec::new(2).name("PRICE").scale(2).round(true),
//! });
//!
//! # fn main() -> anyhow::Result<()> {
//! let marshaller = Marshaller::new();
//! let codec = DelimitedCodec::default();
//! let rows: Vec<Position> = marshaller.to_list(&codec, "SYMBOL|QTY|PRICE\nAAPL|1,000|123.456\n")?;
//! assert_eq!(rows[0].qty, 1000);
//! assert_eq!(rows[0].price, Decimal::new(12346, 2));
//!
//! let text = marshaller.to_text(&codec, &rows)?;
//! assert_eq!(text, "SYMBOL,QTY,PRICE\r\nAAPL,1000,123.46\r\n");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - record declarations, field descriptors and the schema cache
//! - [`coerce`] - cell text to typed values and back
//! - [`io`] - the delimited and fixed-width codecs plus file access
//! - [`marshal`] - the [`Marshaller`] driver producing lists and keyed maps
//! - [`config`] - serde-backed option sets
//! - [`testing`] - fixtures and helpers for tests
//!
//! ## Logging
//!
//! Diagnostics are emitted through `tracing` (`debug` for timings and counts,
//! `error` for failed cells, `trace` for tolerated short rows). No subscriber is
//! installed by the library.

pub mod coerce;
pub mod config;
pub mod error;
pub mod io;
pub mod marshal;
pub mod schema;
pub mod testing;

pub use coerce::{CoercionOptions, CoercionRegistry, NumericCleanup, ValueCoercer};
pub use config::MarshalConfig;
pub use error::{FieldConversionError, FieldOverflowError, MarshalError, MarshalResult};
pub use io::{ColumnMapping, DelimitedCodec, DelimitedOptions, FixedWidthCodec, FixedWidthOptions, StartBase};
pub use marshal::{Marshaller, RecordCodec};
pub use schema::{FieldKind, FieldSpec, FieldValue, Record, SchemaDescriptor, SchemaRegistry};
