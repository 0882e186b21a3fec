//! Record schemas: field declarations, typed accessors and the per-type cache.
//!
//! A host type becomes marshalable by implementing [`Record`], whose
//! [`declare`](Record::declare) hook registers each member with a [`FieldSpec`]
//! and a pair of accessors. The [`SchemaRegistry`] turns that declaration into
//! an immutable [`SchemaDescriptor`] on first use and hands out the same
//! `Arc` for the rest of its life.
//!
//! ```
//! use ironflat::flat_record;
//! use ironflat::schema::{FieldSpec, SchemaRegistry};
//! use rust_decimal::Decimal;
//!
//! #[derive(Debug, Default)]
//! struct Quote {
//!     symbol: String,
//!     price: Option<Decimal>,
//! }
//!
//! flat_record!(Quote {
//!     symbol => FieldSpec::new(0).name("SYMBOL"),
//!     price => FieldSpec::new(1).name("PRICE").scale(2).round(true),
//! });
//!
//! let registry = SchemaRegistry::new();
//! let schema = registry.schema::<Quote>().unwrap();
//! assert_eq!(schema.len(), 2);
//! assert_eq!(schema.field_by_name("PRICE").unwrap().descriptor().id(), 1);
//! ```

mod descriptor;
mod field;
mod registry;
mod value;

pub use descriptor::{BoundField, Record, SchemaBuilder, SchemaDescriptor};
pub use field::{FieldDescriptor, FieldKind, FieldSpec, FixedLayout, DEFAULT_DATE_PATTERN};
pub use registry::{SchemaRegistry, TypeTag};
pub use value::{FieldType, FieldValue};

/// Implement [`Record`] for a struct from `member => FieldSpec` pairs.
///
/// Each member's type must implement [`FieldType`]; its kind is taken from
/// that implementation.
#[macro_export]
macro_rules! flat_record {
    ($record:ty { $($member:ident => $spec:expr),* $(,)? }) => {
        impl $crate::schema::Record for $record {
            fn declare(schema: &mut $crate::schema::SchemaBuilder<Self>) {
                $(
                    schema.field($spec, |r| &r.$member, |r| &mut r.$member);
                )*
            }
        }
    };
}
