use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::FieldKind;

/// A dynamically typed field value exchanged between the coercer and a record.
///
/// `Null` stands for an empty cell; the receiving [`FieldType`] decides what
/// that means for its member (zero, empty string, or `None`).
#[derive(Clone)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl FieldValue {
    /// Wrap a host-defined value for a custom kind.
    pub fn custom<V: Any + Send + Sync>(value: V) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Borrow the payload of a custom value as `V`.
    pub fn custom_ref<V: Any>(&self) -> Option<&V> {
        match self {
            Self::Custom(v) => v.downcast_ref::<V>(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Self::Long(v) => f.debug_tuple("Long").field(v).finish(),
            Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Decimal(v) => f.debug_tuple("Decimal").field(v).finish(),
            Self::Date(v) => f.debug_tuple("Date").field(v).finish(),
            Self::DateTime(v) => f.debug_tuple("DateTime").field(v).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A Rust type that can be a record member.
///
/// `from_value` returns `None` when the value does not fit the type; the
/// caller reports that as a conversion error. Implement this for host types
/// with a [`FieldKind::Custom`] kind and register a matching coercion.
pub trait FieldType: Sized + Send + Sync + 'static {
    const KIND: FieldKind;
    const NULLABLE: bool = false;

    fn to_value(&self) -> FieldValue;

    fn from_value(value: FieldValue) -> Option<Self>;
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(s) => Some(s),
            FieldValue::Null => Some(String::new()),
            _ => None,
        }
    }
}

// Non-nullable scalars: `Null` becomes the zero value.
macro_rules! scalar_field_type {
    ($ty:ty, $kind:ident, $zero:expr) => {
        impl FieldType for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn to_value(&self) -> FieldValue {
                FieldValue::$kind(*self)
            }

            fn from_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$kind(v) => Some(v),
                    FieldValue::Null => Some($zero),
                    _ => None,
                }
            }
        }
    };
}

scalar_field_type!(i32, Integer, 0);
scalar_field_type!(i64, Long, 0);
scalar_field_type!(f64, Double, 0.0);
scalar_field_type!(f32, Float, 0.0);
scalar_field_type!(Decimal, Decimal, Decimal::ZERO);

// Nullable members: `Null` becomes `None`.
macro_rules! optional_field_type {
    ($ty:ty, $kind:ident, $to:expr) => {
        impl FieldType for Option<$ty> {
            const KIND: FieldKind = FieldKind::$kind;
            const NULLABLE: bool = true;

            fn to_value(&self) -> FieldValue {
                match self {
                    Some(v) => FieldValue::$kind($to(v)),
                    None => FieldValue::Null,
                }
            }

            fn from_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$kind(v) => Some(Some(v)),
                    FieldValue::Null => Some(None),
                    _ => None,
                }
            }
        }
    };
}

optional_field_type!(String, String, |v: &String| v.clone());
optional_field_type!(i32, Integer, |v: &i32| *v);
optional_field_type!(i64, Long, |v: &i64| *v);
optional_field_type!(f64, Double, |v: &f64| *v);
optional_field_type!(f32, Float, |v: &f32| *v);
optional_field_type!(Decimal, Decimal, |v: &Decimal| *v);
optional_field_type!(NaiveDate, Date, |v: &NaiveDate| *v);
optional_field_type!(NaiveDateTime, DateTime, |v: &NaiveDateTime| *v);
