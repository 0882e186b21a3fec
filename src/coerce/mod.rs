//! Conversion between raw text cells and typed field values.
//!
//! [`ValueCoercer`] trims the cell, maps empty text to [`FieldValue::Null`], and
//! dispatches on the field's [`FieldKind`] through a [`CoercionRegistry`].
//! Built-in kinds are registered by default; hosts add their own with
//! [`CoercionRegistry::register`], typically via [`TextCoercion`] for any
//! `FromStr + Display` type.

pub mod datetime;
mod numeric;

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{FieldConversionError, MarshalResult};
use crate::schema::{BoundField, FieldDescriptor, FieldKind, FieldValue};

pub use numeric::{NumericCleanup, clean_number};

/// Coercer settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionOptions {
    pub numeric_cleanup: NumericCleanup,
}

/// A parse/format pair for one field kind.
///
/// `parse` receives trimmed, non-empty text. `format` never sees
/// [`FieldValue::Null`]. `round` is set when the field or the writer asks for
/// rounding to the field scale. Errors are plain reasons; the coercer wraps
/// them with field context.
pub trait Coercion: Send + Sync {
    fn parse(
        &self,
        text: &str,
        field: &FieldDescriptor,
        options: &CoercionOptions,
    ) -> Result<FieldValue, String>;

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, round: bool)
    -> Result<String, String>;
}

/// Maps each field kind to its coercion.
#[derive(Clone)]
pub struct CoercionRegistry {
    coercions: HashMap<FieldKind, Arc<dyn Coercion>>,
}

impl CoercionRegistry {
    /// A registry with no kinds at all.
    pub fn empty() -> Self {
        Self {
            coercions: HashMap::new(),
        }
    }

    /// A registry with every built-in kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry
            .register(FieldKind::String, Arc::new(StringCoercion))
            .register(FieldKind::Integer, Arc::new(IntegerCoercion))
            .register(FieldKind::Long, Arc::new(LongCoercion))
            .register(FieldKind::Double, Arc::new(DoubleCoercion))
            .register(FieldKind::Float, Arc::new(FloatCoercion))
            .register(FieldKind::Decimal, Arc::new(DecimalCoercion))
            .register(FieldKind::Date, Arc::new(DateCoercion))
            .register(FieldKind::DateTime, Arc::new(DateTimeCoercion));
        registry
    }

    /// Register (or replace) the coercion for `kind`.
    pub fn register(&mut self, kind: FieldKind, coercion: Arc<dyn Coercion>) -> &mut Self {
        self.coercions.insert(kind, coercion);
        self
    }

    pub fn get(&self, kind: &FieldKind) -> Option<&Arc<dyn Coercion>> {
        self.coercions.get(kind)
    }
}

impl Default for CoercionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for CoercionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.coercions.keys()).finish()
    }
}

/// Converts cells to values and back using per-field rules.
#[derive(Clone, Debug, Default)]
pub struct ValueCoercer {
    registry: CoercionRegistry,
    options: CoercionOptions,
}

impl ValueCoercer {
    pub fn new(registry: CoercionRegistry, options: CoercionOptions) -> Self {
        Self { registry, options }
    }

    pub fn with_options(options: CoercionOptions) -> Self {
        Self::new(CoercionRegistry::with_builtins(), options)
    }

    pub fn options(&self) -> &CoercionOptions {
        &self.options
    }

    pub fn registry_mut(&mut self) -> &mut CoercionRegistry {
        &mut self.registry
    }

    /// Parse a raw cell for `field`. Empty (after trimming) yields `Null`.
    ///
    /// # Errors
    /// [`FieldConversionError`] when the text does not parse as the field kind
    /// or no coercion is registered for it.
    pub fn parse(&self, raw: &str, field: &FieldDescriptor) -> MarshalResult<FieldValue> {
        let text = raw.trim();
        if text.is_empty() {
            return Ok(FieldValue::Null);
        }
        let coercion = self
            .registry
            .get(field.kind())
            .ok_or_else(|| conversion_error(field, text, NO_COERCION))?;
        coercion
            .parse(text, field, &self.options)
            .map_err(|reason| conversion_error(field, text, reason).into())
    }

    /// Format a value for `field`. `Null` yields an empty string.
    ///
    /// # Errors
    /// [`FieldConversionError`] when the value does not match the field kind.
    pub fn format(
        &self,
        value: &FieldValue,
        field: &FieldDescriptor,
        round: bool,
    ) -> MarshalResult<String> {
        if value.is_null() {
            return Ok(String::new());
        }
        let coercion = self
            .registry
            .get(field.kind())
            .ok_or_else(|| conversion_error(field, format!("{value:?}"), NO_COERCION))?;
        coercion
            .format(value, field, round || field.round())
            .map_err(|reason| conversion_error(field, format!("{value:?}"), reason).into())
    }

    /// Parse `raw` and store it on `record`.
    pub fn assign<T>(&self, record: &mut T, field: &BoundField<T>, raw: &str) -> MarshalResult<()> {
        let value = self.parse(raw, field.descriptor())?;
        if field.write(record, value) {
            Ok(())
        } else {
            Err(conversion_error(
                field.descriptor(),
                raw.trim(),
                "parsed value does not fit the record member",
            )
            .into())
        }
    }
}

const NO_COERCION: &str = "no coercion registered for kind";

fn conversion_error(
    field: &FieldDescriptor,
    raw: impl Into<String>,
    reason: impl Into<String>,
) -> FieldConversionError {
    FieldConversionError::new(field.id(), field.name(), raw, field.kind().clone(), reason)
}

fn mismatch(value: &FieldValue, field: &FieldDescriptor) -> String {
    format!("{value:?} is not a {} value", field.kind())
}

/// Round half away from zero to the field scale, keeping exactly `scale`
/// decimal places (`2.5` at scale 2 is `2.50`).
pub fn round_to_scale(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

fn cleaned(text: &str, options: &CoercionOptions) -> Result<Option<String>, String> {
    clean_number(text, options.numeric_cleanup)
}

struct StringCoercion;

impl Coercion for StringCoercion {
    fn parse(&self, text: &str, _: &FieldDescriptor, _: &CoercionOptions) -> Result<FieldValue, String> {
        Ok(FieldValue::String(text.to_string()))
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, _: bool) -> Result<String, String> {
        match value {
            FieldValue::String(s) => Ok(s.clone()),
            other => Err(mismatch(other, field)),
        }
    }
}

struct IntegerCoercion;

impl Coercion for IntegerCoercion {
    fn parse(&self, text: &str, _: &FieldDescriptor, options: &CoercionOptions) -> Result<FieldValue, String> {
        match cleaned(text, options)? {
            Some(n) => n.parse::<i32>().map(FieldValue::Integer).map_err(|e| e.to_string()),
            None => Ok(FieldValue::Null),
        }
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, _: bool) -> Result<String, String> {
        match value {
            FieldValue::Integer(v) => Ok(v.to_string()),
            other => Err(mismatch(other, field)),
        }
    }
}

struct LongCoercion;

impl Coercion for LongCoercion {
    fn parse(&self, text: &str, _: &FieldDescriptor, options: &CoercionOptions) -> Result<FieldValue, String> {
        match cleaned(text, options)? {
            Some(n) => n.parse::<i64>().map(FieldValue::Long).map_err(|e| e.to_string()),
            None => Ok(FieldValue::Null),
        }
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, _: bool) -> Result<String, String> {
        match value {
            FieldValue::Long(v) => Ok(v.to_string()),
            other => Err(mismatch(other, field)),
        }
    }
}

struct DoubleCoercion;

impl Coercion for DoubleCoercion {
    fn parse(&self, text: &str, _: &FieldDescriptor, options: &CoercionOptions) -> Result<FieldValue, String> {
        match cleaned(text, options)? {
            Some(n) => n.parse::<f64>().map(FieldValue::Double).map_err(|e| e.to_string()),
            None => Ok(FieldValue::Null),
        }
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, round: bool) -> Result<String, String> {
        match value {
            FieldValue::Double(v) => format_float(*v, field, round),
            other => Err(mismatch(other, field)),
        }
    }
}

struct FloatCoercion;

impl Coercion for FloatCoercion {
    fn parse(&self, text: &str, _: &FieldDescriptor, options: &CoercionOptions) -> Result<FieldValue, String> {
        match cleaned(text, options)? {
            Some(n) => n.parse::<f32>().map(FieldValue::Float).map_err(|e| e.to_string()),
            None => Ok(FieldValue::Null),
        }
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, round: bool) -> Result<String, String> {
        match value {
            FieldValue::Float(v) if !round => Ok(v.to_string()),
            FieldValue::Float(v) => {
                let d = Decimal::from_f32(*v).ok_or_else(|| format!("{v} has no decimal representation"))?;
                Ok(round_to_scale(d, field.scale()).to_string())
            }
            other => Err(mismatch(other, field)),
        }
    }
}

fn format_float(v: f64, field: &FieldDescriptor, round: bool) -> Result<String, String> {
    if !round {
        return Ok(v.to_string());
    }
    let d = Decimal::from_f64(v).ok_or_else(|| format!("{v} has no decimal representation"))?;
    Ok(round_to_scale(d, field.scale()).to_string())
}

/// Parse decimal text, accepting scientific notation.
pub fn parse_decimal(text: &str) -> Result<Decimal, String> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).map_err(|e| e.to_string())
    } else {
        Decimal::from_str(text).map_err(|e| e.to_string())
    }
}

struct DecimalCoercion;

impl Coercion for DecimalCoercion {
    fn parse(&self, text: &str, field: &FieldDescriptor, options: &CoercionOptions) -> Result<FieldValue, String> {
        let Some(n) = cleaned(text, options)? else {
            return Ok(FieldValue::Null);
        };
        let d = parse_decimal(&n)?;
        let d = if field.round() { round_to_scale(d, field.scale()) } else { d };
        Ok(FieldValue::Decimal(d))
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, round: bool) -> Result<String, String> {
        match value {
            FieldValue::Decimal(d) if round => Ok(round_to_scale(*d, field.scale()).to_string()),
            FieldValue::Decimal(d) => Ok(d.to_string()),
            other => Err(mismatch(other, field)),
        }
    }
}

struct DateCoercion;

impl Coercion for DateCoercion {
    fn parse(&self, text: &str, field: &FieldDescriptor, _: &CoercionOptions) -> Result<FieldValue, String> {
        datetime::parse_date(text, field.chrono_format()).map(FieldValue::Date)
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, _: bool) -> Result<String, String> {
        match value {
            FieldValue::Date(d) => datetime::format_date(d, field.chrono_format()),
            other => Err(mismatch(other, field)),
        }
    }
}

struct DateTimeCoercion;

impl Coercion for DateTimeCoercion {
    fn parse(&self, text: &str, field: &FieldDescriptor, _: &CoercionOptions) -> Result<FieldValue, String> {
        datetime::parse_date_time(text, field.chrono_format()).map(FieldValue::DateTime)
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, _: bool) -> Result<String, String> {
        match value {
            FieldValue::DateTime(dt) => datetime::format_date_time(dt, field.chrono_format()),
            other => Err(mismatch(other, field)),
        }
    }
}

/// Coercion for any `FromStr + Display` type, stored as [`FieldValue::Custom`].
///
/// ```
/// use std::sync::Arc;
/// use std::net::Ipv4Addr;
/// use ironflat::coerce::{CoercionRegistry, TextCoercion};
/// use ironflat::schema::FieldKind;
///
/// let mut registry = CoercionRegistry::with_builtins();
/// registry.register(FieldKind::Custom("ipv4"), Arc::new(TextCoercion::<Ipv4Addr>::new()));
/// ```
pub struct TextCoercion<V>(PhantomData<fn() -> V>);

impl<V> TextCoercion<V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for TextCoercion<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Coercion for TextCoercion<V>
where
    V: FromStr + Display + Send + Sync + 'static,
    V::Err: Display,
{
    fn parse(&self, text: &str, _: &FieldDescriptor, _: &CoercionOptions) -> Result<FieldValue, String> {
        text.parse::<V>()
            .map(FieldValue::custom)
            .map_err(|e| e.to_string())
    }

    fn format(&self, value: &FieldValue, field: &FieldDescriptor, _: bool) -> Result<String, String> {
        value
            .custom_ref::<V>()
            .map(ToString::to_string)
            .ok_or_else(|| mismatch(value, field))
    }
}
