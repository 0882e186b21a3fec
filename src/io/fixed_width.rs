//! Fixed-width flat files.
//!
//! Every field with a [`FixedLayout`](crate::schema::FixedLayout) owns the
//! character range `[start, start + length)` of a line, with `start`
//! interpreted per [`StartBase`]. Offsets count characters, not bytes.
//!
//! Numeric fields use implied decimals: a value of `123.45` with scale 2 is
//! stored as `12345`, zero-padded on the left. Everything else is
//! space-padded on the right.

use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::coerce::{ValueCoercer, round_to_scale};
use crate::error::{FieldConversionError, FieldOverflowError, MarshalError, MarshalResult};
use crate::marshal::RecordCodec;
use crate::schema::{FieldDescriptor, FieldValue, FixedLayout, Record, SchemaDescriptor};

/// Whether declared field starts count from 0 or from 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartBase {
    #[default]
    Zero,
    One,
}

impl StartBase {
    /// Zero-based character offset of `layout`.
    fn offset(self, layout: FixedLayout, field: &FieldDescriptor) -> MarshalResult<usize> {
        match self {
            Self::Zero => Ok(layout.start),
            Self::One => layout.start.checked_sub(1).ok_or_else(|| {
                MarshalError::Config(format!(
                    "field {} starts at 0 but starts are 1-based",
                    field.id()
                ))
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedWidthOptions {
    pub start_base: StartBase,
    pub header_rows: usize,
    pub trailer_rows: usize,
    /// Appended after every packed line by [`FixedWidthCodec::write`].
    pub line_separator: String,
}

impl Default for FixedWidthOptions {
    fn default() -> Self {
        Self {
            start_base: StartBase::Zero,
            header_rows: 0,
            trailer_rows: 0,
            line_separator: "\n".to_string(),
        }
    }
}

/// Codec for fixed-offset flat files.
#[derive(Clone, Debug, Default)]
pub struct FixedWidthCodec {
    options: FixedWidthOptions,
}

impl FixedWidthCodec {
    pub fn new(options: FixedWidthOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FixedWidthOptions {
        &self.options
    }

    /// Width of a packed line: the largest field end across the schema.
    pub fn line_width<T>(&self, schema: &SchemaDescriptor<T>) -> MarshalResult<usize> {
        let mut width = 0;
        for field in schema.fields() {
            let d = field.descriptor();
            if let Some(layout) = d.layout() {
                width = width.max(self.options.start_base.offset(layout, d)? + layout.length);
            }
        }
        Ok(width)
    }

    /// Map one line into a record.
    ///
    /// Fields whose range runs past the end of the line are left unset. A
    /// numeric slice without a `.` is read with implied decimals when the field
    /// has a scale.
    ///
    /// # Errors
    /// [`MarshalError::FieldConversion`] when a slice does not parse.
    pub fn parse_line<T: Record>(
        &self,
        line: &str,
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<T> {
        let chars: Vec<char> = line.chars().collect();
        let mut record = T::default();
        for field in schema.fields() {
            let d = field.descriptor();
            let Some(layout) = d.layout().filter(|_| d.input()) else {
                continue;
            };
            let start = self.options.start_base.offset(layout, d)?;
            let Some(slice) = chars.get(start..start + layout.length) else {
                trace!(field = d.id(), width = chars.len(), "line too short, field left unset");
                continue;
            };
            let text: String = slice.iter().collect();
            let value = coercer.parse(&text, d)?;
            let value = unscale(value, text.trim(), d)
                .map_err(|reason| FieldConversionError::new(d.id(), d.name(), text.trim(), d.kind().clone(), reason))?;
            if !field.write(&mut record, value) {
                return Err(FieldConversionError::new(
                    d.id(),
                    d.name(),
                    text.trim(),
                    d.kind().clone(),
                    "parsed value does not fit the record member",
                )
                .into());
            }
        }
        Ok(record)
    }

    /// Pack one record into a line of [`line_width`](Self::line_width) characters.
    ///
    /// `Null` values leave their range blank.
    ///
    /// # Errors
    /// [`MarshalError::FieldOverflow`] when a formatted value is longer than its
    /// field, or a conversion error from the coercer.
    pub fn pack_line<T: Record>(
        &self,
        record: &T,
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<String> {
        let mut buf = vec![' '; self.line_width(schema)?];
        for field in schema.fields() {
            let d = field.descriptor();
            let Some(layout) = d.layout().filter(|_| d.output()) else {
                continue;
            };
            let start = self.options.start_base.offset(layout, d)?;
            let value = field.read(record);
            if value.is_null() {
                continue;
            }

            let numeric = is_implied(&value);
            let natural = if numeric {
                implied_digits(&value, d).map_err(|reason| {
                    FieldConversionError::new(d.id(), d.name(), format!("{value:?}"), d.kind().clone(), reason)
                })?
            } else {
                coercer.format(&value, d, false)?
            };
            if natural.chars().count() > layout.length {
                return Err(FieldOverflowError {
                    field_id: d.id(),
                    field_name: d.name().map(str::to_string),
                    value: natural,
                    length: layout.length,
                    line: None,
                    file: None,
                }
                .into());
            }

            let padded = if numeric {
                zero_pad(&natural, layout.length)
            } else {
                format!("{natural:<width$}", width = layout.length)
            };
            for (slot, c) in buf[start..start + layout.length].iter_mut().zip(padded.chars()) {
                *slot = c;
            }
        }
        Ok(buf.into_iter().collect())
    }

    /// Map every data line of `content`, skipping header and trailer lines.
    ///
    /// Header and trailer counts apply to physical lines, blank ones included.
    /// Empty lines inside the data window are ignored. Errors carry the 1-based
    /// line number.
    pub fn parse<T: Record>(
        &self,
        content: &str,
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<Vec<T>> {
        let started = Instant::now();
        let lines: Vec<&str> = content.lines().collect();
        let end = lines.len().saturating_sub(self.options.trailer_rows);
        let first = self.options.header_rows.min(end);

        let mut out = Vec::with_capacity(end - first);
        for (idx, &line) in lines.iter().enumerate().take(end).skip(first) {
            if line.is_empty() {
                continue;
            }
            let number = idx as u64 + 1;
            let record = self.parse_line(line, schema, coercer).map_err(|e| {
                error!(line = number, width = line.chars().count(), error = %e, "fixed-width line failed");
                e.at_line(number)
            })?;
            out.push(record);
        }
        debug!(
            records = out.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "parsed fixed-width content"
        );
        Ok(out)
    }

    /// Pack every record, each line followed by the configured separator.
    ///
    /// # Errors
    /// [`MarshalError::RowShape`] for an empty record list; otherwise the first
    /// packing error, tagged with its 1-based output line (one line per record).
    pub fn write<T: Record>(
        &self,
        records: &[T],
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<String> {
        if records.is_empty() {
            return Err(MarshalError::row_shape("cannot write an empty record list"));
        }
        let width = self.line_width(schema)?;
        let mut out = String::with_capacity(records.len() * (width + self.options.line_separator.len()));
        for (idx, record) in records.iter().enumerate() {
            let line = self
                .pack_line(record, schema, coercer)
                .map_err(|e| e.at_line(idx as u64 + 1))?;
            out.push_str(&line);
            out.push_str(&self.options.line_separator);
        }
        debug!(records = records.len(), width, "packed fixed-width records");
        Ok(out)
    }
}

impl RecordCodec for FixedWidthCodec {
    fn decode<T: Record>(
        &self,
        content: &str,
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<Vec<T>> {
        self.parse(content, schema, coercer)
    }

    fn encode<T: Record>(
        &self,
        records: &[T],
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<String> {
        self.write(records, schema, coercer)
    }
}

fn is_implied(value: &FieldValue) -> bool {
    matches!(
        value,
        FieldValue::Integer(_)
            | FieldValue::Long(_)
            | FieldValue::Double(_)
            | FieldValue::Float(_)
            | FieldValue::Decimal(_)
    )
}

/// `value` rounded half-up to the field scale, times `10^scale`, as digits
/// with an optional leading `-`.
fn implied_digits(value: &FieldValue, field: &FieldDescriptor) -> Result<String, String> {
    let decimal = match value {
        FieldValue::Integer(v) => Decimal::from(*v),
        FieldValue::Long(v) => Decimal::from(*v),
        FieldValue::Decimal(d) => *d,
        FieldValue::Double(v) => Decimal::from_f64(*v).ok_or_else(|| format!("{v} has no decimal representation"))?,
        FieldValue::Float(v) => Decimal::from_f32(*v).ok_or_else(|| format!("{v} has no decimal representation"))?,
        other => return Err(format!("{other:?} is not numeric")),
    };
    let rounded = round_to_scale(decimal, field.scale());
    if rounded.scale() != field.scale() {
        return Err(format!("{decimal} cannot be held at scale {}", field.scale()));
    }
    Ok(rounded.mantissa().to_string())
}

fn zero_pad(digits: &str, length: usize) -> String {
    match digits.strip_prefix('-') {
        Some(abs) => format!("-{abs:0>width$}", width = length.saturating_sub(1)),
        None => format!("{digits:0>length$}"),
    }
}

/// Divide a parsed numeric value by `10^scale` when its text had no decimal point.
fn unscale(value: FieldValue, text: &str, field: &FieldDescriptor) -> Result<FieldValue, String> {
    let scale = field.scale();
    if scale == 0 || text.contains(['.', 'e', 'E']) {
        return Ok(value);
    }
    let not_whole = || format!("<{text}> is not a whole number at implied scale {scale}");
    Ok(match value {
        FieldValue::Decimal(mut d) => {
            d.set_scale(d.scale() + scale).map_err(|e| e.to_string())?;
            FieldValue::Decimal(d)
        }
        FieldValue::Double(v) => FieldValue::Double(v / 10f64.powi(scale as i32)),
        FieldValue::Float(v) => FieldValue::Float(v / 10f32.powi(scale as i32)),
        FieldValue::Integer(v) => {
            let divisor = 10i32.checked_pow(scale).ok_or_else(not_whole)?;
            if v % divisor != 0 {
                return Err(not_whole());
            }
            FieldValue::Integer(v / divisor)
        }
        FieldValue::Long(v) => {
            let divisor = 10i64.checked_pow(scale).ok_or_else(not_whole)?;
            if v % divisor != 0 {
                return Err(not_whole());
            }
            FieldValue::Long(v / divisor)
        }
        other => other,
    })
}
