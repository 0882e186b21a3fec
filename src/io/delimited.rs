//! Delimited (CSV-like) flat files.
//!
//! Reading happens in two steps: [`DelimitedCodec::parse`] splits the whole
//! content into [`RawRow`]s, then one of the `map_by_*` methods turns the data
//! rows into records. Header and trailer rows are skipped by count.
//!
//! # Design notes
//! - Rows shorter than the schema are tolerated: fields past the end of a row
//!   keep the record's default value and no error is raised.
//! - The delimiter is auto-detected among `,`, `|` and tab unless configured.
//! - Quoting on write follows the `csv` crate's "necessary" style: a cell is
//!   quoted when it contains the delimiter, the quote character or a line
//!   break, and embedded quotes are doubled.

use std::collections::HashMap;
use std::time::Instant;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::coerce::ValueCoercer;
use crate::error::{MarshalError, MarshalResult};
use crate::marshal::RecordCodec;
use crate::schema::{BoundField, Record, SchemaDescriptor};

/// Delimiters considered by [`detect_delimiter`], in tie-break order.
pub const DETECTABLE_DELIMITERS: [char; 3] = [',', '|', '\t'];

/// How data cells are matched to schema fields when decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMapping {
    /// Field id is the column index.
    #[default]
    Position,
    /// Field name is looked up in the header-name row.
    Name,
    /// Explicit `(field id, column index)` pairs.
    Columns(Vec<(u32, usize)>),
}

/// Options for reading and writing delimited files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimitedOptions {
    /// Fixed delimiter; `None` auto-detects on read and writes `,`.
    pub delimiter: Option<char>,
    /// Quote character; `None` disables quoting in both directions.
    pub quote: Option<char>,
    /// Line terminator used when writing: `\r\n` or any single ASCII character.
    pub line_separator: String,
    /// Leading rows skipped before data.
    pub header_rows: usize,
    /// Trailing rows skipped after data.
    pub trailer_rows: usize,
    /// Row index holding column names for [`ColumnMapping::Name`].
    pub header_name_row: usize,
    /// Emit a header line of field ids.
    pub write_id_header: bool,
    /// Emit a header line of field names.
    pub write_name_header: bool,
    /// Round every decimal/floating value to its field scale on write.
    pub round_decimals: bool,
    pub mapping: ColumnMapping,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: Some('"'),
            line_separator: "\r\n".to_string(),
            header_rows: 1,
            trailer_rows: 0,
            header_name_row: 0,
            write_id_header: false,
            write_name_header: true,
            round_decimals: false,
            mapping: ColumnMapping::Position,
        }
    }
}

/// The text cells of one parsed line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source content.
    pub line: u64,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Lines that contain at least one candidate delimiter examined by [`detect_delimiter`].
pub const DETECTION_SAMPLE_LINES: usize = 20;

/// Pick the delimiter among `,`, `|` and tab that splits the most lines.
///
/// Lines with none of the candidates (blank lines, report banners) are not
/// sampled. Each candidate is scored by how many sampled lines it appears on,
/// then by its total count. Delimiters inside double quotes are ignored. Ties
/// go to the earlier entry of [`DETECTABLE_DELIMITERS`]; content with none of
/// them yields `,`.
///
/// ```
/// use ironflat::io::delimited::detect_delimiter;
///
/// assert_eq!(detect_delimiter("SYMBOL|QTY|PRICE\nAAPL|100|1.5\n"), '|');
/// assert_eq!(detect_delimiter("DAILY TRADES\nSYMBOL|QTY\nAAPL|100\n"), '|');
/// assert_eq!(detect_delimiter("a\tb\tc"), '\t');
/// assert_eq!(detect_delimiter("\"x|y\",z"), ',');
/// ```
pub fn detect_delimiter(content: &str) -> char {
    const N: usize = DETECTABLE_DELIMITERS.len();
    let mut lines_with = [0usize; N];
    let mut totals = [0usize; N];
    let mut current = [0usize; N];
    let mut sampled = 0;
    let mut quoted = false;

    for c in content.chars().chain(std::iter::once('\n')) {
        match c {
            '"' => quoted = !quoted,
            '\n' | '\r' if !quoted => {
                if current.iter().any(|&n| n > 0) {
                    for (idx, &n) in current.iter().enumerate() {
                        if n > 0 {
                            lines_with[idx] += 1;
                            totals[idx] += n;
                        }
                    }
                    sampled += 1;
                    if sampled == DETECTION_SAMPLE_LINES {
                        break;
                    }
                }
                current = [0; N];
            }
            _ if !quoted => {
                if let Some(pos) = DETECTABLE_DELIMITERS.iter().position(|&d| d == c) {
                    current[pos] += 1;
                }
            }
            _ => {}
        }
    }

    let mut best = 0;
    for idx in 1..N {
        if (lines_with[idx], totals[idx]) > (lines_with[best], totals[best]) {
            best = idx;
        }
    }
    DETECTABLE_DELIMITERS[best]
}

/// Codec for delimiter-separated flat files.
#[derive(Clone, Debug, Default)]
pub struct DelimitedCodec {
    options: DelimitedOptions,
}

impl DelimitedCodec {
    pub fn new(options: DelimitedOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DelimitedOptions {
        &self.options
    }

    /// Split the whole content into rows.
    ///
    /// `\n`, `\r\n` and `\r` all end a line. Blank lines are skipped.
    ///
    /// # Errors
    /// Returns an error if the delimiter or quote is not ASCII, or the content
    /// is malformed (e.g. an unterminated quote at end of input is *not* an
    /// error, it simply runs to the end).
    pub fn parse(&self, content: &str) -> MarshalResult<Vec<RawRow>> {
        let started = Instant::now();
        let delimiter = self
            .options
            .delimiter
            .unwrap_or_else(|| detect_delimiter(content));

        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(ascii_byte(delimiter, "delimiter")?);
        match self.options.quote {
            Some(q) => builder.quote(ascii_byte(q, "quote")?),
            None => builder.quoting(false),
        };

        let mut reader = builder.from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = record.position().map_or(idx as u64 + 1, |p| p.line());
            rows.push(RawRow::new(line, record.iter().map(str::to_string).collect()));
        }
        debug!(
            rows = rows.len(),
            delimiter = ?delimiter,
            elapsed_us = started.elapsed().as_micros() as u64,
            "parsed delimited content"
        );
        Ok(rows)
    }

    /// Map data rows by field id = column index.
    ///
    /// Data rows are `[header_rows, rows.len() - trailer_rows)`. Fields whose id
    /// is past the end of a row are left at their default.
    ///
    /// # Errors
    /// Returns the first [`FieldConversionError`](crate::error::FieldConversionError),
    /// tagged with the row's line number.
    pub fn map_by_position<T: Record>(
        &self,
        rows: &[RawRow],
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
        header_rows: usize,
        trailer_rows: usize,
    ) -> MarshalResult<Vec<T>> {
        let bindings: Vec<(&BoundField<T>, usize)> = schema
            .fields()
            .iter()
            .filter(|f| f.descriptor().input())
            .map(|f| (f, f.descriptor().id() as usize))
            .collect();
        map_rows(data_rows(rows, header_rows, trailer_rows), &bindings, coercer)
    }

    /// Map data rows by matching field names against the header-name row.
    ///
    /// Header names are trimmed. Fields without a name, or whose name has no
    /// column, are left at their default.
    ///
    /// # Errors
    /// [`MarshalError::RowShape`] if `header_name_row` is past the last row, or
    /// the first conversion error.
    pub fn map_by_name<T: Record>(
        &self,
        rows: &[RawRow],
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
        header_name_row: usize,
        header_rows: usize,
        trailer_rows: usize,
    ) -> MarshalResult<Vec<T>> {
        let header = rows.get(header_name_row).ok_or_else(|| {
            MarshalError::row_shape(format!(
                "header name row {header_name_row} is past the end of {} rows",
                rows.len()
            ))
        })?;
        let columns: HashMap<&str, usize> = header
            .cells
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim(), idx))
            .collect();

        let bindings: Vec<(&BoundField<T>, usize)> = schema
            .fields()
            .iter()
            .filter(|f| f.descriptor().input())
            .filter_map(|f| {
                let name = f.descriptor().name()?;
                match columns.get(name) {
                    Some(&col) => Some((f, col)),
                    None => {
                        trace!(field = name, "no column for named field");
                        None
                    }
                }
            })
            .collect();
        map_rows(data_rows(rows, header_rows, trailer_rows), &bindings, coercer)
    }

    /// Map data rows through explicit `(field id, column index)` pairs.
    ///
    /// # Errors
    /// [`MarshalError::RowShape`] if a pair names a field id the schema lacks,
    /// or the first conversion error.
    pub fn map_by_columns<T: Record>(
        &self,
        rows: &[RawRow],
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
        mapping: &[(u32, usize)],
        header_rows: usize,
        trailer_rows: usize,
    ) -> MarshalResult<Vec<T>> {
        let bindings = mapping
            .iter()
            .map(|&(id, col)| {
                schema.field(id).map(|f| (f, col)).ok_or_else(|| {
                    MarshalError::row_shape(format!(
                        "column mapping names field id {id}, unknown to {}",
                        schema.record_name()
                    ))
                })
            })
            .collect::<MarshalResult<Vec<_>>>()?;
        map_rows(data_rows(rows, header_rows, trailer_rows), &bindings, coercer)
    }

    /// Render records as delimited text.
    ///
    /// Writes the optional id header line, the optional name header line, then
    /// one line per record with only the output-enabled fields.
    ///
    /// # Errors
    /// Returns an error on an unusable delimiter/quote/line separator or when a
    /// value cannot be formatted for its field. Formatting errors carry the
    /// output line the record would have started on, header lines included.
    pub fn write<T: Record>(
        &self,
        records: &[T],
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<String> {
        let options = &self.options;
        let mut builder = WriterBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(ascii_byte(options.delimiter.unwrap_or(','), "delimiter")?)
            .terminator(terminator(&options.line_separator)?);
        match options.quote {
            Some(q) => builder
                .quote(ascii_byte(q, "quote")?)
                .quote_style(QuoteStyle::Necessary),
            None => builder.quote_style(QuoteStyle::Never),
        };
        let mut writer = builder.from_writer(Vec::new());

        let outputs: Vec<&BoundField<T>> = schema
            .fields()
            .iter()
            .filter(|f| f.descriptor().output())
            .collect();
        if options.write_id_header {
            writer.write_record(outputs.iter().map(|f| f.descriptor().id().to_string()))?;
        }
        if options.write_name_header {
            writer.write_record(outputs.iter().map(|f| f.descriptor().name().unwrap_or_default()))?;
        }

        let header_lines = u64::from(options.write_id_header) + u64::from(options.write_name_header);
        let mut cells = Vec::with_capacity(outputs.len());
        for (idx, record) in records.iter().enumerate() {
            cells.clear();
            for field in &outputs {
                let text = coercer
                    .format(&field.read(record), field.descriptor(), options.round_decimals)
                    .map_err(|e| e.at_line(header_lines + idx as u64 + 1))?;
                cells.push(text);
            }
            writer.write_record(&cells)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| MarshalError::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| MarshalError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

impl RecordCodec for DelimitedCodec {
    fn decode<T: Record>(
        &self,
        content: &str,
        schema: &SchemaDescriptor<T>,
        coercer: &ValueCoercer,
    ) -> MarshalResult<Vec<T>> {
        let rows = self.parse(content)?;
        let o = &self.options;
        match &o.mapping {
            ColumnMapping::Position => {
                self.map_by_position(&rows, schema, coercer, o.header_rows, o.trailer_rows)
            }
            ColumnMapping::Name => self.map_by_name(
                &rows,
                schema,
                coercer,
                o.header_name_row,
                o.header_rows,
                o.trailer_rows,
            ),
            ColumnMapping::Columns(mapping) => {
                self.map_by_columns(&rows, schema, coercer, mapping, o.header_rows, o.trailer_rows)
            }
        }
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

fn data_rows(rows: &[RawRow], header_rows: usize, trailer_rows: usize) -> &[RawRow] {
    let end = rows.len().saturating_sub(trailer_rows);
    rows.get(header_rows..end).unwrap_or_default()
}

fn map_rows<T: Record>(
    rows: &[RawRow],
    bindings: &[(&BoundField<T>, usize)],
    coercer: &ValueCoercer,
) -> MarshalResult<Vec<T>> {
    let started = Instant::now();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut record = T::default();
        for &(field, col) in bindings {
            let Some(cell) = row.cells.get(col) else {
                trace!(
                    line = row.line,
                    field = field.descriptor().id(),
                    width = row.len(),
                    "short row, field left unset"
                );
                continue;
            };
            coercer.assign(&mut record, field, cell).map_err(|e| {
                error!(
                    field = field.descriptor().id(),
                    name = ?field.descriptor().name(),
                    line = row.line,
                    width = row.len(),
                    error = %e,
                    "field conversion failed"
                );
                e.at_line(row.line)
            })?;
        }
        out.push(record);
    }
    debug!(
        records = out.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "mapped delimited rows"
    );
    Ok(out)
}

fn ascii_byte(c: char, what: &str) -> MarshalResult<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| MarshalError::Config(format!("{what} {c:?} must be a single ASCII character")))
}

fn terminator(separator: &str) -> MarshalResult<Terminator> {
    match separator.as_bytes() {
        b"\r\n" => Ok(Terminator::CRLF),
        [b] if b.is_ascii() => Ok(Terminator::Any(*b)),
        _ => Err(MarshalError::Config(format!(
            "line separator {separator:?} must be \\r\\n or a single ASCII character"
        ))),
    }
}
