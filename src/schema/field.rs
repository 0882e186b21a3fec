use std::fmt;

use crate::coerce::datetime::to_chrono_format;

/// Date pattern used when a field does not declare one.
pub const DEFAULT_DATE_PATTERN: &str = "yyyyMMdd";

/// The value kind a field converts to and from.
///
/// Built-in kinds have default coercions; `Custom` kinds are resolved by name
/// through the [`CoercionRegistry`](crate::coerce::CoercionRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Long,
    Double,
    Float,
    Decimal,
    Date,
    DateTime,
    Custom(&'static str),
}

impl FieldKind {
    /// Kinds that go through numeric cleanup and implied-decimal packing.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Long | Self::Double | Self::Float | Self::Decimal
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Long => f.write_str("long"),
            Self::Double => f.write_str("double"),
            Self::Float => f.write_str("float"),
            Self::Decimal => f.write_str("decimal"),
            Self::Date => f.write_str("date"),
            Self::DateTime => f.write_str("datetime"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// Character range of a field in a fixed-width line.
///
/// `start` is interpreted according to the codec's
/// [`StartBase`](crate::io::fixed_width::StartBase).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedLayout {
    pub start: usize,
    pub length: usize,
}

/// Host-facing declaration of one field, before its kind is known.
///
/// ```
/// use ironflat::schema::FieldSpec;
///
/// let spec = FieldSpec::new(3)
///     .name("SETTLE_DATE")
///     .at(20, 8)
///     .pattern("yyyyMMdd");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    id: u32,
    name: Option<String>,
    layout: Option<FixedLayout>,
    scale: u32,
    round: bool,
    pattern: String,
    input: bool,
    output: bool,
}

impl FieldSpec {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: None,
            layout: None,
            scale: 0,
            round: false,
            pattern: DEFAULT_DATE_PATTERN.to_string(),
            input: true,
            output: true,
        }
    }

    /// Column header name used for by-name mapping and the name header line.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fixed-width placement.
    #[must_use]
    pub fn at(mut self, start: usize, length: usize) -> Self {
        self.layout = Some(FixedLayout { start, length });
        self
    }

    /// Decimal scale: rounding target and implied-decimal digits in fixed-width files.
    #[must_use]
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    /// Date/time pattern in `yyyyMMdd` letter style, or a chrono format if it contains `%`.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Whether the field is populated when reading.
    #[must_use]
    pub fn input(mut self, enabled: bool) -> Self {
        self.input = enabled;
        self
    }

    /// Whether the field is emitted when writing.
    #[must_use]
    pub fn output(mut self, enabled: bool) -> Self {
        self.output = enabled;
        self
    }
}

/// Immutable metadata for one record field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    id: u32,
    name: Option<String>,
    layout: Option<FixedLayout>,
    scale: u32,
    round: bool,
    pattern: String,
    chrono_format: String,
    input: bool,
    output: bool,
    kind: FieldKind,
    nullable: bool,
}

impl FieldDescriptor {
    pub fn new(spec: FieldSpec, kind: FieldKind, nullable: bool) -> Self {
        let chrono_format = to_chrono_format(&spec.pattern);
        Self {
            id: spec.id,
            name: spec.name,
            layout: spec.layout,
            scale: spec.scale,
            round: spec.round,
            pattern: spec.pattern,
            chrono_format,
            input: spec.input,
            output: spec.output,
            kind,
            nullable,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn layout(&self) -> Option<FixedLayout> {
        self.layout
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn round(&self) -> bool {
        self.round
    }

    /// The pattern as declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The declared pattern translated to a chrono format string.
    pub fn chrono_format(&self) -> &str {
        &self.chrono_format
    }

    pub fn input(&self) -> bool {
        self.input
    }

    pub fn output(&self) -> bool {
        self.output
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether an empty cell maps to an absent value rather than a zero default.
    pub fn nullable(&self) -> bool {
        self.nullable
    }
}
