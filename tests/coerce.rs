// tests/coerce.rs

use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use ironflat::coerce::{
    CoercionOptions, CoercionRegistry, NumericCleanup, TextCoercion, ValueCoercer, clean_number,
};
use ironflat::flat_record;
use ironflat::io::DelimitedCodec;
use ironflat::marshal::Marshaller;
use ironflat::schema::{FieldDescriptor, FieldKind, FieldSpec, FieldType, FieldValue};
use ironflat::testing::assert_conversion_error;
use rust_decimal::Decimal;

fn field(spec: FieldSpec, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor::new(spec, kind, false)
}

fn strict() -> ValueCoercer {
    ValueCoercer::with_options(CoercionOptions {
        numeric_cleanup: NumericCleanup::Strict,
    })
}

#[test]
fn numeric_cleanup_handles_report_formatting() {
    let legacy = |s: &str| clean_number(s, NumericCleanup::Legacy);
    assert_eq!(legacy("1,234.50"), Ok(Some("1234.50".to_string())));
    assert_eq!(legacy("$99"), Ok(Some("99".to_string())));
    assert_eq!(legacy("100-"), Ok(Some("-100".to_string())));
    assert_eq!(legacy("3.0E-4"), Ok(Some("3.0E-4".to_string())));
    assert_eq!(legacy("$ 1 000"), Ok(Some("1000".to_string())));
    assert_eq!(legacy("1234-5678"), Ok(Some("12345678".to_string())));
    assert_eq!(legacy("null"), Ok(None));
    assert_eq!(legacy("$"), Ok(None));
}

#[test]
fn strict_cleanup_rejects_stray_minus_signs() {
    assert!(clean_number("1234-5678", NumericCleanup::Strict).is_err());
    assert!(clean_number("1-0-", NumericCleanup::Strict).is_err());
    assert!(clean_number("12abc", NumericCleanup::Strict).is_err());
    assert_eq!(
        clean_number("1,234-", NumericCleanup::Strict),
        Ok(Some("-1234".to_string()))
    );
}

#[test]
fn empty_and_null_cells_parse_to_null() -> Result<()> {
    let coercer = ValueCoercer::default();
    let qty = field(FieldSpec::new(1).name("QTY"), FieldKind::Integer);
    assert_eq!(coercer.parse("", &qty)?, FieldValue::Null);
    assert_eq!(coercer.parse("   ", &qty)?, FieldValue::Null);
    assert_eq!(coercer.parse("null", &qty)?, FieldValue::Null);

    let date = field(FieldSpec::new(2), FieldKind::Date);
    assert_eq!(coercer.parse(" ", &date)?, FieldValue::Null);
    Ok(())
}

#[test]
fn integers_and_longs_parse_after_cleanup() -> Result<()> {
    let coercer = ValueCoercer::default();
    let int = field(FieldSpec::new(0), FieldKind::Integer);
    let long = field(FieldSpec::new(1), FieldKind::Long);

    assert_eq!(coercer.parse("  1,234 ", &int)?, FieldValue::Integer(1234));
    assert_eq!(coercer.parse("250-", &int)?, FieldValue::Integer(-250));
    assert_eq!(coercer.parse("9,000,000,000", &long)?, FieldValue::Long(9_000_000_000));
    assert_eq!(coercer.parse("1234-5678", &long)?, FieldValue::Long(12_345_678));
    Ok(())
}

#[test]
fn strict_mode_turns_ambiguous_numbers_into_errors() {
    let long = field(FieldSpec::new(4).name("ACCOUNT"), FieldKind::Long);
    let Err(err) = strict().parse("1234-5678", &long) else {
        panic!("strict cleanup must reject an embedded minus");
    };
    assert_conversion_error(&err, 4, None);
    let conversion = err.as_conversion().expect("conversion error");
    assert_eq!(conversion.kind, FieldKind::Long);
    assert_eq!(conversion.raw, "1234-5678");
}

#[test]
fn bad_numbers_report_field_and_kind() {
    let coercer = ValueCoercer::default();
    let qty = field(FieldSpec::new(1).name("QTY"), FieldKind::Integer);
    let Err(err) = coercer.parse("12x", &qty) else {
        panic!("12x is not an integer");
    };
    let conversion = err.as_conversion().expect("conversion error");
    assert_eq!(conversion.field_id, 1);
    assert_eq!(conversion.field_name.as_deref(), Some("QTY"));
    assert_eq!(conversion.raw, "12x");
    assert_eq!(conversion.kind, FieldKind::Integer);

    let message = err.at_line(3).in_file("trades.psv").to_string();
    assert!(message.starts_with("field 1 (QTY): cannot convert <12x> as integer"), "{message}");
    assert!(message.ends_with("at line 3 in trades.psv"), "{message}");
}

#[test]
fn floats_accept_exponents() -> Result<()> {
    let coercer = ValueCoercer::default();
    let double = field(FieldSpec::new(0), FieldKind::Double);
    let float = field(FieldSpec::new(1), FieldKind::Float);
    assert_eq!(coercer.parse("3.0E-4", &double)?, FieldValue::Double(3.0e-4));
    assert_eq!(coercer.parse("-2.5", &float)?, FieldValue::Float(-2.5));
    assert_eq!(coercer.parse("1,000.25", &double)?, FieldValue::Double(1000.25));
    Ok(())
}

#[test]
fn decimals_round_half_up_when_the_field_asks() -> Result<()> {
    let coercer = ValueCoercer::default();
    let rounded = field(FieldSpec::new(0).scale(2).round(true), FieldKind::Decimal);
    let exact = field(FieldSpec::new(1).scale(2), FieldKind::Decimal);

    assert_eq!(coercer.parse("123.456", &rounded)?, FieldValue::Decimal(Decimal::new(12346, 2)));
    assert_eq!(coercer.parse("0.125", &rounded)?, FieldValue::Decimal(Decimal::new(13, 2)));
    assert_eq!(coercer.parse("-1.005", &rounded)?, FieldValue::Decimal(Decimal::new(-101, 2)));
    assert_eq!(coercer.parse("123.456", &exact)?, FieldValue::Decimal(Decimal::new(123_456, 3)));
    assert_eq!(coercer.parse("1.5E2", &exact)?, FieldValue::Decimal(Decimal::new(150, 0)));
    Ok(())
}

#[test]
fn decimals_format_as_plain_strings() -> Result<()> {
    let coercer = ValueCoercer::default();
    let price = field(FieldSpec::new(0).scale(2), FieldKind::Decimal);
    let value = FieldValue::Decimal(Decimal::new(25, 1));

    assert_eq!(coercer.format(&value, &price, false)?, "2.5");
    assert_eq!(coercer.format(&value, &price, true)?, "2.50");
    assert_eq!(
        coercer.format(&FieldValue::Decimal(Decimal::new(1_234_565, 4)), &price, true)?,
        "123.46"
    );
    assert_eq!(coercer.format(&FieldValue::Null, &price, true)?, "");

    let rate = field(FieldSpec::new(1).scale(1), FieldKind::Double);
    assert_eq!(coercer.format(&FieldValue::Double(0.1), &rate, false)?, "0.1");
    assert_eq!(coercer.format(&FieldValue::Double(2.25), &rate, true)?, "2.3");
    Ok(())
}

#[test]
fn format_rejects_values_of_the_wrong_kind() {
    let coercer = ValueCoercer::default();
    let qty = field(FieldSpec::new(1), FieldKind::Integer);
    assert!(coercer.format(&FieldValue::String("ten".into()), &qty, false).is_err());
}

#[test]
fn dates_use_the_field_pattern() -> Result<()> {
    let coercer = ValueCoercer::default();
    let default_date = field(FieldSpec::new(0), FieldKind::Date);
    let named_month = field(FieldSpec::new(1).pattern("dd-MMM-yyyy"), FieldKind::Date);
    let jan15 = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");

    assert_eq!(coercer.parse("20240115", &default_date)?, FieldValue::Date(jan15));
    assert_eq!(coercer.parse("15-JAN-2024", &named_month)?, FieldValue::Date(jan15));
    assert_eq!(coercer.parse("15-jan-2024", &named_month)?, FieldValue::Date(jan15));
    assert_eq!(coercer.format(&FieldValue::Date(jan15), &named_month, false)?, "15-Jan-2024");
    assert!(coercer.parse("2024-13-01", &default_date).is_err());
    Ok(())
}

#[test]
fn date_times_fall_back_to_midnight_for_date_patterns() -> Result<()> {
    let coercer = ValueCoercer::default();
    let stamp = field(FieldSpec::new(0).pattern("yyyy-MM-dd'T'HH:mm:ss"), FieldKind::DateTime);
    let day = field(FieldSpec::new(1), FieldKind::DateTime);
    let jan15 = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");

    let expected = jan15.and_hms_opt(10, 30, 5).expect("valid time");
    assert_eq!(coercer.parse("2024-01-15T10:30:05", &stamp)?, FieldValue::DateTime(expected));
    assert_eq!(coercer.format(&FieldValue::DateTime(expected), &stamp, false)?, "2024-01-15T10:30:05");

    let midnight = jan15.and_hms_opt(0, 0, 0).expect("valid time");
    assert_eq!(coercer.parse("20240115", &day)?, FieldValue::DateTime(midnight));
    Ok(())
}

#[test]
fn kinds_without_a_coercion_fail_to_parse() {
    let coercer = ValueCoercer::new(CoercionRegistry::empty(), CoercionOptions::default());
    let name = field(FieldSpec::new(0), FieldKind::String);
    let Err(err) = coercer.parse("x", &name) else {
        panic!("an empty registry has no string coercion");
    };
    assert!(err.to_string().contains("no coercion registered"), "{err}");
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Host(Option<Ipv4Addr>);

impl FieldType for Host {
    const KIND: FieldKind = FieldKind::Custom("ipv4");
    const NULLABLE: bool = true;

    fn to_value(&self) -> FieldValue {
        self.0.map_or(FieldValue::Null, FieldValue::custom)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(Host(None)),
            other => other.custom_ref::<Ipv4Addr>().copied().map(|a| Host(Some(a))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Endpoint {
    name: String,
    host: Host,
}

flat_record!(Endpoint {
    name => FieldSpec::new(0).name("NAME"),
    host => FieldSpec::new(1).name("HOST"),
});

fn ipv4_marshaller() -> Marshaller {
    let mut marshaller = Marshaller::new();
    marshaller
        .coercer_mut()
        .registry_mut()
        .register(FieldKind::Custom("ipv4"), Arc::new(TextCoercion::<Ipv4Addr>::new()));
    marshaller
}

#[test]
fn custom_kinds_parse_through_from_str() -> Result<()> {
    let marshaller = ipv4_marshaller();
    let codec = DelimitedCodec::default();
    let endpoints: Vec<Endpoint> = marshaller.to_list(&codec, "NAME,HOST\napi,10.0.0.1\nspare,\n")?;

    assert_eq!(endpoints[0].host, Host(Some(Ipv4Addr::new(10, 0, 0, 1))));
    assert_eq!(endpoints[1].host, Host(None));
    assert_eq!(marshaller.to_text(&codec, &endpoints)?, "NAME,HOST\r\napi,10.0.0.1\r\nspare,\r\n");
    Ok(())
}

#[test]
fn custom_kind_errors_carry_the_line() {
    let marshaller = ipv4_marshaller();
    let Err(err) = marshaller.to_list::<Endpoint, _>(&DelimitedCodec::default(), "NAME,HOST\napi,10.0.0.300\n") else {
        panic!("10.0.0.300 is not an address");
    };
    assert_conversion_error(&err, 1, Some(2));
}

#[test]
fn unregistered_custom_kinds_fail() {
    let Err(err) = Marshaller::new().to_list::<Endpoint, _>(&DelimitedCodec::default(), "NAME,HOST\napi,10.0.0.1\n") else {
        panic!("ipv4 is not registered");
    };
    assert_conversion_error(&err, 1, Some(2));
}
