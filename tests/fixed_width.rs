// tests/fixed_width.rs

use anyhow::Result;
use chrono::NaiveDate;
use ironflat::coerce::ValueCoercer;
use ironflat::flat_record;
use ironflat::io::{FixedWidthCodec, FixedWidthOptions, StartBase};
use ironflat::marshal::Marshaller;
use ironflat::schema::{FieldSpec, SchemaRegistry};
use ironflat::testing::{
    SAMPLE_SETTLEMENTS_FIXED, Settlement, assert_conversion_error, assert_records_equal,
    assert_round_trip, sample_settlements,
};
use ironflat::MarshalError;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default, PartialEq)]
struct Amount {
    value: Decimal,
}

flat_record!(Amount {
    value => FieldSpec::new(0).at(0, 6).scale(2),
});

#[derive(Debug, Clone, Default, PartialEq)]
struct Units {
    whole: i32,
    ratio: f64,
}

flat_record!(Units {
    whole => FieldSpec::new(0).at(0, 5).scale(2),
    ratio => FieldSpec::new(1).at(5, 6).scale(3),
});

#[derive(Debug, Clone, Default, PartialEq)]
struct OneBased {
    code: String,
    qty: i32,
}

flat_record!(OneBased {
    code => FieldSpec::new(0).at(1, 3),
    qty => FieldSpec::new(1).at(4, 5),
});

#[derive(Debug, Clone, Default, PartialEq)]
struct Audited {
    id: String,
    loaded_by: String,
    secret: String,
}

flat_record!(Audited {
    id => FieldSpec::new(0).at(0, 4),
    loaded_by => FieldSpec::new(1).at(4, 4).input(false),
    secret => FieldSpec::new(2).at(8, 4).output(false),
});

fn amount(mantissa: i64, scale: u32) -> Amount {
    Amount {
        value: Decimal::new(mantissa, scale),
    }
}

#[test]
fn sample_content_decodes_and_packs_back() -> Result<()> {
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::default();

    let settlements: Vec<Settlement> = marshaller.to_list(&codec, SAMPLE_SETTLEMENTS_FIXED)?;
    assert_records_equal(&settlements, &sample_settlements());
    assert_eq!(settlements[0].value_date, NaiveDate::from_ymd_opt(2024, 1, 15));

    assert_eq!(marshaller.to_text(&codec, &settlements)?, SAMPLE_SETTLEMENTS_FIXED);
    Ok(())
}

#[test]
fn implied_decimals_round_trip_exactly() -> Result<()> {
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::default();
    let schema = marshaller.schema::<Amount>()?;
    let coercer = marshaller.coercer();

    assert_eq!(codec.pack_line(&amount(123_456, 2), &schema, coercer)?, "123456");
    assert_eq!(codec.pack_line(&amount(123, 1), &schema, coercer)?, "001230");
    assert_eq!(codec.pack_line(&amount(-5, 0), &schema, coercer)?, "-00500");
    assert_eq!(codec.pack_line(&amount(10_005, 3), &schema, coercer)?, "001001");

    let parsed: Amount = codec.parse_line("123456", &schema, coercer)?;
    assert_eq!(parsed, amount(123_456, 2));
    assert_eq!(parsed.value.to_string(), "1234.56");

    let explicit: Amount = codec.parse_line("  1.50", &schema, coercer)?;
    assert_eq!(explicit, amount(150, 2));

    assert_round_trip(&marshaller, &codec, &[amount(123_456, 2), amount(-99, 2), amount(0, 0)]);
    Ok(())
}

#[test]
fn overflow_fails_the_whole_write() -> Result<()> {
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::default();
    let schema = marshaller.schema::<Amount>()?;

    let Err(err) = codec.pack_line(&amount(1_234_567, 2), &schema, marshaller.coercer()) else {
        panic!("1234567 does not fit in 6 characters");
    };
    let overflow = err.as_overflow().expect("overflow error");
    assert_eq!(overflow.field_id, 0);
    assert_eq!(overflow.value, "1234567");
    assert_eq!(overflow.length, 6);

    let Err(err) = marshaller.to_text(&codec, &[amount(1, 2), amount(-123_456, 2)]) else {
        panic!("-123456 does not fit in 6 characters");
    };
    assert_eq!(err.as_overflow().and_then(|o| o.line), Some(2));
    Ok(())
}

#[test]
fn short_lines_leave_trailing_fields_unset() -> Result<()> {
    let codec = FixedWidthCodec::default();
    let schema = SchemaRegistry::new().schema::<Settlement>()?;
    let parsed: Settlement = codec.parse_line("ACC00001000123", &schema, &ValueCoercer::default())?;

    assert_eq!(
        parsed,
        Settlement {
            account: "ACC00001".into(),
            ..Settlement::default()
        }
    );
    Ok(())
}

#[test]
fn integers_must_divide_by_their_implied_scale() -> Result<()> {
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::default();

    let units: Vec<Units> = marshaller.to_list(&codec, "00500012500\n")?;
    assert_eq!(units, vec![Units { whole: 5, ratio: 12.5 }]);
    assert_eq!(marshaller.to_text(&codec, &units)?, "00500012500\n");

    let Err(err) = marshaller.to_list::<Units, _>(&codec, "00500012500\n00550000000\n") else {
        panic!("550 is not a whole number at scale 2");
    };
    assert_conversion_error(&err, 0, Some(2));
    Ok(())
}

#[test]
fn one_based_starts_apply_to_read_and_pack() -> Result<()> {
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::new(FixedWidthOptions {
        start_base: StartBase::One,
        ..FixedWidthOptions::default()
    });
    let schema = marshaller.schema::<OneBased>()?;
    assert_eq!(codec.line_width(&schema)?, 8);

    let record = OneBased {
        code: "ABC".into(),
        qty: 42,
    };
    assert_eq!(codec.pack_line(&record, &schema, marshaller.coercer())?, "ABC00042");
    assert_eq!(codec.parse_line("ABC00042", &schema, marshaller.coercer())?, record);

    let zero_based = FixedWidthCodec::default();
    assert_eq!(zero_based.line_width(&schema)?, 9);
    assert_eq!(zero_based.pack_line(&record, &schema, marshaller.coercer())?, " ABC00042");
    Ok(())
}

#[test]
fn one_based_codec_rejects_a_zero_start() -> Result<()> {
    let codec = FixedWidthCodec::new(FixedWidthOptions {
        start_base: StartBase::One,
        ..FixedWidthOptions::default()
    });
    let schema = SchemaRegistry::new().schema::<Amount>()?;
    assert!(matches!(codec.line_width(&schema), Err(MarshalError::Config(_))));
    Ok(())
}

#[test]
fn header_and_trailer_lines_are_skipped() -> Result<()> {
    let codec = FixedWidthCodec::new(FixedWidthOptions {
        header_rows: 1,
        trailer_rows: 1,
        ..FixedWidthOptions::default()
    });
    let content = format!("HDR20240115\n{SAMPLE_SETTLEMENTS_FIXED}TRL0000000002\n");
    let settlements: Vec<Settlement> = Marshaller::new().to_list(&codec, &content)?;
    assert_records_equal(&settlements, &sample_settlements());
    Ok(())
}

#[test]
fn header_and_trailer_counts_include_blank_lines() -> Result<()> {
    let codec = FixedWidthCodec::new(FixedWidthOptions {
        header_rows: 2,
        trailer_rows: 1,
        ..FixedWidthOptions::default()
    });
    let lines: Vec<&str> = SAMPLE_SETTLEMENTS_FIXED.lines().collect();
    let content = format!("HDR20240115\n\n{}\n\n{}\nTRL0000000002\n", lines[0], lines[1]);
    let settlements: Vec<Settlement> = Marshaller::new().to_list(&codec, &content)?;
    assert_records_equal(&settlements, &sample_settlements());
    Ok(())
}

#[test]
fn errors_report_the_physical_line() {
    let content = "HDR\nACC00001000123456720240115000042\nACC00002000000010020241340000001\n";
    let codec = FixedWidthCodec::new(FixedWidthOptions {
        header_rows: 1,
        ..FixedWidthOptions::default()
    });
    let Err(err) = Marshaller::new().to_list::<Settlement, _>(&codec, content) else {
        panic!("month 13 is not a date");
    };
    assert_conversion_error(&err, 2, Some(3));
}

#[test]
fn writing_no_records_is_a_row_shape_error() {
    let result = Marshaller::new().to_text::<Settlement, _>(&FixedWidthCodec::default(), &[]);
    assert!(matches!(result, Err(MarshalError::RowShape(_))));
}

#[test]
fn input_and_output_flags_are_honoured() -> Result<()> {
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::default();

    let parsed: Vec<Audited> = marshaller.to_list(&codec, "A001JDOEpass\n")?;
    assert_eq!(
        parsed,
        vec![Audited {
            id: "A001".into(),
            loaded_by: String::new(),
            secret: "pass".into(),
        }]
    );

    let record = Audited {
        id: "A002".into(),
        loaded_by: "ETL".into(),
        secret: "hide".into(),
    };
    assert_eq!(marshaller.to_text(&codec, &[record])?, "A002ETL     \n");
    Ok(())
}

#[test]
fn offsets_count_characters() -> Result<()> {
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::default();
    let records = vec![Settlement {
        account: "ÉCU-Ø".into(),
        amount: Decimal::new(1, 2),
        value_date: None,
        units: 3,
    }];

    let text = marshaller.to_text(&codec, &records)?;
    assert_eq!(text, "ÉCU-Ø   0000000001        000003\n");
    assert_eq!(text.trim_end().chars().count(), 32);
    assert_round_trip(&marshaller, &codec, &records);
    Ok(())
}
