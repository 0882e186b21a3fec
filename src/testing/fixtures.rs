//! Sample record types and matching file content.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::flat_record;
use crate::schema::FieldSpec;

/// An equity trade, laid out as `SYMBOL|QTY|PRICE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub qty: i32,
    pub price: Decimal,
}

flat_record!(Trade {
    symbol => FieldSpec::new(0).name("SYMBOL"),
    qty => FieldSpec::new(1).name("QTY"),
    price => FieldSpec::new(2).name("PRICE").scale(2).round(true),
});

/// Pipe-delimited trades with one header row.
pub const SAMPLE_TRADES_PIPE: &str = "SYMBOL|QTY|PRICE\n\
AAPL|100|123.456\n\
MSFT|250|410.10\n\
IBM|75|\n";

/// The records [`SAMPLE_TRADES_PIPE`] decodes to.
#[must_use]
pub fn sample_trades() -> Vec<Trade> {
    vec![
        Trade {
            symbol: "AAPL".to_string(),
            qty: 100,
            price: Decimal::new(12346, 2),
        },
        Trade {
            symbol: "MSFT".to_string(),
            qty: 250,
            price: Decimal::new(41010, 2),
        },
        Trade {
            symbol: "IBM".to_string(),
            qty: 75,
            price: Decimal::ZERO,
        },
    ]
}

/// A settlement instruction in a 32-character fixed-width layout:
///
/// | columns | field      | notes                       |
/// |---------|------------|-----------------------------|
/// | 0..8    | account    | space padded                |
/// | 8..18   | amount     | implied 2 decimals, zero padded |
/// | 18..26  | value date | `yyyyMMdd`, blank when absent |
/// | 26..32  | units      | zero padded                 |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settlement {
    pub account: String,
    pub amount: Decimal,
    pub value_date: Option<NaiveDate>,
    pub units: i64,
}

flat_record!(Settlement {
    account => FieldSpec::new(0).name("ACCOUNT").at(0, 8),
    amount => FieldSpec::new(1).name("AMOUNT").at(8, 10).scale(2),
    value_date => FieldSpec::new(2).name("VALUE_DATE").at(18, 8),
    units => FieldSpec::new(3).name("UNITS").at(26, 6),
});

/// Zero-based fixed-width settlements, newline terminated.
pub const SAMPLE_SETTLEMENTS_FIXED: &str = "ACC00001000123456720240115000042\n\
ACC2    -000000050        000001\n";

/// The records [`SAMPLE_SETTLEMENTS_FIXED`] decodes to.
#[must_use]
pub fn sample_settlements() -> Vec<Settlement> {
    vec![
        Settlement {
            account: "ACC00001".to_string(),
            amount: Decimal::new(1_234_567, 2),
            value_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            units: 42,
        },
        Settlement {
            account: "ACC2".to_string(),
            amount: Decimal::new(-50, 2),
            value_date: None,
            units: 1,
        },
    ]
}
