// tests/marshal.rs

use anyhow::Result;
use ironflat::flat_record;
use ironflat::io::{DelimitedCodec, FixedWidthCodec};
use ironflat::marshal::Marshaller;
use ironflat::schema::{FieldSpec, Record, SchemaBuilder};
use ironflat::testing::{
    SAMPLE_SETTLEMENTS_FIXED, SAMPLE_TRADES_PIPE, Settlement, TempDirPath, Trade,
    assert_records_equal, mock_flat_file, read_flat_output, sample_settlements, sample_trades,
};
use ironflat::MarshalError;
use rust_decimal::Decimal;

#[derive(Debug, Default)]
struct Nothing;

impl Record for Nothing {
    fn declare(_: &mut SchemaBuilder<Self>) {}
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Quote {
    symbol: String,
    bid: Option<Decimal>,
}

flat_record!(Quote {
    symbol => FieldSpec::new(0).name("SYMBOL"),
    bid => FieldSpec::new(1).name("BID").scale(4),
});

#[test]
fn to_map_keeps_the_last_record_per_key() -> Result<()> {
    let content = "SYMBOL|QTY|PRICE\nAAPL|1|1\nMSFT|2|2\nAAPL|3|3\n";
    let by_symbol = Marshaller::new().to_map(&DelimitedCodec::default(), content, |t: &Trade| {
        t.symbol.clone()
    })?;

    assert_eq!(by_symbol.len(), 2);
    assert_eq!(by_symbol["AAPL"].qty, 3);
    assert_eq!(by_symbol["MSFT"].price, Decimal::new(2, 0));
    Ok(())
}

#[test]
fn to_map_works_for_fixed_width() -> Result<()> {
    let by_account = Marshaller::new().to_map(
        &FixedWidthCodec::default(),
        SAMPLE_SETTLEMENTS_FIXED,
        |s: &Settlement| s.account.clone(),
    )?;
    assert_eq!(by_account.len(), 2);
    assert_eq!(by_account["ACC2"].amount, Decimal::new(-50, 2));
    Ok(())
}

#[test]
fn records_without_fields_decode_to_defaults() -> Result<()> {
    let rows: Vec<Nothing> = Marshaller::new().to_list(&DelimitedCodec::default(), SAMPLE_TRADES_PIPE)?;
    assert_eq!(rows.len(), 3);
    Ok(())
}

#[test]
fn nullable_members_decode_empty_cells_as_none() -> Result<()> {
    let quotes: Vec<Quote> =
        Marshaller::new().to_list(&DelimitedCodec::default(), "SYMBOL,BID\nAAPL,\nMSFT,null\nIBM,$1.25\n")?;
    assert_records_equal(
        &quotes,
        &[
            Quote { symbol: "AAPL".into(), bid: None },
            Quote { symbol: "MSFT".into(), bid: None },
            Quote { symbol: "IBM".into(), bid: Some(Decimal::new(125, 2)) },
        ],
    );
    Ok(())
}

#[test]
fn the_schema_is_built_once_per_marshaller() -> Result<()> {
    let marshaller = Marshaller::new();
    let _: Vec<Trade> = marshaller.to_list(&DelimitedCodec::default(), SAMPLE_TRADES_PIPE)?;
    marshaller.to_text(&DelimitedCodec::default(), &sample_trades())?;
    assert_eq!(marshaller.schemas().len(), 1);
    assert!(marshaller.schemas().contains::<Trade>());
    Ok(())
}

#[test]
fn files_round_trip_through_the_marshaller() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("out/nested/trades.csv");
    let marshaller = Marshaller::new();
    let codec = DelimitedCodec::default();

    marshaller.write_file(&codec, &path, &sample_trades())?;
    assert_eq!(
        read_flat_output(&path)?,
        "SYMBOL,QTY,PRICE\r\nAAPL,100,123.46\r\nMSFT,250,410.10\r\nIBM,75,0.00\r\n"
    );

    let trades: Vec<Trade> = marshaller.read_list(&codec, &path)?;
    assert_records_equal(&trades, &sample_trades());

    let by_symbol = marshaller.read_map(&codec, &path, |t: &Trade| t.symbol.clone())?;
    assert_eq!(by_symbol["IBM"].qty, 75);
    Ok(())
}

#[test]
fn fixed_width_files_round_trip() -> Result<()> {
    let file = mock_flat_file(SAMPLE_SETTLEMENTS_FIXED, "dat")?;
    let marshaller = Marshaller::new();
    let codec = FixedWidthCodec::default();

    let settlements: Vec<Settlement> = marshaller.read_list(&codec, file.path())?;
    assert_records_equal(&settlements, &sample_settlements());

    let dir = TempDirPath::new()?;
    let out = dir.file_path("settlements.dat");
    marshaller.write_file(&codec, &out, &settlements)?;
    assert_eq!(read_flat_output(&out)?, SAMPLE_SETTLEMENTS_FIXED);
    Ok(())
}

#[test]
fn file_errors_name_the_file() -> Result<()> {
    let file = mock_flat_file("SYMBOL|QTY|PRICE\nAAPL|many|1\n", "psv")?;
    let Err(err) = Marshaller::new().read_list::<Trade, _>(&DelimitedCodec::default(), file.path()) else {
        panic!("'many' is not a quantity");
    };

    let marshal = err.downcast_ref::<MarshalError>().expect("marshal error inside");
    let conversion = marshal.as_conversion().expect("conversion error");
    assert_eq!(conversion.line, Some(2));
    assert_eq!(conversion.file.as_deref(), Some(file.path().display().to_string().as_str()));
    Ok(())
}

#[test]
fn missing_files_fail_with_the_path() {
    let dir = TempDirPath::new().expect("temp dir");
    let path = dir.file_path("absent.csv");
    let Err(err) = Marshaller::new().read_list::<Trade, _>(&DelimitedCodec::default(), &path) else {
        panic!("the file does not exist");
    };
    assert!(format!("{err:#}").contains("absent.csv"), "{err:#}");
}

#[test]
fn writing_an_empty_fixed_width_file_fails() {
    let dir = TempDirPath::new().expect("temp dir");
    let path = dir.file_path("empty.dat");
    let result = Marshaller::new().write_file::<Settlement, _>(&FixedWidthCodec::default(), &path, &[]);
    assert!(result.is_err());
    assert!(!path.exists());
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_files_are_read_and_written_transparently() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("trades.psv.gz");
    let marshaller = Marshaller::new();
    let codec = DelimitedCodec::new(ironflat::io::DelimitedOptions {
        delimiter: Some('|'),
        ..Default::default()
    });

    marshaller.write_file(&codec, &path, &sample_trades())?;
    let raw = std::fs::read(&path)?;
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let trades: Vec<Trade> = marshaller.read_list(&codec, &path)?;
    assert_records_equal(&trades, &sample_trades());
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn compressed_content_is_detected_without_an_extension() -> Result<()> {
    let dir = TempDirPath::new()?;
    let gz = dir.file_path("trades.psv.gz");
    ironflat::io::files::write_text(&gz, SAMPLE_TRADES_PIPE)?;

    let renamed = dir.file_path("trades.psv");
    std::fs::rename(&gz, &renamed)?;
    let trades: Vec<Trade> = Marshaller::new().read_list(&DelimitedCodec::default(), &renamed)?;
    assert_records_equal(&trades, &sample_trades());
    Ok(())
}

#[cfg(feature = "compression-zstd")]
#[test]
fn zstd_files_round_trip() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("settlements.dat.zst");
    let marshaller = Marshaller::new();
    marshaller.write_file(&FixedWidthCodec::default(), &path, &sample_settlements())?;
    assert_eq!(read_flat_output(&path)?, SAMPLE_SETTLEMENTS_FIXED);
    Ok(())
}
