//! Assertions for marshaled records and marshaling errors.

use std::fmt::Debug;

use crate::error::MarshalError;
use crate::marshal::{Marshaller, RecordCodec};
use crate::schema::Record;

/// Assert that two record lists are equal in order and content.
///
/// # Panics
/// Panics on a length or element mismatch, naming the first differing index.
pub fn assert_records_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "record count mismatch:\n  expected: {expected:?}\n  actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(a, e, "record {i} differs:\n  expected: {e:?}\n  actual: {a:?}");
    }
}

/// Encode `records` with `codec`, decode the text again, and assert the result
/// equals the input.
///
/// # Panics
/// Panics if either direction fails or the decoded records differ.
pub fn assert_round_trip<T, C>(marshaller: &Marshaller, codec: &C, records: &[T])
where
    T: Record + Debug + PartialEq,
    C: RecordCodec,
{
    let text = match marshaller.to_text(codec, records) {
        Ok(text) => text,
        Err(e) => panic!("encode failed: {e}"),
    };
    let decoded: Vec<T> = match marshaller.to_list(codec, &text) {
        Ok(decoded) => decoded,
        Err(e) => panic!("decode failed: {e}\n  text: {text:?}"),
    };
    assert_records_equal(&decoded, records);
}

/// Assert that `err` is a conversion error for `field_id`, reported at `line`
/// when one is given.
///
/// # Panics
/// Panics when `err` is another kind of error or names another field or line.
pub fn assert_conversion_error(err: &MarshalError, field_id: u32, line: Option<u64>) {
    let Some(conversion) = err.as_conversion() else {
        panic!("expected a field conversion error, got: {err}");
    };
    assert_eq!(conversion.field_id, field_id, "wrong field in: {err}");
    if line.is_some() {
        assert_eq!(conversion.line, line, "wrong line in: {err}");
    }
}
