//! Cleanup of numeric cells exported by spreadsheets and mainframe reports.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How embedded minus signs are treated before numeric parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericCleanup {
    /// Strip every `-` that is neither leading, trailing, nor an exponent sign
    /// (`"1234-5678"` becomes `"12345678"`).
    #[default]
    Legacy,
    /// Reject cells with such a `-` instead of guessing.
    Strict,
}

static PLAIN_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("numeric pattern is valid")
});

/// Normalize a trimmed numeric cell.
///
/// Removes thousands separators, `$` and spaces, and moves a trailing sign to
/// the front. `Ok(None)` means the cell is empty or the literal `null`.
///
/// ```
/// use ironflat::coerce::{clean_number, NumericCleanup};
///
/// let clean = |s| clean_number(s, NumericCleanup::Legacy).unwrap();
/// assert_eq!(clean("1,234.50").as_deref(), Some("1234.50"));
/// assert_eq!(clean("$99").as_deref(), Some("99"));
/// assert_eq!(clean("100-").as_deref(), Some("-100"));
/// assert_eq!(clean("3.0E-4").as_deref(), Some("3.0E-4"));
/// ```
///
/// # Errors
/// In [`NumericCleanup::Strict`] mode, returns a reason when the cell has a
/// stray `-` or is otherwise not a plain number.
pub fn clean_number(raw: &str, mode: NumericCleanup) -> Result<Option<String>, String> {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();

    let cleaned = if let Some(body) = stripped.strip_suffix('-') {
        if mode == NumericCleanup::Strict && body.contains('-') {
            return Err(format!("ambiguous minus signs in <{raw}>"));
        }
        format!("-{}", body.replace('-', ""))
    } else {
        let mut out = String::with_capacity(stripped.len());
        let mut prev: Option<char> = None;
        for (idx, c) in stripped.chars().enumerate() {
            let keep = c != '-' || idx == 0 || matches!(prev, Some('E' | 'e'));
            if keep {
                out.push(c);
            } else if mode == NumericCleanup::Strict {
                return Err(format!("embedded minus sign in <{raw}>"));
            }
            prev = Some(c);
        }
        out
    };

    if cleaned.is_empty() || cleaned == "null" {
        return Ok(None);
    }
    if mode == NumericCleanup::Strict && !PLAIN_NUMBER.is_match(&cleaned) {
        return Err(format!("<{raw}> is not a plain number"));
    }
    Ok(Some(cleaned))
}
