//! Serializable option sets for the codecs and the coercer.
//!
//! Every section and field is optional in JSON; missing values take the
//! defaults below.
//!
//! ```
//! use ironflat::config::MarshalConfig;
//! use ironflat::io::StartBase;
//!
//! let config = MarshalConfig::from_json_str(
//!     r#"{ "delimited": { "delimiter": "|" }, "fixed_width": { "start_base": "one" } }"#,
//! ).unwrap();
//! assert_eq!(config.delimited.delimiter, Some('|'));
//! assert_eq!(config.delimited.header_rows, 1);
//! assert_eq!(config.fixed_width.start_base, StartBase::One);
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::coerce::CoercionOptions;
use crate::error::{MarshalError, MarshalResult};
use crate::io::files::read_text;
use crate::io::{DelimitedCodec, DelimitedOptions, FixedWidthCodec, FixedWidthOptions};
use crate::marshal::Marshaller;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalConfig {
    pub delimited: DelimitedOptions,
    pub fixed_width: FixedWidthOptions,
    pub coercion: CoercionOptions,
}

impl MarshalConfig {
    /// # Errors
    /// [`MarshalError::Config`] on malformed JSON or unknown enum values.
    pub fn from_json_str(json: &str) -> MarshalResult<Self> {
        serde_json::from_str(json).map_err(|e| MarshalError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_text(path)?;
        Self::from_json_str(&text).with_context(|| format!("load config {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> MarshalResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MarshalError::Config(e.to_string()))
    }

    pub fn delimited_codec(&self) -> DelimitedCodec {
        DelimitedCodec::new(self.delimited.clone())
    }

    pub fn fixed_width_codec(&self) -> FixedWidthCodec {
        FixedWidthCodec::new(self.fixed_width.clone())
    }

    pub fn marshaller(&self) -> Marshaller {
        Marshaller::from_config(self)
    }
}
