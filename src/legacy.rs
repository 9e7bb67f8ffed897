//! Decode-only support for the version-1 fragment payload
//! `{"v":1,"n":name,"x":handle,"c":[key,...]}`.
//!
//! Items are matched by per-item keys rather than tiny indices, so these
//! links keep working across catalog reorderings.

use std::collections::HashSet;

use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::error::CodecError;
use crate::index::CatalogIndex;
use crate::lz;
use crate::selection::SelectionSet;

/// A parsed version-1 payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegacyPayload {
    /// Display name, if the payload carried a string.
    pub name: Option<String>,
    /// Social handle, as stored (may carry a leading `@`).
    pub handle: Option<String>,
    /// Item keys, either normalized legacy keys or numeric short ids.
    pub keys: HashSet<String>,
}

impl LegacyPayload {
    /// Parse the JSON form.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let value: Value = serde_json::from_str(json)?;
        let object = value
            .as_object()
            .ok_or_else(|| CodecError::legacy("payload is not an object"))?;

        match object.get("v").and_then(Value::as_u64) {
            Some(1) => {}
            other => {
                return Err(CodecError::legacy(format!(
                    "unsupported payload version {:?}",
                    other
                )))
            }
        }

        let text = |field: &str| object.get(field).and_then(Value::as_str).map(str::to_string);
        let keys = object
            .get("c")
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name: text("n"),
            handle: text("x"),
            keys,
        })
    }

    /// Parse an `s=` fragment value.
    pub fn from_compressed(fragment: &str) -> Result<Self, CodecError> {
        let json = lz::decompress_from_encoded_uri_component(fragment)
            .filter(|json| !json.is_empty())
            .ok_or_else(|| CodecError::legacy("fragment does not decompress"))?;
        Self::from_json(&json)
    }

    /// Parse an `s0=` fragment value.
    pub fn from_percent_encoded(fragment: &str) -> Result<Self, CodecError> {
        let json = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|err| CodecError::legacy(format!("fragment is not utf-8: {}", err)))?;
        Self::from_json(&json)
    }

    /// Whether the item at `position` is named by this payload.
    fn names(&self, index: &CatalogIndex, position: usize) -> bool {
        index.items().get(position).is_some_and(|item| {
            self.keys.contains(&item.legacy_key()) || self.keys.contains(&item.legacy_short_id())
        })
    }

    /// Tiny indices of every catalog item this payload names.
    pub fn selection(&self, index: &CatalogIndex) -> SelectionSet {
        (0..index.len())
            .filter(|&position| self.names(index, position))
            .filter_map(|position| index.index_at(position))
            .collect()
    }
}
