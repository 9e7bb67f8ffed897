//! Selection state codec.
//!
//! `selcodec` turns a subset of an ordered catalog (which concert dates a
//! user attended) into a short URL-safe string and back. Every catalog item
//! gets a *tiny index*, its position in the flattened catalog; a selection
//! is a set of tiny indices.
//!
//! # Encodings
//!
//! - **Range** (`r`): `0-2,7`. Few contiguous runs.
//! - **Delta** (`d`): `0.2.2.2`, base 36. Small regular gaps.
//! - **Bitset** (`b`): one bit per item, base64url. Length bounded by the
//!   catalog size, whatever the selection looks like.
//!
//! [`encode_shortest`] runs all three and keeps the shortest, preferring
//! range, then delta, then bitset on ties.
//!
//! # Restoring
//!
//! [`Restorer`] reads a page URL (current query parameters or the legacy
//! `#s=` / `#s0=` fragments) and falls back to a locally saved draft. It
//! never fails outward: malformed input degrades to a partial or empty
//! selection, with the reasons kept on the result.
//!
//! # Example
//!
//! ```rust
//! use selcodec::{encode_shortest, EncodingMode, SelectionSet};
//!
//! let selection: SelectionSet = (0u32..100).chain([400]).collect();
//! let encoded = encode_shortest(&selection, 1000);
//! assert_eq!(encoded.mode, EncodingMode::Range);
//! assert_eq!(encoded.payload, "0-99,400");
//!
//! let decoded = encoded.decode(1000).unwrap();
//! assert_eq!(decoded, selection);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::fmt;

use serde::{Deserialize, Serialize};

mod bitset;
mod catalog;
mod config;
mod delta;
mod error;
mod index;
mod legacy;
pub mod lz;
mod range;
mod restore;
mod select;
mod selection;
mod store;
mod traits;
pub mod transport;

pub use bitset::BitsetEncoder;
pub use catalog::{Catalog, CatalogItem, Series, Show, TimeSlot, YearGroup, YearLabel};
pub use config::{CodecConfig, DraftConfig};
pub use delta::DeltaEncoder;
pub use error::{CodecError, PartialDecode};
pub use index::{CatalogIndex, CollisionPolicy};
pub use legacy::LegacyPayload;
pub use range::RangeEncoder;
pub use restore::{RestoreState, Restoration, Restorer};
pub use select::{decode, encode_shortest, EncodedPayload};
pub use selection::SelectionSet;
pub use store::{DraftRecord, DraftWriter, FileStore, KeyValueStore, MemoryStore, SelectionStateStore};
pub use traits::SelectionEncoder;
pub use transport::{share_url, SelectionSource, Transport};

/// Which encoder produced a payload; doubles as its query parameter name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingMode {
    /// Run-length ranges, `r`.
    #[serde(rename = "r")]
    Range,
    /// Base-36 gaps, `d`.
    #[serde(rename = "d")]
    Delta,
    /// Packed bits, `b`.
    #[serde(rename = "b")]
    Bitset,
}

impl EncodingMode {
    /// All modes in tie-break order.
    pub const ALL: [EncodingMode; 3] = [EncodingMode::Range, EncodingMode::Delta, EncodingMode::Bitset];

    /// Query parameter name.
    pub fn tag(self) -> &'static str {
        match self {
            EncodingMode::Range => "r",
            EncodingMode::Delta => "d",
            EncodingMode::Bitset => "b",
        }
    }

    /// Parse a query parameter name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.tag() == tag)
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
