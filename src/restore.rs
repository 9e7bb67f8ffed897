//! Restoration: turn a page URL and the saved draft back into a selection.
//!
//! Evaluated once per page load, after the catalog index exists. The first
//! source present wins:
//!
//! 1. `?r=` (range), 2. `?d=` (delta, even empty), 3. non-empty `?b=`
//!    (bitset), 4. `#s=` (legacy, compressed), 5. `#s0=` (legacy, plain),
//! 6. the draft, field by field, for whatever the URL did not supply.
//!
//! Nothing here fails outward. Problems are logged and kept on the
//! [`Restoration`] so callers and tests can inspect them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::error::CodecError;
use crate::index::CatalogIndex;
use crate::legacy::LegacyPayload;
use crate::selection::SelectionSet;
use crate::store::{KeyValueStore, SelectionStateStore};
use crate::transport::{normalize_handle, SelectionSource, Transport};

/// Which source the selection was restored from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestoreState {
    /// No selection anywhere; leave the checkboxes alone.
    NoState,
    /// `?r=`.
    RangePresent,
    /// `?d=`.
    DeltaPresent,
    /// `?b=`.
    BitsetPresent,
    /// `#s=`.
    LegacyCompressed,
    /// `#s0=`.
    LegacyPlain,
    /// Selection came from the saved draft.
    DraftOnly,
}

/// The outcome of a restore.
#[derive(Debug)]
pub struct Restoration {
    /// Where the selection came from.
    pub state: RestoreState,
    /// Indices to check, all others unchecked. `None` leaves the current
    /// state untouched; `Some` of an empty set clears everything.
    pub selection: Option<SelectionSet>,
    /// Display name to fill in.
    pub name: Option<String>,
    /// Handle to fill in, without its leading `@`.
    pub handle: Option<String>,
    /// URL to install in place of the current one without a history entry.
    pub replace_url: Option<Url>,
    /// Problems that were recovered from.
    pub errors: Vec<CodecError>,
}

impl Restoration {
    fn empty() -> Self {
        Self {
            state: RestoreState::NoState,
            selection: None,
            name: None,
            handle: None,
            replace_url: None,
            errors: Vec::new(),
        }
    }

    /// Checked state per catalog position, or `None` to leave it alone.
    pub fn checked(&self, index: &CatalogIndex) -> Option<Vec<bool>> {
        self.selection.as_ref().map(|s| index.apply(s))
    }

    fn note(&mut self, error: CodecError) {
        tracing::warn!(%error, state = ?self.state, "restore degraded");
        self.errors.push(error);
    }
}

/// Restores selection state against one catalog index.
#[derive(Clone, Copy, Debug)]
pub struct Restorer<'a> {
    index: &'a CatalogIndex,
}

impl<'a> Restorer<'a> {
    /// Restore against `index`.
    pub fn new(index: &'a CatalogIndex) -> Self {
        Self { index }
    }

    /// Restore from the URL alone (steps 1-5).
    pub fn from_transport(&self, transport: &Transport) -> Restoration {
        let mut out = Restoration::empty();
        out.name = transport.name();
        out.handle = transport.handle();

        let source = transport.source();
        if let Some(encoded) = source.encoded() {
            out.state = match &source {
                SelectionSource::Range(_) => RestoreState::RangePresent,
                SelectionSource::Delta(_) => RestoreState::DeltaPresent,
                _ => RestoreState::BitsetPresent,
            };
            let selection = match encoded.decode(self.index.len()) {
                Ok(selection) => selection,
                Err(partial) => {
                    out.note(partial.error);
                    partial.recovered
                }
            };
            out.selection = Some(selection);
            out.replace_url = Some(transport.stripped());
            return out;
        }

        let legacy = match &source {
            SelectionSource::LegacyCompressed(fragment) => {
                out.state = RestoreState::LegacyCompressed;
                LegacyPayload::from_compressed(fragment)
            }
            SelectionSource::LegacyPlain(fragment) => {
                out.state = RestoreState::LegacyPlain;
                LegacyPayload::from_percent_encoded(fragment)
            }
            _ => return out,
        };

        match legacy {
            Ok(payload) => {
                if let Some(name) = &payload.name {
                    out.name = Some(name.clone());
                }
                if let Some(handle) = &payload.handle {
                    out.handle = Some(normalize_handle(handle));
                }
                out.selection = Some(payload.selection(self.index));
            }
            Err(err) => out.note(err),
        }
        out
    }

    /// Full restore: the URL first, then the draft for anything the URL
    /// left unset (step 6).
    ///
    /// The draft's selection is only used when the URL as loaded carried no
    /// selection state at all and the catalog is non-empty.
    pub fn restore<S: KeyValueStore>(
        &self,
        transport: &Transport,
        drafts: &mut SelectionStateStore<S>,
        now: DateTime<Utc>,
    ) -> Restoration {
        let mut out = self.from_transport(transport);

        let draft = match drafts.load(now) {
            Ok(Some(draft)) => draft,
            Ok(None) => return out,
            Err(err) => {
                out.note(err);
                return out;
            }
        };

        if out.name.is_none() {
            out.name = Some(draft.name.clone());
        }
        if out.handle.is_none() {
            out.handle = Some(normalize_handle(&draft.handle));
        }

        if transport.has_selection_state() || self.index.is_empty() {
            return out;
        }
        let Some(encoded) = draft.encoded() else {
            if !draft.mode.is_empty() {
                out.note(CodecError::invalid_token(&draft.mode, 0));
            }
            return out;
        };

        out.state = RestoreState::DraftOnly;
        out.selection = Some(match encoded.decode(self.index.len()) {
            Ok(selection) => selection,
            Err(partial) => {
                out.note(partial.error);
                partial.recovered
            }
        });
        out
    }
}
