//! Durable draft of the current selection, name and handle.
//!
//! The draft is one JSON record `{t, n, x, m, p}` under a fixed key. It
//! expires `ttl` after `t` and is dropped the next time it is read.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DraftConfig;
use crate::error::CodecError;
use crate::index::CatalogIndex;
use crate::select::{encode_shortest, EncodedPayload};
use crate::selection::SelectionSet;
use crate::transport::display_handle;
use crate::EncodingMode;

/// String key/value storage, the shape of a browser's local storage.
pub trait KeyValueStore {
    /// Read `key`, `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, CodecError>;

    /// Write `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CodecError>;

    /// Delete `key`; absent keys are not an error.
    fn remove(&mut self, key: &str) -> Result<(), CodecError>;
}

/// In-process store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CodecError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CodecError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CodecError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store files under `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CodecError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CodecError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CodecError> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CodecError> {
        match std::fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// The persisted draft.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    /// Save time, epoch milliseconds.
    #[serde(rename = "t", default)]
    pub saved_at: i64,
    /// Display name.
    #[serde(rename = "n", default)]
    pub name: String,
    /// Handle with its leading `@`.
    #[serde(rename = "x", default)]
    pub handle: String,
    /// Encoding tag, empty when no selection was captured.
    #[serde(rename = "m", default)]
    pub mode: String,
    /// Encoded selection.
    #[serde(rename = "p", default)]
    pub payload: String,
}

impl DraftRecord {
    /// Snapshot the current state. The selection is only captured once the
    /// catalog index exists.
    pub fn capture(
        index: &CatalogIndex,
        selection: &SelectionSet,
        name: &str,
        handle: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let (mode, payload) = if index.is_empty() {
            (String::new(), String::new())
        } else {
            let encoded = encode_shortest(selection, index.len());
            (encoded.mode.tag().to_string(), encoded.payload)
        };

        Self {
            saved_at: now.timestamp_millis(),
            name: name.trim().to_string(),
            handle: display_handle(handle),
            mode,
            payload,
        }
    }

    /// Whether more than `ttl` has passed since the save.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.timestamp_millis().saturating_sub(self.saved_at) > ttl.num_milliseconds()
    }

    /// The stored selection, if one was captured with a known mode.
    pub fn encoded(&self) -> Option<EncodedPayload> {
        EncodingMode::from_tag(&self.mode).map(|mode| EncodedPayload {
            mode,
            payload: self.payload.clone(),
        })
    }
}

/// Reads and writes the draft record under its configured key.
#[derive(Debug)]
pub struct SelectionStateStore<S> {
    store: S,
    key: String,
    ttl: Duration,
}

impl<S: KeyValueStore> SelectionStateStore<S> {
    /// Wrap `store` with the key and TTL from `config`.
    pub fn new(store: S, config: &DraftConfig) -> Self {
        Self {
            store,
            key: config.key.clone(),
            ttl: config.ttl(),
        }
    }

    /// The underlying store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Overwrite the draft.
    pub fn save(&mut self, record: &DraftRecord) -> Result<(), CodecError> {
        let json = serde_json::to_string(record)?;
        self.store.set(&self.key, &json)
    }

    /// Read the draft. Expired drafts are removed and read as absent, as
    /// are drafts without a save time.
    pub fn load(&mut self, now: DateTime<Utc>) -> Result<Option<DraftRecord>, CodecError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };

        let record: DraftRecord = serde_json::from_str(&raw)?;
        if record.saved_at == 0 {
            return Ok(None);
        }
        if record.is_expired(now, self.ttl) {
            tracing::debug!(saved_at = record.saved_at, "draft expired, removing");
            self.store.remove(&self.key)?;
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Delete the draft.
    pub fn clear(&mut self) -> Result<(), CodecError> {
        self.store.remove(&self.key)
    }
}

/// Coalesces free-text edits and writes selection changes straight away.
///
/// Persistence failures are logged and dropped; the draft is a convenience.
#[derive(Debug)]
pub struct DraftWriter {
    debounce: Duration,
    pending: Option<(DateTime<Utc>, DraftRecord)>,
}

impl DraftWriter {
    /// Writer with the debounce window from `config`.
    pub fn new(config: &DraftConfig) -> Self {
        Self {
            debounce: config.debounce(),
            pending: None,
        }
    }

    /// Queue a text edit. Replaces anything queued and restarts the window.
    pub fn schedule(&mut self, record: DraftRecord, now: DateTime<Utc>) {
        let due = now
            .checked_add_signed(self.debounce)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.pending = Some((due, record));
    }

    /// Whether a write is queued.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Write the queued record if its window has elapsed. Returns whether
    /// a write succeeded.
    pub fn poll<S: KeyValueStore>(
        &mut self,
        store: &mut SelectionStateStore<S>,
        now: DateTime<Utc>,
    ) -> bool {
        match &self.pending {
            Some((due, _)) if *due <= now => {}
            _ => return false,
        }
        match self.pending.take() {
            Some((_, record)) => Self::write(store, &record),
            None => false,
        }
    }

    /// Write `record` now, superseding anything queued.
    pub fn write_now<S: KeyValueStore>(
        &mut self,
        store: &mut SelectionStateStore<S>,
        record: &DraftRecord,
    ) -> bool {
        self.pending = None;
        Self::write(store, record)
    }

    fn write<S: KeyValueStore>(store: &mut SelectionStateStore<S>, record: &DraftRecord) -> bool {
        match store.save(record) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "draft not saved");
                false
            }
        }
    }
}
