//! The page URL as a carrier of selection state.
//!
//! Query parameters `r`, `d` and `b` carry the current encodings, `n` and
//! `x` the free-text fields. The fragment may carry a legacy `s=`
//! (compressed) or `s0=` (percent-encoded) payload.

use url::Url;

use crate::error::CodecError;
use crate::select::EncodedPayload;
use crate::EncodingMode;

/// Query parameters that carry a selection and are stripped after restore.
pub const SELECTION_PARAMS: [&str; 3] = ["r", "d", "b"];

/// Display name parameter.
pub const NAME_PARAM: &str = "n";

/// Social handle parameter.
pub const HANDLE_PARAM: &str = "x";

/// Where a selection can come from, in precedence order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionSource {
    /// `?r=`, possibly empty.
    Range(String),
    /// `?d=`, possibly empty.
    Delta(String),
    /// Non-empty `?b=`.
    Bitset(String),
    /// `#s=` fragment.
    LegacyCompressed(String),
    /// `#s0=` fragment.
    LegacyPlain(String),
    /// Nothing selection-shaped in the URL.
    Absent,
}

impl SelectionSource {
    /// The encoding mode and payload for query-borne sources.
    pub fn encoded(&self) -> Option<EncodedPayload> {
        let (mode, payload) = match self {
            SelectionSource::Range(p) => (EncodingMode::Range, p),
            SelectionSource::Delta(p) => (EncodingMode::Delta, p),
            SelectionSource::Bitset(p) => (EncodingMode::Bitset, p),
            _ => return None,
        };
        Some(EncodedPayload {
            mode,
            payload: payload.clone(),
        })
    }
}

/// A parsed page location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transport {
    url: Url,
}

impl Transport {
    /// Parse an absolute URL.
    pub fn parse(href: &str) -> Result<Self, CodecError> {
        Ok(Self::from_url(Url::parse(href)?))
    }

    /// Wrap an already parsed URL.
    pub fn from_url(url: Url) -> Self {
        Self { url }
    }

    /// The URL as loaded.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// First value of query parameter `key`, form-decoded.
    pub fn param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn fragment_value(&self, key: &str) -> Option<&str> {
        self.url
            .fragment()?
            .split('&')
            .find_map(|part| part.strip_prefix(key)?.strip_prefix('='))
            .filter(|value| !value.is_empty())
    }

    /// The selection-bearing part of the URL, first match wins:
    /// `r`, then `d` (even if empty), then non-empty `b`, then `#s=`,
    /// then `#s0=`.
    pub fn source(&self) -> SelectionSource {
        if let Some(r) = self.param("r") {
            return SelectionSource::Range(r);
        }
        if let Some(d) = self.param("d") {
            return SelectionSource::Delta(d);
        }
        if let Some(b) = self.param("b").filter(|b| !b.is_empty()) {
            return SelectionSource::Bitset(b);
        }
        if let Some(s) = self.fragment_value("s") {
            return SelectionSource::LegacyCompressed(s.to_string());
        }
        if let Some(s0) = self.fragment_value("s0") {
            return SelectionSource::LegacyPlain(s0.to_string());
        }
        SelectionSource::Absent
    }

    /// Display name from `n`.
    pub fn name(&self) -> Option<String> {
        self.param(NAME_PARAM)
    }

    /// Handle from `x`, without its leading `@`.
    pub fn handle(&self) -> Option<String> {
        self.param(HANDLE_PARAM).map(|x| normalize_handle(&x))
    }

    /// Whether the URL as loaded carried any selection state: one of the
    /// selection parameters, or any fragment at all.
    pub fn has_selection_state(&self) -> bool {
        self.url
            .query_pairs()
            .any(|(k, _)| SELECTION_PARAMS.contains(&k.as_ref()))
            || self.url.fragment().is_some_and(|f| !f.is_empty())
    }

    /// The URL with selection parameters removed; name, handle, other
    /// parameters and the fragment are kept.
    pub fn stripped(&self) -> Url {
        let mut url = self.url.clone();
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| !SELECTION_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        url
    }
}

/// Trim and drop one leading `@`; the stored form of a handle.
pub fn normalize_handle(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
}

/// The shared form of a handle: `@` + stored form, or empty.
pub fn display_handle(raw: &str) -> String {
    let handle = normalize_handle(raw);
    if handle.is_empty() {
        handle
    } else {
        format!("@{}", handle)
    }
}

/// Build a share link on `base` (its query and fragment are dropped).
///
/// The selection parameter is always written, even when empty, so the
/// receiver clears its checkboxes instead of keeping its own state.
pub fn share_url(base: &Url, encoded: &EncodedPayload, name: &str, handle: &str) -> Url {
    let mut url = base.clone();
    url.set_fragment(None);
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(encoded.mode.tag(), &encoded.payload);
        let name = name.trim();
        if !name.is_empty() {
            pairs.append_pair(NAME_PARAM, name);
        }
        let handle = display_handle(handle);
        if !handle.is_empty() {
            pairs.append_pair(HANDLE_PARAM, &handle);
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(href: &str) -> Transport {
        Transport::parse(href).unwrap()
    }

    #[test]
    fn test_precedence() {
        let t = transport("https://example.com/?b=AQ&d=1.2&r=0-3#s=abc");
        assert_eq!(t.source(), SelectionSource::Range("0-3".into()));

        let t = transport("https://example.com/?b=AQ&d=");
        assert_eq!(t.source(), SelectionSource::Delta(String::new()));

        let t = transport("https://example.com/?b=&n=mika#s0=%7B%7D");
        assert_eq!(t.source(), SelectionSource::LegacyPlain("%7B%7D".into()));

        let t = transport("https://example.com/#foo=1&s=IZA");
        assert_eq!(t.source(), SelectionSource::LegacyCompressed("IZA".into()));

        let t = transport("https://example.com/?n=mika");
        assert_eq!(t.source(), SelectionSource::Absent);
    }

    #[test]
    fn test_name_and_handle() {
        let t = transport("https://example.com/?r=1&n=Mika+S&x=%40mika_s");
        assert_eq!(t.name().as_deref(), Some("Mika S"));
        assert_eq!(t.handle().as_deref(), Some("mika_s"));
    }

    #[test]
    fn test_strip_keeps_name_and_fragment() {
        let t = transport("https://example.com/p/?r=0-2&n=mika&d=1&x=m#top");
        let stripped = t.stripped();
        assert_eq!(stripped.as_str(), "https://example.com/p/?n=mika&x=m#top");

        // Stripping is idempotent and leaves no selection behind.
        let again = Transport::from_url(stripped.clone());
        assert_eq!(again.source(), SelectionSource::Absent);
        assert_eq!(again.stripped(), stripped);
        assert_eq!(again.name().as_deref(), Some("mika"));
    }

    #[test]
    fn test_strip_drops_empty_query() {
        let t = transport("https://example.com/?b=AQ");
        assert_eq!(t.stripped().as_str(), "https://example.com/");
    }

    #[test]
    fn test_has_selection_state() {
        assert!(transport("https://example.com/?d=").has_selection_state());
        assert!(transport("https://example.com/#anything").has_selection_state());
        assert!(!transport("https://example.com/#").has_selection_state());
        assert!(!transport("https://example.com/?n=a").has_selection_state());
    }

    #[test]
    fn test_handles() {
        assert_eq!(normalize_handle("  @mika "), "mika");
        assert_eq!(normalize_handle("mika"), "mika");
        assert_eq!(display_handle("mika"), "@mika");
        assert_eq!(display_handle("@mika"), "@mika");
        assert_eq!(display_handle(" "), "");
    }

    #[test]
    fn test_share_url() {
        let base = Url::parse("https://example.com/app/?old=1#s=zzz").unwrap();
        let encoded = EncodedPayload {
            mode: EncodingMode::Delta,
            payload: "0.2.2".into(),
        };
        let url = share_url(&base, &encoded, " Mika ", "mika");
        assert_eq!(url.as_str(), "https://example.com/app/?d=0.2.2&n=Mika&x=%40mika");

        let empty = EncodedPayload {
            mode: EncodingMode::Range,
            payload: String::new(),
        };
        let url = share_url(&base, &empty, "", "");
        assert_eq!(url.as_str(), "https://example.com/app/?r=");
        assert_eq!(
            Transport::from_url(url).source(),
            SelectionSource::Range(String::new())
        );
    }
}
