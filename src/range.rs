//! Range encoding: contiguous runs as `start-end`, singletons as bare numbers.
//!
//! `{0, 1, 2, 7}` encodes to `0-2,7`. Cheapest when the selection is a few
//! long runs, e.g. "every show of one tour".

use crate::error::{CodecError, PartialDecode};
use crate::selection::SelectionSet;
use crate::traits::SelectionEncoder;
use crate::EncodingMode;

/// Decimal run-length encoder, query tag `r`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeEncoder;

impl RangeEncoder {
    /// Create a range encoder.
    pub fn new() -> Self {
        Self
    }

    fn push_run(parts: &mut Vec<String>, start: u32, end: u32) {
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    fn parse_index(text: &str, position: usize) -> Result<u64, CodecError> {
        text.trim()
            .parse::<u64>()
            .map_err(|_| CodecError::invalid_token(text, position))
    }
}

impl SelectionEncoder for RangeEncoder {
    fn mode(&self) -> EncodingMode {
        EncodingMode::Range
    }

    fn encode(&self, selection: &SelectionSet, _universe_size: usize) -> String {
        let mut iter = selection.iter();
        let Some(first) = iter.next() else {
            return String::new();
        };

        let mut parts = Vec::new();
        let (mut start, mut prev) = (first, first);
        for cur in iter {
            if cur == prev + 1 {
                prev = cur;
                continue;
            }
            Self::push_run(&mut parts, start, prev);
            start = cur;
            prev = cur;
        }
        Self::push_run(&mut parts, start, prev);

        parts.join(",")
    }

    fn decode(&self, payload: &str, universe_size: usize) -> Result<SelectionSet, PartialDecode> {
        let mut selection = SelectionSet::new();
        let mut first_error = None;

        for (position, token) in payload.split(',').enumerate() {
            if token.is_empty() {
                continue;
            }

            let bounds = match token.split_once('-') {
                None => Self::parse_index(token, position).map(|v| (v, v)),
                Some((a, b)) => Self::parse_index(a, position)
                    .and_then(|a| Self::parse_index(b, position).map(|b| (a.min(b), a.max(b))))
                    .map_err(|_| CodecError::invalid_token(token, position)),
            };

            let (from, to) = match bounds {
                Ok(bounds) => bounds,
                Err(err) => {
                    first_error.get_or_insert(err);
                    continue;
                }
            };

            // Clamp to the catalog so hostile ranges stay bounded.
            if from >= universe_size as u64 {
                first_error.get_or_insert(CodecError::IndexOutOfRange {
                    index: from,
                    universe_size,
                });
                continue;
            }
            let to = to.min(universe_size as u64 - 1);
            selection.extend(from as u32..=to as u32);
        }

        match first_error {
            None => Ok(selection),
            Some(error) => Err(PartialDecode::new(selection, error)),
        }
    }
}
