use crate::error::PartialDecode;
use crate::selection::SelectionSet;
use crate::EncodingMode;

/// A textual encoding of a selection over a catalog of `universe_size` items.
///
/// Encoding never fails. Decoding never panics: malformed input yields a
/// [`PartialDecode`] carrying whatever could be recovered, and decoded
/// indices are always below `universe_size`.
pub trait SelectionEncoder {
    /// The query tag this encoder writes under.
    fn mode(&self) -> EncodingMode;

    /// Encode `selection` into an ASCII payload.
    fn encode(&self, selection: &SelectionSet, universe_size: usize) -> String;

    /// Decode a payload produced by [`encode`](Self::encode).
    fn decode(&self, payload: &str, universe_size: usize) -> Result<SelectionSet, PartialDecode>;

    /// Decode, keeping whatever was recovered from malformed input.
    fn decode_lossy(&self, payload: &str, universe_size: usize) -> SelectionSet {
        match self.decode(payload, universe_size) {
            Ok(selection) => selection,
            Err(partial) => {
                tracing::debug!(
                    mode = %self.mode(),
                    error = %partial.error,
                    recovered = partial.recovered.len(),
                    "partial decode"
                );
                partial.recovered
            }
        }
    }
}
