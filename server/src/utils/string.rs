//! String utility functions

use crate::core::constants::TRUNCATION_MARKER;

/// Cap text at `max_chars` characters, appending the truncation marker when
/// anything was cut. Text at or below the cap is returned verbatim.
pub fn truncate_with_marker(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut truncated = text;
            truncated.truncate(byte_idx);
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text,
    }
}
