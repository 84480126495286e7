// Byte-order-mark skipping at the start of decoded input

/// Returns the byte offset at which content starts.
///
/// The preamble is compared character by character against the start of
/// `input`; only a full match is skipped. An empty preamble never skips.
pub fn skip_preamble(input: &str, preamble: &str) -> usize {
    if preamble.is_empty() {
        return 0;
    }
    let mut chars = input.chars();
    for expected in preamble.chars() {
        if chars.next() != Some(expected) {
            return 0;
        }
    }
    preamble.len()
}
