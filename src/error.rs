// Error taxonomy for tokenizing and decoding

use crate::encoding::Encoding;
use thiserror::Error;

/// Convenience result type for tokenizer operations.
pub type DsvResult<T> = Result<T, DsvError>;

/// Fatal conditions raised while decoding or tokenizing an input.
///
/// None of these are recoverable: the tokenizer stops at the offending
/// position and reports end of input on every later call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DsvError {
    /// An escape character inside a quoted field was neither doubled nor
    /// followed by a delimiter, a line break or the end of input.
    #[error("malformed escape at byte {position} (row {row}, column {column}): escape character is not paired")]
    MalformedEscape {
        position: usize,
        row: usize,
        column: usize,
    },

    /// A row produced more fields than the locked column count.
    #[error("malformed row at byte {position} (row {row}): column {column} exceeds column count {column_count}")]
    MalformedRow {
        position: usize,
        row: usize,
        column: usize,
        column_count: usize,
    },

    /// Raw bytes could not be decoded with the requested encoding.
    #[error("cannot decode input as {encoding:?} at byte {offset}: {reason}")]
    Decode {
        encoding: Encoding,
        offset: usize,
        reason: &'static str,
    },
}

impl DsvError {
    /// Byte offset the error points at.
    pub fn position(&self) -> usize {
        match *self {
            DsvError::MalformedEscape { position, .. } | DsvError::MalformedRow { position, .. } => {
                position
            }
            DsvError::Decode { offset, .. } => offset,
        }
    }

    /// Shift the reported byte offset of an error raised inside a sub-range
    /// so it is relative to the whole input again.
    pub fn offset_by(mut self, base: usize) -> Self {
        match &mut self {
            DsvError::MalformedEscape { position, .. } | DsvError::MalformedRow { position, .. } => {
                *position += base
            }
            DsvError::Decode { offset, .. } => *offset += base,
        }
        self
    }
}
