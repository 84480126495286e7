// RustyDSV - Low-allocation delimiter-separated-value tokenizing
//
// Layers:
// core:      newline matching, preamble skip, quoting automaton, field spans
// tokenizer: pull-based field tokenizer (Tokenizer::advance)
// strategy:  row materialization (direct) and rayon partitioning (parallel)
// encoding:  byte decoders feeding the tokenizer
//
// Fields borrow from the input buffer; only values containing doubled
// escape characters are copied.

pub mod core;
pub mod encoding;
pub mod error;
pub mod options;
pub mod strategy;
pub mod tokenizer;

pub use crate::core::{Field, FieldSpan};
pub use encoding::Encoding;
pub use error::{DsvError, DsvResult};
pub use options::{ColumnLock, DsvOptions};
pub use strategy::{
    par_map, par_read_rows, partition, read_row, recommended_parts, Partition, PartitionedInput,
    Row, RowKind, RowReader,
};
pub use tokenizer::Tokenizer;

/// Tokenize a whole buffer and return its data rows.
///
/// The header row, when `options.has_headers` is set, is consumed and not
/// returned.
pub fn read_all(input: &str, options: DsvOptions) -> DsvResult<Vec<Vec<Field<'_>>>> {
    RowReader::new(input, options).data_rows()
}

/// Decode raw bytes and tokenize them, returning owned data rows.
///
/// A byte-order mark matching `encoding` is skipped.
pub fn read_all_bytes(
    input: &[u8],
    options: DsvOptions,
    encoding: Encoding,
) -> DsvResult<Vec<Vec<String>>> {
    let text = encoding.decode(input)?;
    let reader = RowReader::from_tokenizer(Tokenizer::with_encoding(&text, options, encoding));
    let rows = reader.data_rows()?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(Field::into_owned).collect())
        .collect())
}
