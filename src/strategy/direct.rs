// Row materialization on top of the field tokenizer
//
// Pulls fields until the tokenizer reports a row boundary and collects them
// into a compact vector. Values stay borrowed from the input unless they
// carried doubled escapes.

use crate::core::Field;
use crate::error::DsvResult;
use crate::options::DsvOptions;
use crate::tokenizer::Tokenizer;

/// Starting capacity when the row width is not yet known.
const INITIAL_ROW_CAPACITY: usize = 4;

/// Whether a materialized row is the header or a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Data,
}

/// One materialized row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<'a> {
    pub kind: RowKind,
    pub fields: Vec<Field<'a>>,
}

impl<'a> Row<'a> {
    pub fn is_header(&self) -> bool {
        self.kind == RowKind::Header
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(|f| f.as_ref())
    }

    /// Copy every value out of the input buffer.
    pub fn into_owned(self) -> Vec<String> {
        self.fields.into_iter().map(Field::into_owned).collect()
    }
}

/// Read the next complete row.
///
/// Returns `Ok(None)` once the input is exhausted. When the column count is
/// locked, short rows are padded with empty values up to the locked width.
pub fn read_row<'a>(tokenizer: &mut Tokenizer<'a>) -> DsvResult<Option<Vec<Field<'a>>>> {
    let capacity = if tokenizer.columns_locked() {
        tokenizer.column_count()
    } else {
        INITIAL_ROW_CAPACITY
    };
    let mut fields = Vec::with_capacity(capacity);

    while tokenizer.advance()? {
        fields.push(tokenizer.field().unwrap_or_default());
        if tokenizer.row_boundary_pending() {
            break;
        }
    }

    if fields.is_empty() {
        return Ok(None);
    }

    if tokenizer.columns_locked() && fields.len() < tokenizer.column_count() {
        fields.resize(tokenizer.column_count(), Field::Borrowed(""));
    }
    fields.shrink_to_fit();
    Ok(Some(fields))
}

/// Iterator over the rows of a buffer.
///
/// Stops after the first error; the error itself is yielded once.
#[derive(Debug, Clone)]
pub struct RowReader<'a> {
    tokenizer: Tokenizer<'a>,
}

impl<'a> RowReader<'a> {
    pub fn new(input: &'a str, options: DsvOptions) -> Self {
        RowReader {
            tokenizer: Tokenizer::new(input, options),
        }
    }

    pub fn from_tokenizer(tokenizer: Tokenizer<'a>) -> Self {
        RowReader { tokenizer }
    }

    pub fn tokenizer(&self) -> &Tokenizer<'a> {
        &self.tokenizer
    }

    /// Read the header row if headers are enabled and it has not been read.
    pub fn headers(&mut self) -> DsvResult<Option<Vec<Field<'a>>>> {
        if !self.tokenizer.options().has_headers || !self.tokenizer.in_first_row() {
            return Ok(None);
        }
        read_row(&mut self.tokenizer)
    }

    /// Collect the remaining data rows, dropping the header if still unread.
    pub fn data_rows(mut self) -> DsvResult<Vec<Vec<Field<'a>>>> {
        self.headers()?;
        self.map(|row| row.map(|r| r.fields)).collect()
    }
}

impl<'a> Iterator for RowReader<'a> {
    type Item = DsvResult<Row<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = if self.tokenizer.options().has_headers && self.tokenizer.in_first_row() {
            RowKind::Header
        } else {
            RowKind::Data
        };
        match read_row(&mut self.tokenizer) {
            Ok(Some(fields)) => Some(Ok(Row { kind, fields })),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
