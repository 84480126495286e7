// Pull-based field tokenizer
//
// Single forward pass over a borrowed buffer. Each `advance` scans exactly
// one field and records its boundaries; values are only materialized when
// the caller asks for them, and only copied when doubled escapes must be
// collapsed.

use crate::core::{
    extract_field, match_newline, skip_preamble, Direction, EscapeEvent, Field, FieldSpan,
    ScanState,
};
use crate::encoding::Encoding;
use crate::error::{DsvError, DsvResult};
use crate::options::{ColumnLock, DsvOptions};

/// How a scanned field was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldEnd {
    Delimiter,
    RowEnd,
}

/// Incremental DSV tokenizer over an in-memory buffer.
///
/// Every `advance` mutates the cursor in place, so one tokenizer serves one
/// thread. Split the input with [`crate::strategy::parallel::partition`] to
/// tokenize on several threads.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    options: DsvOptions,
    preamble: &'static str,
    started: bool,
    finished: bool,

    /// Next byte to scan. Never decreases.
    position: usize,
    /// First byte of the field being scanned, including leading whitespace.
    field_start: usize,
    state: ScanState,
    quoted: bool,
    content_start: usize,
    content_end: Option<usize>,
    doubled: usize,

    row_index: usize,
    column_index: usize,
    next_column: usize,
    column_count: usize,
    columns_locked: bool,
    first_row_done: bool,
    row_boundary_pending: bool,

    current: Option<FieldSpan>,
}

impl<'a> Tokenizer<'a> {
    /// Tokenizer over already-decoded text. No preamble is skipped.
    pub fn new(input: &'a str, options: DsvOptions) -> Self {
        let (column_count, columns_locked) = match options.column_lock {
            ColumnLock::Fixed(n) => (n, true),
            _ => (0, false),
        };
        Tokenizer {
            input,
            options,
            preamble: "",
            started: false,
            finished: false,
            position: 0,
            field_start: 0,
            state: ScanState::Unquoted,
            quoted: false,
            content_start: 0,
            content_end: None,
            doubled: 0,
            row_index: 0,
            column_index: 0,
            next_column: 0,
            column_count,
            columns_locked,
            first_row_done: false,
            row_boundary_pending: false,
            current: None,
        }
    }

    /// Tokenizer over text decoded from `encoding`; a leading byte-order mark
    /// is skipped on the first `advance`.
    pub fn with_encoding(input: &'a str, options: DsvOptions, encoding: Encoding) -> Self {
        let mut tokenizer = Self::new(input, options);
        tokenizer.preamble = encoding.preamble_str();
        tokenizer
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn options(&self) -> &DsvOptions {
        &self.options
    }

    /// Byte offset of the next character to scan.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of completed data rows. The header row is not counted.
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    /// Column of the most recently produced field.
    pub fn column_index(&self) -> usize {
        self.column_index
    }

    /// Width of the first row (or the fixed width), once known.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Whether rows wider than `column_count` are rejected.
    pub fn columns_locked(&self) -> bool {
        self.columns_locked
    }

    /// True right after the last field of a row was produced.
    pub fn row_boundary_pending(&self) -> bool {
        self.row_boundary_pending
    }

    /// True until the first row of the input has been completed.
    pub fn in_first_row(&self) -> bool {
        !self.first_row_done
    }

    /// Boundaries of the most recently produced field.
    pub fn field_span(&self) -> Option<FieldSpan> {
        self.current
    }

    /// Value of the most recently produced field.
    ///
    /// Borrowed from the input unless the field contained doubled escape
    /// characters, in which case the unescaped value is allocated once.
    pub fn field(&self) -> Option<Field<'a>> {
        self.current
            .map(|span| extract_field(self.input, span, self.options.escape))
    }

    /// Zero-copy view of the current field; `None` if it needs unescaping.
    pub fn field_borrowed(&self) -> Option<&'a str> {
        match self.field()? {
            Field::Borrowed(value) => Some(value),
            Field::Owned(_) => None,
        }
    }

    /// Owned copy of the current field with doubled escapes collapsed.
    pub fn field_owned(&self) -> Option<String> {
        self.field().map(Field::into_owned)
    }

    /// Scan forward to the next field.
    ///
    /// Returns `Ok(false)` once the input is exhausted. An error is terminal:
    /// every later call returns `Ok(false)`.
    pub fn advance(&mut self) -> DsvResult<bool> {
        if self.finished {
            self.current = None;
            return Ok(false);
        }
        if !self.started {
            self.start();
        }
        if self.row_boundary_pending {
            self.next_column = 0;
            self.row_boundary_pending = false;
        }

        let result = self.scan_field().and_then(|scanned| match scanned {
            Some((span, end)) => self.emit(span, end).map(|()| true),
            None => Ok(false),
        });

        match result {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.finished = true;
                self.current = None;
                Ok(false)
            }
            Err(err) => {
                tracing::debug!(%err, "tokenizing stopped");
                self.finished = true;
                self.current = None;
                Err(err)
            }
        }
    }

    /// Advance through the remainder of the current row.
    ///
    /// Returns `Ok(false)` if no field was left to consume.
    pub fn advance_row(&mut self) -> DsvResult<bool> {
        let mut advanced = false;
        while self.advance()? {
            advanced = true;
            if self.row_boundary_pending {
                break;
            }
        }
        Ok(advanced)
    }

    fn start(&mut self) {
        self.started = true;
        let skip = skip_preamble(self.input, self.preamble);
        if skip > 0 {
            tracing::debug!(bytes = skip, "skipped preamble");
        }
        self.position = skip;
        self.field_start = skip;
    }

    fn scan_field(&mut self) -> DsvResult<Option<(FieldSpan, FieldEnd)>> {
        let input = self.input;
        let bytes = input.as_bytes();
        let len = bytes.len();
        let delimiter = self.options.delimiter;
        let escape = self.options.escape;
        let mut pos = self.position;

        while pos < len {
            let byte = bytes[pos];
            let ch = if byte.is_ascii() {
                byte as char
            } else {
                match input[pos..].chars().next() {
                    Some(ch) => ch,
                    None => break,
                }
            };
            let next = pos + ch.len_utf8();

            if ch == escape {
                let at_start = !self.quoted
                    && self.state == ScanState::Unquoted
                    && input[self.field_start..pos].trim_start().is_empty();
                let closes = self.closes_field(next);
                let (state, event) = self.state.on_escape(at_start, closes);
                self.state = state;
                match event {
                    EscapeEvent::Open => {
                        self.quoted = true;
                        self.content_start = next;
                    }
                    EscapeEvent::Close => self.content_end = Some(pos),
                    EscapeEvent::Pending => {}
                    EscapeEvent::Doubled => self.doubled += 1,
                    EscapeEvent::Stray => return Err(self.malformed_escape(pos)),
                }
                pos = next;
                continue;
            }

            if !self.state.accepts_other() {
                return Err(self.malformed_escape(pos));
            }
            if self.state.is_quoting() {
                pos = next;
                continue;
            }

            if ch == delimiter {
                let span = self.finish_span(pos);
                self.position = next;
                return Ok(Some((span, FieldEnd::Delimiter)));
            }

            if ch == '\n' {
                let end = match match_newline(bytes, next, Direction::Backward) {
                    Some(kind) => next - kind.width(),
                    None => pos,
                };
                if self.next_column == 0 && !self.quoted && end == self.field_start {
                    // Blank line: no field, no row
                    pos = next;
                    self.field_start = next;
                    continue;
                }
                let span = self.finish_span(end);
                self.position = next;
                return Ok(Some((span, FieldEnd::RowEnd)));
            }

            pos = next;
        }

        self.position = len;
        if self.field_start >= len && self.next_column == 0 && !self.quoted {
            return Ok(None);
        }

        let mut end = len;
        if self.state.is_quoting() {
            // Dangling quoted field: finalize, minus a trailing line break
            if let Some(kind) = match_newline(bytes, len, Direction::Backward) {
                end = (len - kind.width()).max(self.content_start);
            }
        }
        let span = self.finish_span(end);
        Ok(Some((span, FieldEnd::RowEnd)))
    }

    /// An escape at `pos` whose successor starts at `next` can close quoting
    /// when it is followed by a delimiter, a line break or the end of input.
    #[inline]
    fn closes_field(&self, next: usize) -> bool {
        next >= self.input.len()
            || self.input[next..].starts_with(self.options.delimiter)
            || match_newline(self.input.as_bytes(), next, Direction::Forward).is_some()
    }

    fn finish_span(&self, end: usize) -> FieldSpan {
        if self.quoted {
            let end = self.content_end.unwrap_or(end);
            FieldSpan {
                start: self.content_start,
                end: end.max(self.content_start),
                doubled: self.doubled,
                quoted: true,
            }
        } else {
            FieldSpan {
                start: self.field_start,
                end: end.max(self.field_start),
                doubled: 0,
                quoted: false,
            }
        }
    }

    fn emit(&mut self, span: FieldSpan, end: FieldEnd) -> DsvResult<()> {
        let column = self.next_column;
        if self.columns_locked && column >= self.column_count {
            return Err(DsvError::MalformedRow {
                position: self.field_start,
                row: self.row_index,
                column,
                column_count: self.column_count,
            });
        }

        self.current = Some(span);
        self.column_index = column;
        self.next_column += 1;
        if !self.first_row_done && !self.columns_locked {
            self.column_count = self.next_column;
        }

        self.field_start = self.position;
        self.state = ScanState::Unquoted;
        self.quoted = false;
        self.content_end = None;
        self.doubled = 0;

        if end == FieldEnd::RowEnd {
            self.complete_row();
        }
        Ok(())
    }

    fn complete_row(&mut self) {
        self.row_boundary_pending = true;
        let width = self.next_column;

        if !self.first_row_done {
            self.first_row_done = true;
            if self.options.locks_on_first_row() && !self.columns_locked {
                self.column_count = width;
                self.columns_locked = true;
                tracing::debug!(column_count = width, "column count locked");
            }
            if self.options.has_headers {
                tracing::trace!(width, "header row completed");
                return;
            }
        }

        tracing::trace!(row = self.row_index, width, "row completed");
        self.row_index += 1;
    }

    fn malformed_escape(&self, position: usize) -> DsvError {
        DsvError::MalformedEscape {
            position,
            row: self.row_index,
            column: self.next_column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Drain every field as (row_index, column_index, value, ends_row).
    fn drain(input: &str, options: DsvOptions) -> DsvResult<Vec<(usize, usize, String, bool)>> {
        let mut tok = Tokenizer::new(input, options);
        let mut out = Vec::new();
        while tok.advance()? {
            let value = tok.field().unwrap_or_default().into_owned();
            out.push((tok.row_index(), tok.column_index(), value, tok.row_boundary_pending()));
        }
        Ok(out)
    }

    fn values(input: &str, options: DsvOptions) -> Vec<String> {
        drain(input, options)
            .unwrap()
            .into_iter()
            .map(|(_, _, v, _)| v)
            .collect()
    }

    fn no_headers() -> DsvOptions {
        DsvOptions::csv().with_headers(false)
    }

    #[test]
    fn test_header_and_data_row() {
        let fields = drain("Column1,Column2\nData1,Data2", DsvOptions::csv()).unwrap();
        assert_eq!(
            fields,
            vec![
                (0, 0, "Column1".to_string(), false),
                (0, 1, "Column2".to_string(), true),
                (0, 0, "Data1".to_string(), false),
                (1, 1, "Data2".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_columns_lock_after_header() {
        let mut tok = Tokenizer::new("a,b\n1,2\n", DsvOptions::csv());
        assert!(tok.advance().unwrap());
        assert!(!tok.columns_locked());
        assert_eq!(tok.column_count(), 1);
        assert!(tok.advance().unwrap());
        assert!(tok.columns_locked());
        assert_eq!(tok.column_count(), 2);
        assert_eq!(tok.row_index(), 0);
        assert!(tok.advance_row().unwrap());
        assert_eq!(tok.row_index(), 1);
        assert!(!tok.advance().unwrap());
        assert!(!tok.advance().unwrap());
    }

    #[test]
    fn test_empty_fields_preserved() {
        assert_eq!(values("a,,b", no_headers()), vec!["a", "", "b"]);
        assert_eq!(values("a,", no_headers()), vec!["a", ""]);
        assert_eq!(values(",\n", no_headers()), vec!["", ""]);
    }

    #[test]
    fn test_empty_input() {
        assert!(!Tokenizer::new("", DsvOptions::csv()).advance().unwrap());
        assert!(!Tokenizer::new("\n\r\n", DsvOptions::csv()).advance().unwrap());
    }

    #[test]
    fn test_quoted_delimiter_and_newline() {
        assert_eq!(values("\"a,b\",c", no_headers()), vec!["a,b", "c"]);
        assert_eq!(values("\"a\nb\",c\n", no_headers()), vec!["a\nb", "c"]);
        assert_eq!(values("\"a\r\nb\",c\r\n", no_headers()), vec!["a\r\nb", "c"]);
    }

    #[test]
    fn test_doubled_escape_is_owned() {
        let mut tok = Tokenizer::new("\"a\"\"b\",c", no_headers());
        assert!(tok.advance().unwrap());
        let span = tok.field_span().unwrap();
        assert!(span.quoted);
        assert_eq!(span.doubled, 1);
        let field = tok.field().unwrap();
        assert!(matches!(field, Field::Owned(_)));
        assert_eq!(field, "a\"b");

        assert_eq!(tok.field_borrowed(), None);
        assert_eq!(tok.field_owned().as_deref(), Some("a\"b"));

        assert!(tok.advance().unwrap());
        assert!(matches!(tok.field().unwrap(), Field::Borrowed("c")));
        assert_eq!(tok.field_borrowed(), Some("c"));
    }

    #[test]
    fn test_multiple_doubled_escapes() {
        let input = "\"Da\"\"\"\"ta1\",\"Data2\"\"\"\"\",\"\"\"\"\"Da\"\"ta3\"";
        assert_eq!(
            values(input, no_headers()),
            vec!["Da\"\"ta1", "Data2\"\"", "\"\"Da\"ta3"]
        );
    }

    #[test]
    fn test_quoted_field_is_borrowed_without_quotes() {
        let mut tok = Tokenizer::new("\"plain\"", no_headers());
        assert!(tok.advance().unwrap());
        assert!(matches!(tok.field().unwrap(), Field::Borrowed("plain")));
        assert_eq!(tok.field_span().unwrap(), FieldSpan { start: 1, end: 6, doubled: 0, quoted: true });
    }

    #[test]
    fn test_stray_escape_in_quoted_field() {
        let err = drain("\"a\"b\"", no_headers()).unwrap_err();
        assert_eq!(
            err,
            DsvError::MalformedEscape {
                position: 3,
                row: 0,
                column: 0
            }
        );
    }

    #[test]
    fn test_stray_escape_in_unquoted_field() {
        assert!(matches!(
            drain("ab\"c\",d", no_headers()),
            Err(DsvError::MalformedEscape { position: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_header_escapes() {
        assert!(matches!(
            drain("\"Col\"umn1\",Column2\n,,", DsvOptions::csv()),
            Err(DsvError::MalformedEscape { .. })
        ));
        assert!(matches!(
            drain("\"\"Column1\",Column2\nData1,Data2", DsvOptions::csv()),
            Err(DsvError::MalformedEscape { .. })
        ));
    }

    #[test]
    fn test_column_overflow_on_third_field() {
        let mut tok = Tokenizer::new("a,b\na,b,c", DsvOptions::csv());
        assert!(tok.advance_row().unwrap());
        assert!(tok.advance().unwrap());
        assert_eq!(tok.field().unwrap(), "a");
        assert!(tok.advance().unwrap());
        assert_eq!(tok.field().unwrap(), "b");
        let err = tok.advance().unwrap_err();
        assert_eq!(
            err,
            DsvError::MalformedRow {
                position: 8,
                row: 0,
                column: 2,
                column_count: 2
            }
        );
        // Terminal after a fatal error
        assert!(!tok.advance().unwrap());
        assert!(tok.field().is_none());
    }

    #[test]
    fn test_no_headers_accepts_ragged_rows() {
        let fields = drain("a,b\n1,2,3\n", no_headers()).unwrap();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[4], (2, 2, "3".to_string(), true));
    }

    #[test]
    fn test_first_row_lock_without_headers() {
        let opts = no_headers().with_column_lock(ColumnLock::FirstRow);
        assert!(matches!(
            drain("a,b\n1,2,3\n", opts),
            Err(DsvError::MalformedRow { row: 1, column: 2, .. })
        ));
    }

    #[test]
    fn test_fixed_lock_from_start() {
        let opts = no_headers().with_column_lock(ColumnLock::Fixed(2));
        let mut tok = Tokenizer::new("a,b,c", opts);
        assert!(tok.columns_locked());
        assert_eq!(tok.column_count(), 2);
        assert!(tok.advance().unwrap());
        assert!(tok.advance().unwrap());
        assert!(matches!(tok.advance(), Err(DsvError::MalformedRow { column: 2, .. })));
    }

    #[test]
    fn test_disabled_lock_with_headers() {
        let opts = DsvOptions::csv().with_column_lock(ColumnLock::Disabled);
        let fields = drain("a,b\n1,2,3\n", opts).unwrap();
        assert_eq!(fields.len(), 5);
    }

    #[test]
    fn test_newline_styles_match() {
        let lf = values("h1,h2\n\"x\ny\",z\nq,\"r\"\"s\"\n", DsvOptions::csv());
        let crlf = values("h1,h2\r\n\"x\ny\",z\r\nq,\"r\"\"s\"\r\n", DsvOptions::csv());
        assert_eq!(lf, crlf);
        assert_eq!(lf, vec!["h1", "h2", "x\ny", "z", "q", "r\"s"]);
    }

    #[test]
    fn test_bare_carriage_return_is_data() {
        assert_eq!(values("a\rb,c\n", no_headers()), vec!["a\rb", "c"]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let fields = drain("Column1,Column2\n\nData1,Data2\n\r\nData1,Data2", DsvOptions::csv()).unwrap();
        let data: Vec<_> = fields.iter().map(|(_, _, v, _)| v.as_str()).collect();
        assert_eq!(data, vec!["Column1", "Column2", "Data1", "Data2", "Data1", "Data2"]);
        assert_eq!(fields.last().unwrap().0, 2);
    }

    #[test]
    fn test_trailing_newline_adds_no_row() {
        let mut tok = Tokenizer::new("a,b\n1,2\n", DsvOptions::csv());
        while tok.advance().unwrap() {}
        assert_eq!(tok.row_index(), 1);
    }

    #[test]
    fn test_leading_whitespace_skipped() {
        assert_eq!(values("  a,   ,\t b", no_headers()), vec!["a", "", "b"]);
        // Whitespace before an opening quote
        assert_eq!(values(" \"x,y\",z", no_headers()), vec!["x,y", "z"]);
    }

    #[test]
    fn test_dangling_quote_finalized() {
        assert_eq!(values("a,\"bc", no_headers()), vec!["a", "bc"]);
        assert_eq!(values("a,\"bc\r\n", no_headers()), vec!["a", "bc"]);
        assert_eq!(values("\"", no_headers()), vec![""]);
    }

    #[test]
    fn test_quote_closing_at_end_of_input() {
        assert_eq!(values("a,\"b\"", no_headers()), vec!["a", "b"]);
        assert_eq!(values("\"\",\"\"\n", no_headers()), vec!["", ""]);
        assert_eq!(values("\"\"\"\"", no_headers()), vec!["\""]);
    }

    #[test]
    fn test_preamble_skip() {
        let text = "\u{FEFF}Column1,Column2\nData1,Data2";
        let mut tok = Tokenizer::with_encoding(text, DsvOptions::csv(), Encoding::Utf8);
        assert!(tok.advance().unwrap());
        assert!(matches!(tok.field().unwrap(), Field::Borrowed("Column1")));

        // Without the encoding the marker is content
        let mut tok = Tokenizer::new(text, DsvOptions::csv());
        assert!(tok.advance().unwrap());
        assert_eq!(tok.field().unwrap(), "\u{FEFF}Column1");

        // Latin-1 has no preamble to skip
        let mut tok = Tokenizer::with_encoding("x", DsvOptions::csv(), Encoding::Latin1);
        assert!(tok.advance().unwrap());
        assert_eq!(tok.field().unwrap(), "x");
    }

    #[test]
    fn test_multibyte_delimiter_and_escape() {
        let opts = DsvOptions::new('¦', '§', false);
        assert_eq!(
            values("αβ¦§x¦y§§z§¦ω", opts),
            vec!["αβ", "x¦y§z", "ω"]
        );
    }

    #[test]
    fn test_position_is_monotonic() {
        let mut tok = Tokenizer::new("a,\"b\"\"c\"\n\nd,e\r\nf", no_headers());
        let mut last = tok.position();
        while tok.advance().unwrap() {
            assert!(tok.position() >= last);
            last = tok.position();
        }
        assert_eq!(last, tok.input().len());
    }

    #[test]
    fn test_advance_row_skips_rest_of_row() {
        let mut tok = Tokenizer::new("h1,h2,h3\na,b,c\nd,e,f", DsvOptions::csv());
        assert!(tok.advance().unwrap());
        assert!(tok.advance_row().unwrap());
        assert!(tok.row_boundary_pending());
        assert_eq!(tok.field().unwrap(), "h3");
        assert!(tok.advance_row().unwrap());
        assert_eq!(tok.field().unwrap(), "c");
        assert!(tok.advance_row().unwrap());
        assert_eq!(tok.field().unwrap(), "f");
        assert!(!tok.advance_row().unwrap());
    }
}
