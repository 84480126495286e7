// Field boundaries and value materialization

use std::borrow::Cow;

/// A tokenized field value.
///
/// `Cow::Borrowed` is a zero-copy view into the input. `Cow::Owned` is
/// produced only when the field contained doubled escape characters and had
/// to be rewritten.
pub type Field<'a> = Cow<'a, str>;

/// Byte range of a field's content within the input.
///
/// For quoted fields the range excludes the surrounding escape characters;
/// for every field it excludes the delimiter and any line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
    /// Number of doubled escape pairs inside the range.
    pub doubled: usize,
    /// Whether the field was wrapped in escape characters.
    pub quoted: bool,
}

impl FieldSpan {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the value must be rewritten instead of borrowed.
    #[inline]
    pub fn needs_unescape(&self) -> bool {
        self.doubled > 0
    }
}

/// Produce the output value for a field span.
///
/// Leading whitespace is dropped; a whitespace-only field becomes empty.
/// Borrowed unless the span recorded doubled escapes.
#[inline]
pub fn extract_field<'a>(input: &'a str, span: FieldSpan, escape: char) -> Field<'a> {
    let raw = input[span.start..span.end].trim_start();
    if span.needs_unescape() {
        Cow::Owned(unescape_field(raw, escape, span.doubled))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Collapse every doubled escape pair into a single escape character.
///
/// `doubled` is the number of pairs the scanner counted; it sizes the output
/// exactly so the copy is a single allocation.
pub fn unescape_field(raw: &str, escape: char, doubled: usize) -> String {
    let capacity = raw.len().saturating_sub(doubled * escape.len_utf8());
    let mut result = String::with_capacity(capacity);
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        result.push(ch);
        if ch == escape && chars.peek() == Some(&escape) {
            chars.next();
        }
    }
    result
}
