// Tokenizer configuration

use serde::{Deserialize, Serialize};

/// When the per-row field count becomes fixed and enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLock {
    /// Lock on completion of the header row; never lock without headers.
    #[default]
    Headers,
    /// Lock on completion of the first row, header or not.
    FirstRow,
    /// Locked from the first field with a known column count.
    Fixed(usize),
    /// Never lock; rows of any width are accepted.
    Disabled,
}

/// Immutable tokenizer options.
///
/// Deserializable so it can sit inside a caller's configuration file; every
/// field falls back to the CSV preset when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsvOptions {
    pub delimiter: char,
    pub escape: char,
    pub has_headers: bool,
    pub column_lock: ColumnLock,
}

impl DsvOptions {
    pub const fn new(delimiter: char, escape: char, has_headers: bool) -> Self {
        DsvOptions {
            delimiter,
            escape,
            has_headers,
            column_lock: ColumnLock::Headers,
        }
    }

    /// Comma separated, double-quote escape, with headers.
    pub const fn csv() -> Self {
        Self::new(',', '"', true)
    }

    /// Tab separated, double-quote escape, with headers.
    pub const fn tsv() -> Self {
        Self::new('\t', '"', true)
    }

    /// Pipe separated, double-quote escape, with headers.
    pub const fn psv() -> Self {
        Self::new('|', '"', true)
    }

    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub const fn with_escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    pub const fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub const fn with_column_lock(mut self, column_lock: ColumnLock) -> Self {
        self.column_lock = column_lock;
        self
    }

    /// Whether completing the first row locks the column count.
    pub(crate) fn locks_on_first_row(&self) -> bool {
        match self.column_lock {
            ColumnLock::Headers => self.has_headers,
            ColumnLock::FirstRow => true,
            ColumnLock::Fixed(_) | ColumnLock::Disabled => false,
        }
    }
}

impl Default for DsvOptions {
    fn default() -> Self {
        Self::csv()
    }
}
