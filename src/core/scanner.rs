// Quoting automaton driven by the tokenizer.
//
// Only escape characters change state. Delimiters and line breaks are
// structural in `Unquoted` and plain data in `Quoted`; any character other
// than a second escape is rejected in `QuotedAmbiguous`.

/// Quoting state of the field being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Outside quoting: delimiters and line breaks end the field.
    #[default]
    Unquoted,
    /// Inside a quoted field.
    Quoted,
    /// Inside a quoted field, one escape seen that must be doubled next.
    QuotedAmbiguous,
}

/// What an escape character meant, given the state it was seen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeEvent {
    /// Opening quote at the start of a field.
    Open,
    /// Closing quote; the field content ends here.
    Close,
    /// First half of a doubled escape, awaiting confirmation.
    Pending,
    /// Confirmed doubled escape: one literal escape character.
    Doubled,
    /// Escape inside an unquoted field.
    Stray,
}

impl ScanState {
    /// Transition on an escape character.
    ///
    /// `at_field_start` is true when nothing but whitespace precedes the
    /// escape in the current field. `closes_field` is true when the escape is
    /// followed by a delimiter, a line break or the end of input.
    #[inline]
    pub fn on_escape(self, at_field_start: bool, closes_field: bool) -> (ScanState, EscapeEvent) {
        match self {
            ScanState::Unquoted if at_field_start => (ScanState::Quoted, EscapeEvent::Open),
            ScanState::Unquoted => (ScanState::Unquoted, EscapeEvent::Stray),
            ScanState::Quoted if closes_field => (ScanState::Unquoted, EscapeEvent::Close),
            ScanState::Quoted => (ScanState::QuotedAmbiguous, EscapeEvent::Pending),
            ScanState::QuotedAmbiguous => (ScanState::Quoted, EscapeEvent::Doubled),
        }
    }

    /// Whether a non-escape character is valid in this state.
    #[inline]
    pub fn accepts_other(self) -> bool {
        self != ScanState::QuotedAmbiguous
    }

    /// Whether delimiters and line breaks are data in this state.
    #[inline]
    pub fn is_quoting(self) -> bool {
        self != ScanState::Unquoted
    }
}
