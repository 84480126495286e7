//! Line break recognition for row boundaries.
//!
//! Only `\n` and `\r\n` are row boundaries. A bare `\r` is data. Both
//! characters are ASCII, so byte-level checks are safe on any UTF-8 input
//! regardless of the surrounding multi-byte characters.

/// A recognized line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewlineKind {
    /// `\n`
    LineFeed,
    /// `\r\n`
    CarriageReturnLineFeed,
}

impl NewlineKind {
    /// Number of bytes (and characters) the line break occupies.
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            NewlineKind::LineFeed => 1,
            NewlineKind::CarriageReturnLineFeed => 2,
        }
    }
}

/// Which side of a position to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The line break ends exactly at `pos` (inspects `pos - 1`, `pos - 2`).
    Backward,
    /// The line break starts exactly at `pos` (inspects `pos`, `pos + 1`).
    Forward,
}

/// Returns the line break that ends at, or starts at, `pos`.
///
/// Out-of-range positions never panic; they simply match nothing.
#[inline]
pub fn match_newline(input: &[u8], pos: usize, direction: Direction) -> Option<NewlineKind> {
    match direction {
        Direction::Backward => {
            if pos == 0 || pos > input.len() || input[pos - 1] != b'\n' {
                return None;
            }
            if pos >= 2 && input[pos - 2] == b'\r' {
                Some(NewlineKind::CarriageReturnLineFeed)
            } else {
                Some(NewlineKind::LineFeed)
            }
        }
        Direction::Forward => match input.get(pos..)? {
            [b'\n', ..] => Some(NewlineKind::LineFeed),
            [b'\r', b'\n', ..] => Some(NewlineKind::CarriageReturnLineFeed),
            _ => None,
        },
    }
}
