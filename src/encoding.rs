// Byte → character decoders for byte-oriented input
//
// Pure-Rust decoders for the encodings a delimited file commonly arrives in.
// Decoding keeps any byte-order mark as a U+FEFF character; the tokenizer
// skips it when constructed with the matching encoding.

use crate::error::{DsvError, DsvResult};

/// Source encoding of raw input bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

const BOM: &str = "\u{FEFF}";

impl Encoding {
    /// Byte-order mark this encoding writes at the start of a file.
    pub const fn preamble(self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Latin1 => &[],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf16Be => &[0xFE, 0xFF],
            Encoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Encoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
        }
    }

    /// The preamble as it appears in decoded text.
    pub const fn preamble_str(self) -> &'static str {
        match self {
            Encoding::Latin1 => "",
            _ => BOM,
        }
    }

    /// Decode raw bytes into an owned character buffer.
    pub fn decode(self, input: &[u8]) -> DsvResult<String> {
        match self {
            Encoding::Utf8 => decode_utf8(input),
            Encoding::Latin1 => Ok(decode_latin1(input)),
            Encoding::Utf16Le => decode_utf16(input, false),
            Encoding::Utf16Be => decode_utf16(input, true),
            Encoding::Utf32Le => decode_utf32(input, false),
            Encoding::Utf32Be => decode_utf32(input, true),
        }
    }

    fn error(self, offset: usize, reason: &'static str) -> DsvError {
        DsvError::Decode {
            encoding: self,
            offset,
            reason,
        }
    }
}

fn decode_utf8(input: &[u8]) -> DsvResult<String> {
    std::str::from_utf8(input)
        .map(str::to_owned)
        .map_err(|e| Encoding::Utf8.error(e.valid_up_to(), "invalid UTF-8 sequence"))
}

/// Every byte maps to the code point of the same value.
fn decode_latin1(input: &[u8]) -> String {
    // Non-ASCII bytes widen to two UTF-8 bytes
    let wide = input.iter().filter(|&&b| b >= 0x80).count();
    let mut out = String::with_capacity(input.len() + wide);
    out.extend(input.iter().map(|&b| b as char));
    out
}

fn decode_utf16(input: &[u8], big_endian: bool) -> DsvResult<String> {
    let encoding = if big_endian {
        Encoding::Utf16Be
    } else {
        Encoding::Utf16Le
    };
    if input.len() % 2 != 0 {
        return Err(encoding.error(input.len() - 1, "odd number of bytes"));
    }

    let units = input.chunks_exact(2).map(|pair| {
        let bytes = [pair[0], pair[1]];
        if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        }
    });

    let mut out = String::with_capacity(input.len() / 2);
    let mut offset = 0;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(ch) => {
                offset += ch.len_utf16() * 2;
                out.push(ch);
            }
            Err(_) => return Err(encoding.error(offset, "unpaired surrogate")),
        }
    }
    Ok(out)
}

fn decode_utf32(input: &[u8], big_endian: bool) -> DsvResult<String> {
    let encoding = if big_endian {
        Encoding::Utf32Be
    } else {
        Encoding::Utf32Le
    };
    if input.len() % 4 != 0 {
        return Err(encoding.error(input.len() - input.len() % 4, "truncated code unit"));
    }

    let mut out = String::with_capacity(input.len() / 4);
    for (i, quad) in input.chunks_exact(4).enumerate() {
        let bytes = [quad[0], quad[1], quad[2], quad[3]];
        let cp = if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        };
        match char::from_u32(cp) {
            Some(ch) => out.push(ch),
            None => return Err(encoding.error(i * 4, "invalid code point")),
        }
    }
    Ok(out)
}
