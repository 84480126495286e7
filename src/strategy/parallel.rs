// Parallel tokenizing using Rayon
//
// Strategy:
// 1. Single-threaded: read the header row and find row boundaries near
//    evenly spaced targets (must handle quotes correctly)
// 2. Parallel: run an independent tokenizer over each sub-range
//
// Each tokenizer is confined to one worker; only borrowed field values cross
// back to the calling thread.

use std::ops::Range;

use rayon::prelude::*;

use crate::core::{skip_preamble, Field};
use crate::encoding::Encoding;
use crate::error::DsvResult;
use crate::options::{ColumnLock, DsvOptions};
use crate::strategy::direct::read_row;
use crate::tokenizer::Tokenizer;

/// A contiguous run of whole rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
    pub index: usize,
    /// Byte range within the whole input.
    pub range: Range<usize>,
    pub text: &'a str,
    /// Headers off; column lock fixed to the input's width when locking applies.
    pub options: DsvOptions,
}

impl<'a> Partition<'a> {
    pub fn tokenizer(&self) -> Tokenizer<'a> {
        Tokenizer::new(self.text, self.options)
    }
}

/// Input split into independently tokenizable partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionedInput<'a> {
    pub headers: Option<Vec<Field<'a>>>,
    /// Width every partition enforces, if any.
    pub column_count: Option<usize>,
    pub partitions: Vec<Partition<'a>>,
}

/// Number of partitions matching the rayon pool size.
pub fn recommended_parts() -> usize {
    rayon::current_num_threads().max(1)
}

/// Split `input` into at most `parts` partitions at row boundaries.
///
/// The header row (if any) is read here, so partitions only hold data rows.
/// Boundaries are found by tracking escape parity, which agrees with the
/// tokenizer on well-formed input; malformed input still fails inside the
/// partition that holds the offending field.
pub fn partition<'a>(
    input: &'a str,
    options: DsvOptions,
    encoding: Encoding,
    parts: usize,
) -> DsvResult<PartitionedInput<'a>> {
    let mut tokenizer = Tokenizer::with_encoding(input, options, encoding);

    let headers = if options.has_headers {
        read_row(&mut tokenizer)?
    } else {
        None
    };
    let body_start = match headers {
        Some(_) => tokenizer.position(),
        None => skip_preamble(input, encoding.preamble_str()),
    };

    let column_count = match options.column_lock {
        ColumnLock::Fixed(n) => Some(n),
        _ if options.locks_on_first_row() => match &headers {
            Some(header) => Some(header.len()),
            // Peek at the first data row without consuming it
            None => read_row(&mut tokenizer.clone())?.map(|row| row.len()),
        },
        _ => None,
    };

    let part_options = options
        .with_headers(false)
        .with_column_lock(column_count.map_or(ColumnLock::Disabled, ColumnLock::Fixed));

    let points = split_points(input, body_start, options.escape, parts.max(1));
    let partitions: Vec<Partition<'a>> = points
        .windows(2)
        .enumerate()
        .map(|(index, w)| Partition {
            index,
            range: w[0]..w[1],
            text: &input[w[0]..w[1]],
            options: part_options,
        })
        .collect();

    tracing::debug!(
        requested = parts,
        partitions = partitions.len(),
        body_start,
        ?column_count,
        "partition plan"
    );

    Ok(PartitionedInput {
        headers,
        column_count,
        partitions,
    })
}

/// Row boundaries splitting `input[start..]` into at most `parts` ranges.
///
/// Always starts with `start` and ends with `input.len()`. Cuts fall right
/// after an unquoted `\n`, so CRLF stays with the row it ends.
fn split_points(input: &str, start: usize, escape: char, parts: usize) -> Vec<usize> {
    let len = input.len();
    let mut points = vec![start];
    if start >= len {
        return points;
    }
    if parts > 1 {
        let target = (len - start).div_ceil(parts);
        let mut next_cut = start + target;
        let mut in_quotes = false;
        for (offset, ch) in input[start..].char_indices() {
            if ch == escape {
                in_quotes = !in_quotes;
            } else if ch == '\n' && !in_quotes {
                let cut = start + offset + 1;
                if cut >= next_cut && cut < len {
                    points.push(cut);
                    if points.len() == parts {
                        break;
                    }
                    next_cut = cut + target;
                }
            }
        }
    }
    points.push(len);
    points
}

/// Run `f` over every partition on the rayon pool.
///
/// Results come back in partition order. If several partitions fail, the
/// error from the earliest one is returned, with its byte position made
/// relative to the whole input.
pub fn par_map<'a, T, F>(input: &PartitionedInput<'a>, f: F) -> DsvResult<Vec<T>>
where
    T: Send,
    F: Fn(&Partition<'a>, Tokenizer<'a>) -> DsvResult<T> + Sync,
{
    let results: Vec<DsvResult<T>> = input
        .partitions
        .par_iter()
        .map(|part| f(part, part.tokenizer()).map_err(|err| err.offset_by(part.range.start)))
        .collect();
    results.into_iter().collect()
}

/// Tokenize `input` in parallel and return its data rows in input order.
///
/// The header row is not included; use [`partition`] to get at it.
pub fn par_read_rows<'a>(
    input: &'a str,
    options: DsvOptions,
    encoding: Encoding,
    parts: usize,
) -> DsvResult<Vec<Vec<Field<'a>>>> {
    let partitioned = partition(input, options, encoding, parts)?;
    let chunks = par_map(&partitioned, |_, mut tokenizer| {
        let mut rows = Vec::new();
        while let Some(row) = read_row(&mut tokenizer)? {
            rows.push(row);
        }
        Ok(rows)
    })?;
    Ok(chunks.into_iter().flatten().collect())
}
