//! Text header that precedes every encoded payload.
//!
//! ```text
//! 61=0
//! 62=100
//! 63=1010
//! 64=1011
//! 72=11
//! Uncompressed Length: 11
//! Compressed Length: 23
//! Compression Ratio: 0.083969
//! 01001101010...
//! ```
//!
//! Each line is newline-terminated; the payload begins at the byte after the
//! ratio line's newline.

use std::fmt::Write as _;
use tracing::debug;

use crate::engine::code_table::{CodeEntry, CodeTable};
use crate::engine::error::{CodecError, CodecResult};

pub const UNCOMPRESSED_LENGTH: &str = "Uncompressed Length: ";
pub const COMPRESSED_LENGTH: &str = "Compressed Length: ";
pub const COMPRESSION_RATIO: &str = "Compression Ratio: ";

/// At most one table line per byte value.
const MAX_TABLE_LINES: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub table: CodeTable,
    pub uncompressed_length: usize,
    pub compressed_length: usize,
    pub ratio: f64,
}

impl Header {
    pub fn new(table: CodeTable, uncompressed_length: usize, compressed_length: usize) -> Self {
        let ratio = compression_ratio(&table, uncompressed_length, compressed_length);
        Self {
            table,
            uncompressed_length,
            compressed_length,
            ratio,
        }
    }

    /// Render the header. Its byte length is the payload offset.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(table_bytes(&self.table) + 96);
        for entry in self.table.iter() {
            // writing into a String cannot fail
            let _ = writeln!(out, "{:x}={}", entry.symbol, entry.code);
        }
        let _ = writeln!(out, "{UNCOMPRESSED_LENGTH}{}", self.uncompressed_length);
        let _ = writeln!(out, "{COMPRESSED_LENGTH}{}", self.compressed_length);
        let _ = writeln!(out, "{COMPRESSION_RATIO}{:.6}", self.ratio);
        out
    }

    /// Parse the header at the start of `file`, returning it together with
    /// the offset of the first payload byte.
    pub fn parse(file: &[u8]) -> CodecResult<(Self, usize)> {
        debug!("Extracting header from {} bytes", file.len());

        let mut lines = Lines::new(file);
        let mut entries = Vec::new();

        let uncompressed_length = loop {
            let line = lines.next_line()
                .ok_or_else(|| CodecError::format("missing `Uncompressed Length:` line"))?;

            if let Some(value) = line.strip_prefix(UNCOMPRESSED_LENGTH) {
                break parse_length(UNCOMPRESSED_LENGTH, value)?;
            }

            if entries.len() == MAX_TABLE_LINES {
                return Err(CodecError::format("more than 256 code table lines"));
            }
            entries.push(parse_entry(line)?);
        };

        let compressed_length = match lines.next_line().and_then(|l| l.strip_prefix(COMPRESSED_LENGTH)) {
            Some(value) => parse_length(COMPRESSED_LENGTH, value)?,
            None => return Err(CodecError::format("missing `Compressed Length:` line")),
        };

        let ratio = match lines.next_line().and_then(|l| l.strip_prefix(COMPRESSION_RATIO)) {
            Some(value) => value.parse::<f64>()
                .ok()
                .filter(|r| r.is_finite() && *r >= 0.0)
                .ok_or_else(|| CodecError::format(format!("invalid compression ratio {:?}", value)))?,
            None => return Err(CodecError::format("missing `Compression Ratio:` line")),
        };

        let table = CodeTable::from_entries(entries)?;
        debug!("Header extracted: {} codes, payload at offset {}", table.len(), lines.offset());

        Ok((
            Self {
                table,
                uncompressed_length,
                compressed_length,
                ratio,
            },
            lines.offset(),
        ))
    }
}

/// `n / (m + header bytes)`, where the header bytes include the ratio line.
/// The ratio's own width feeds back into the denominator, so iterate until
/// the rendered line length settles.
fn compression_ratio(table: &CodeTable, n: usize, m: usize) -> f64 {
    let fixed = table_bytes(table)
        + UNCOMPRESSED_LENGTH.len() + decimal_width(n) + 1
        + COMPRESSED_LENGTH.len() + decimal_width(m) + 1;

    let mut ratio_line = COMPRESSION_RATIO.len() + "0.000000".len() + 1;
    let mut ratio = 0.0;
    for _ in 0..8 {
        ratio = n as f64 / (m + fixed + ratio_line) as f64;
        let rendered = COMPRESSION_RATIO.len() + format!("{:.6}", ratio).len() + 1;
        if rendered == ratio_line {
            break;
        }
        ratio_line = rendered;
    }
    ratio
}

fn table_bytes(table: &CodeTable) -> usize {
    table.iter()
        .map(|entry| hex_width(entry.symbol) + 1 + entry.code.len() + 1)
        .sum()
}

fn hex_width(symbol: u8) -> usize {
    if symbol < 0x10 { 1 } else { 2 }
}

fn decimal_width(value: usize) -> usize {
    value.checked_ilog10().map_or(1, |digits| digits as usize + 1)
}

fn parse_entry(line: &str) -> CodecResult<CodeEntry> {
    let (symbol, code) = line.split_once('=')
        .ok_or_else(|| CodecError::format(format!("malformed code table line {:?}", line)))?;

    if symbol.is_empty() || !symbol.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::format(format!("invalid symbol {:?}", symbol)));
    }
    let symbol = u8::from_str_radix(symbol, 16)
        .map_err(|_| CodecError::format(format!("symbol {:?} out of byte range", symbol)))?;

    Ok(CodeEntry {
        symbol,
        code: code.to_string(),
    })
}

fn parse_length(label: &str, value: &str) -> CodecResult<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::format(format!("invalid {}{:?}", label, value)));
    }
    value.parse()
        .map_err(|_| CodecError::format(format!("invalid {}{:?}", label, value)))
}

/// Newline-terminated text lines at the front of a byte buffer. An
/// unterminated tail is never returned as a line.
struct Lines<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let rest = &self.buf[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n')?;
        let line = std::str::from_utf8(&rest[..end]).ok()?;
        self.pos += end + 1;
        Some(line)
    }

    fn offset(&self) -> usize {
        self.pos
    }
}
