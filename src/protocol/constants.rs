//! HTTP limits and fixed strings used by the upload/download server

/// Largest accepted request head (request line + headers)
pub const MAX_HEAD_SIZE: usize = 16 * 1024;

/// Socket read granularity
pub const READ_CHUNK: usize = 8 * 1024;

pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
pub const CRLF: &[u8] = b"\r\n";

pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
