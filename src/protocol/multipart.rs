use tracing::debug;

use crate::protocol::{find, ProtocolError, CRLF, HEAD_TERMINATOR, MULTIPART_FORM_DATA};

/// One part of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part<'a> {
    pub headers: &'a str,
    pub content: &'a [u8],
}

impl Part<'_> {
    pub fn is_file(&self) -> bool {
        self.headers
            .split("\r\n")
            .any(|line| {
                line.to_ascii_lowercase().starts_with("content-disposition:")
                    && line.contains("filename=")
            })
    }
}

/// Boundary parameter of a `multipart/form-data` content type
pub fn boundary(content_type: &str) -> Option<&str> {
    let (mime, params) = content_type.split_once(';')?;
    if !mime.trim().eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
        return None;
    }

    params
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

pub fn parse<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<Part<'a>>, ProtocolError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut closing = CRLF.to_vec();
    closing.extend_from_slice(&delimiter);

    let mut pos = find(body, &delimiter)
        .ok_or(ProtocolError::InvalidMultipart("boundary not found"))?
        + delimiter.len();
    let mut parts = Vec::new();

    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            break;
        }
        if !rest.starts_with(CRLF) {
            return Err(ProtocolError::InvalidMultipart("malformed delimiter line"));
        }
        let rest = &rest[CRLF.len()..];

        let headers_end = find(rest, HEAD_TERMINATOR)
            .ok_or(ProtocolError::InvalidMultipart("part headers not terminated"))?;
        let headers = std::str::from_utf8(&rest[..headers_end])
            .map_err(|_| ProtocolError::InvalidMultipart("part headers not utf-8"))?;

        let content = &rest[headers_end + HEAD_TERMINATOR.len()..];
        let content_end = find(content, &closing)
            .ok_or(ProtocolError::InvalidMultipart("missing closing boundary"))?;

        parts.push(Part {
            headers,
            content: &content[..content_end],
        });

        // `content` runs to the end of `body`, so this is the byte after the delimiter
        pos = body.len() - content.len() + content_end + closing.len();
    }

    debug!("Parsed {} multipart parts", parts.len());
    Ok(parts)
}

/// Content of the first file part, falling back to the first part.
pub fn extract_file<'a>(body: &'a [u8], boundary: &str) -> Result<&'a [u8], ProtocolError> {
    let parts = parse(body, boundary)?;
    parts
        .iter()
        .find(|part| part.is_file())
        .or_else(|| parts.first())
        .map(|part| part.content)
        .ok_or(ProtocolError::InvalidMultipart("no parts"))
}
