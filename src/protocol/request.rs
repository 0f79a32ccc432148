use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::protocol::{find, ProtocolError, HEAD_TERMINATOR, MAX_HEAD_SIZE, READ_CHUNK};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Parse the request line and headers (everything before the blank line).
    pub fn parse_head(head: &[u8]) -> Result<Self, ProtocolError> {
        let head = std::str::from_utf8(head).map_err(|_| ProtocolError::InvalidHeader)?;
        let mut lines = head.split("\r\n");

        let request_line = lines.next().ok_or(ProtocolError::InvalidRequestLine)?;
        let mut parts = request_line.split(' ');
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ProtocolError::InvalidRequestLine);
        };
        if method.is_empty() || !target.starts_with('/') || !version.starts_with("HTTP/1.") {
            return Err(ProtocolError::InvalidRequestLine);
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, Vec::new()),
        };

        let mut headers = Vec::new();
        for line in lines.filter(|l| !l.is_empty()) {
            let (name, value) = line.split_once(':').ok_or(ProtocolError::InvalidHeader)?;
            if name.is_empty() || name.contains(' ') {
                return Err(ProtocolError::InvalidHeader);
            }
            headers.push((name.to_string(), value.trim().to_string()));
        }

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            query,
            headers,
            body: Vec::new(),
        })
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> Result<usize, ProtocolError> {
        match self.header("content-length") {
            Some(value) => value.parse().map_err(|_| ProtocolError::InvalidHeader),
            None => Ok(0),
        }
    }
}

/// Read one request from `reader`. Bodies longer than `max_body` are refused
/// before they are read.
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_body: usize,
) -> Result<Request, ProtocolError> {
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let head_end = loop {
        if let Some(pos) = find(&buf, HEAD_TERMINATOR) {
            break pos;
        }
        if buf.len() > MAX_HEAD_SIZE {
            return Err(ProtocolError::HeadTooLarge(buf.len()));
        }

        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(if buf.is_empty() {
                ProtocolError::ConnectionClosed
            } else {
                ProtocolError::Truncated
            });
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let mut request = Request::parse_head(&buf[..head_end])?;
    trace!("Parsed request head: {} {}", request.method, request.path);

    let content_length = request.content_length()?;
    if content_length > max_body {
        return Err(ProtocolError::BodyTooLarge(content_length));
    }

    let mut body = buf.split_off(head_end + HEAD_TERMINATOR.len());
    body.reserve(content_length.saturating_sub(body.len()));
    while body.len() < content_length {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(ProtocolError::Truncated);
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    debug!("Read request {} {} with {} byte body", request.method, request.path, body.len());
    request.body = body;
    Ok(request)
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (percent_decode(name), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match bytes.get(i + 1..i + 3).and_then(|pair| hex_pair(pair[0], pair[1])) {
                Some(byte) => {
                    out.push(byte);
                    i += 2;
                }
                None => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}
