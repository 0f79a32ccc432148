use std::fmt;

use crate::protocol::response::StatusCode;

#[derive(Debug)]
pub enum ProtocolError {
    Io(std::io::Error),
    ConnectionClosed,
    Truncated,
    HeadTooLarge(usize),
    BodyTooLarge(usize),
    InvalidRequestLine,
    InvalidHeader,
    InvalidMultipart(&'static str),
}

impl ProtocolError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProtocolError::HeadTooLarge(_) | ProtocolError::BodyTooLarge(_) =>
                StatusCode::PayloadTooLarge,
            ProtocolError::Io(_) | ProtocolError::ConnectionClosed =>
                StatusCode::InternalServerError,
            _ => StatusCode::BadRequest,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Io(e) =>
                write!(f, "i/o error: {}", e),
            ProtocolError::ConnectionClosed =>
                write!(f, "connection closed before request"),
            ProtocolError::Truncated =>
                write!(f, "truncated request"),
            ProtocolError::HeadTooLarge(size) =>
                write!(f, "request head too large: {}", size),
            ProtocolError::BodyTooLarge(size) =>
                write!(f, "request body too large: {}", size),
            ProtocolError::InvalidRequestLine =>
                write!(f, "invalid request line"),
            ProtocolError::InvalidHeader =>
                write!(f, "invalid header"),
            ProtocolError::InvalidMultipart(reason) =>
                write!(f, "invalid multipart body: {}", reason),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<std::io::Error> for ProtocolError {
    fn from(e: std::io::Error) -> Self {
        ProtocolError::Io(e)
    }
}
