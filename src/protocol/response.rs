use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    UnprocessableEntity,
    InternalServerError,
}

impl StatusCode {
    pub fn code(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::UnprocessableEntity => 422,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UnprocessableEntity => "Unprocessable Entity",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body.into())
    }

    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::Ok, "text/html; charset=utf-8", body)
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::new(StatusCode::Ok, "application/json", body.into())
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::text(StatusCode::Ok, body)
    }

    pub fn not_found() -> Self {
        Self::text(StatusCode::NotFound, "Not Found")
    }

    pub fn error(status: StatusCode, message: impl std::fmt::Display) -> Self {
        Self::text(status, message.to_string())
    }

    /// File download; the name is echoed in `Content-Disposition`.
    pub fn attachment(filename: &str, data: Vec<u8>) -> Self {
        let mut response = Self::new(StatusCode::Ok, "application/octet-stream", data);
        response.headers.push((
            "Access-Control-Expose-Headers".to_string(),
            "Content-Disposition".to_string(),
        ));
        response.headers.push((
            "Content-Disposition".to_string(),
            format!("attachment; filename=\"{}\"", filename),
        ));
        response
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {} {}\r\n", self.status.code(), self.status.reason());
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        out.push_str("Connection: close\r\n\r\n");

        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> std::io::Result<()> {
        trace!("Writing {} response with {} byte body", self.status.code(), self.body.len());
        writer.write_all(&self.encode()).await?;
        writer.flush().await?;
        Ok(())
    }
}
