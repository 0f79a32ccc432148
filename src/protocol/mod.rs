pub mod constants;
pub mod error;
pub mod request;
pub mod multipart;
pub mod response;

pub use constants::*;
pub use error::ProtocolError;
pub use request::{Request, read_request};
pub use response::{Response, StatusCode};

/// Position of the first occurrence of `needle` in `haystack`
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
