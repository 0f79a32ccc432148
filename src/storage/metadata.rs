use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::hash::sha256_hex;

pub const ENGINE_VERSION: &str = concat!("huffpack@", env!("CARGO_PKG_VERSION"));

/// Which direction of the codec produced a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Compress,
    Decompress,
}

impl FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compress" => Ok(Service::Compress),
            "decompress" => Ok(Service::Decompress),
            other => Err(format!("unknown service_type {:?}", other)),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Compress => write!(f, "compress"),
            Service::Decompress => write!(f, "decompress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub key: String,
    pub service: Service,
    pub input_size: u64,
    pub output_size: u64,
    /// Hex SHA-256 of the stored bytes
    pub content_hash: String,
    pub stored_at: u64,
    pub engine_version: String,
}

impl ObjectMetadata {
    pub fn new(key: String, service: Service, input_size: u64, output: &[u8]) -> Self {
        Self {
            key,
            service,
            input_size,
            output_size: output.len() as u64,
            content_hash: sha256_hex(output),
            stored_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            engine_version: ENGINE_VERSION.to_string(),
        }
    }

    pub fn verify_integrity(&self, data: &[u8]) -> bool {
        sha256_hex(data) == self.content_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_parses_query_values() {
        assert_eq!("compress".parse::<Service>(), Ok(Service::Compress));
        assert_eq!("decompress".parse::<Service>(), Ok(Service::Decompress));
        assert!("zip".parse::<Service>().is_err());
        assert_eq!(Service::Decompress.to_string(), "decompress");
    }

    #[test]
    fn integrity_follows_content() {
        let meta = ObjectMetadata::new("out.huff".into(), Service::Compress, 11, b"payload");
        assert_eq!(meta.output_size, 7);
        assert!(meta.verify_integrity(b"payload"));
        assert!(!meta.verify_integrity(b"payloaD"));
    }

    #[test]
    fn serializes_service_lowercase() {
        let meta = ObjectMetadata::new("k".into(), Service::Decompress, 1, b"x");
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"service\":\"decompress\""));
    }
}
