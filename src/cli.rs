use std::path::Path;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{compress, decompress};
use crate::storage::Service;
use crate::utils::io::{append_data, read_file, write_data};

/// Outcome of a one-shot file command, printed as text or `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub service: Service,
    pub input: String,
    pub output: String,
    pub input_bytes: u64,
    pub output_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
}

impl Summary {
    pub fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
        } else {
            println!("✅ {} {} -> {}", self.service, self.input, self.output);
            println!("   {} -> {} bytes", self.input_bytes, self.output_bytes);
            if let Some(ratio) = self.compression_ratio {
                println!("   Compression ratio: {:.6}", ratio);
            }
        }
        Ok(())
    }
}

/// Write the header, then append the payload.
pub async fn compress_file(input: &Path, output: &Path) -> Result<Summary> {
    let data = read_file(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;

    let artifact = compress(&data)?;
    write_data(output, artifact.header_text().as_bytes())
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    append_data(output, artifact.payload())
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    debug!("Payload starts at byte {}", artifact.payload_offset());
    info!("Compressed {} into {}", input.display(), output.display());
    Ok(Summary {
        service: Service::Compress,
        input: input.display().to_string(),
        output: output.display().to_string(),
        input_bytes: data.len() as u64,
        output_bytes: artifact.len() as u64,
        compression_ratio: Some(artifact.header.ratio),
    })
}

pub async fn decompress_file(input: &Path, output: &Path) -> Result<Summary> {
    let data = read_file(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;

    let restored = decompress(&data)
        .with_context(|| format!("decompressing {}", input.display()))?;
    write_data(output, &restored)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    info!("Decompressed {} into {}", input.display(), output.display());
    Ok(Summary {
        service: Service::Decompress,
        input: input.display().to_string(),
        output: output.display().to_string(),
        input_bytes: data.len() as u64,
        output_bytes: restored.len() as u64,
        compression_ratio: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CodecError;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("huffpack-cli-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn compress_then_decompress_files() {
        let dir = scratch("roundtrip");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let (input, packed, restored) = (dir.join("in.txt"), dir.join("in.huff"), dir.join("out.txt"));
        tokio::fs::write(&input, b"mississippi river").await.unwrap();

        let summary = compress_file(&input, &packed).await.unwrap();
        assert_eq!(summary.input_bytes, 17);
        assert_eq!(summary.output_bytes, tokio::fs::metadata(&packed).await.unwrap().len());
        assert!(summary.compression_ratio.is_some());

        let summary = decompress_file(&packed, &restored).await.unwrap();
        assert_eq!(summary.output_bytes, 17);
        assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"mississippi river");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn compress_overwrites_existing_output() {
        let dir = scratch("overwrite");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let (input, packed) = (dir.join("in.txt"), dir.join("in.huff"));
        tokio::fs::write(&input, b"aaaa").await.unwrap();
        tokio::fs::write(&packed, b"stale contents that are much longer").await.unwrap();

        compress_file(&input, &packed).await.unwrap();
        let written = tokio::fs::read(&packed).await.unwrap();
        assert!(written.starts_with(b"61=\nUncompressed Length: 4\n"));
        assert_eq!(crate::engine::decompress(&written).unwrap(), b"aaaa");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn corrupt_artifact_reports_codec_error() {
        let dir = scratch("corrupt");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let input = dir.join("bad.huff");
        tokio::fs::write(&input, b"61=0\n62=1\nCompressed Length: 2\n01").await.unwrap();

        let err = decompress_file(&input, &dir.join("out")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<CodecError>(), Some(CodecError::Format(_))));

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[test]
    fn summary_json_shape() {
        let summary = Summary {
            service: Service::Decompress,
            input: "a.huff".into(),
            output: "a".into(),
            input_bytes: 10,
            output_bytes: 3,
            compression_ratio: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["service"], "decompress");
        assert!(json.get("compression_ratio").is_none());
    }
}
