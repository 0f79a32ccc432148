use tracing::{debug, info};

use crate::engine::{
    error::{CodecError, CodecResult},
    header::Header,
    huffman::HuffmanTree,
};

/// Largest output `decompress` will produce.
pub const MAX_OUTPUT_SIZE: usize = u32::MAX as usize;

/// Walk `tree` against the `'0'`/`'1'` payload. `expected_len` is the
/// header's uncompressed length; a lone-leaf tree replays its symbol that
/// many times without consuming payload. Lengths above `max_output` are
/// refused before anything is allocated.
pub fn decode(
    tree: &HuffmanTree,
    payload: &[u8],
    expected_len: usize,
    max_output: usize,
) -> CodecResult<Vec<u8>> {
    debug!("Decoding {} payload characters", payload.len());

    if expected_len > max_output {
        return Err(CodecError::format(format!(
            "header declares {} bytes, output limit is {}",
            expected_len, max_output
        )));
    }

    let Some(root) = tree.root() else {
        if expected_len > 0 || !payload.is_empty() {
            return Err(CodecError::format("data present but code table is empty"));
        }
        return Ok(Vec::new());
    };

    if tree.node(root).is_leaf() {
        if !payload.is_empty() {
            return Err(CodecError::format("single-symbol artifact carries payload"));
        }
        let mut out = Vec::new();
        out.try_reserve_exact(expected_len)
            .map_err(|_| CodecError::format(format!("cannot allocate {} output bytes", expected_len)))?;
        out.resize(expected_len, tree.node(root).symbol);
        return Ok(out);
    }

    // every decoded byte costs at least one payload character
    if expected_len > payload.len() {
        return Err(CodecError::format(format!(
            "header declares {} bytes but the payload holds at most {}",
            expected_len,
            payload.len()
        )));
    }

    let mut out = Vec::with_capacity(expected_len);
    let mut current = root;

    for (position, &bit) in payload.iter().enumerate() {
        if bit != b'0' && bit != b'1' {
            return Err(CodecError::format(format!(
                "invalid payload character {:#04x} at offset {}",
                bit, position
            )));
        }

        let next = tree.node(current).child(bit).ok_or_else(|| {
            CodecError::format(format!("payload offset {} leads outside the code tree", position))
        })?;

        if tree.node(next).is_leaf() {
            out.push(tree.node(next).symbol);
            current = root;
        } else {
            current = next;
        }
    }

    if current != root {
        return Err(CodecError::TruncatedInput { consumed: payload.len() });
    }

    if out.len() != expected_len {
        return Err(CodecError::format(format!(
            "decoded {} bytes, header declares {}",
            out.len(),
            expected_len
        )));
    }

    Ok(out)
}

pub fn decompress(file: &[u8]) -> CodecResult<Vec<u8>> {
    decompress_with_limit(file, MAX_OUTPUT_SIZE)
}

/// `decompress` with a caller-chosen cap on the output size.
pub fn decompress_with_limit(file: &[u8], max_output: usize) -> CodecResult<Vec<u8>> {
    info!("Start decompressing {} bytes", file.len());

    let (header, offset) = Header::parse(file)?;
    let payload = &file[offset..];

    if payload.len() < header.compressed_length {
        return Err(CodecError::TruncatedInput { consumed: payload.len() });
    }
    if payload.len() > header.compressed_length {
        return Err(CodecError::format(format!(
            "{} trailing bytes after payload",
            payload.len() - header.compressed_length
        )));
    }

    let tree = HuffmanTree::from_code_table(&header.table)?;
    let out = decode(&tree, payload, header.uncompressed_length, max_output)?;

    info!("Done decompressing: {} bytes", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compress;

    fn roundtrip(data: &[u8]) {
        let artifact = compress(data).expect("compress");
        let restored = decompress(&artifact.to_bytes()).expect("decompress");
        assert_eq!(restored, data);
    }

    /// Deterministic pseudo-random bytes (xorshift).
    fn noise(len: usize, mut state: u64) -> Vec<u8> {
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn roundtrip_edge_inputs() {
        roundtrip(b"");
        roundtrip(b"x");
        roundtrip(b"aaaa");
        roundtrip(b"abracadabra");
        roundtrip(&(0..=255).collect::<Vec<u8>>());
        roundtrip(&[0u8, 0xff]);
    }

    #[test]
    fn roundtrip_mixed_inputs() {
        roundtrip(&noise(4096, 0x9e3779b97f4a7c15));
        roundtrip(include_bytes!("huffman.rs"));

        let skewed: Vec<u8> = (0..2000u32).map(|i| if i % 97 == 0 { (i % 251) as u8 } else { b'e' }).collect();
        roundtrip(&skewed);
    }

    #[test]
    fn single_symbol_replays_length() {
        let artifact = compress(b"aaaa").expect("compress");
        let restored = decompress(&artifact.to_bytes()).expect("decompress");
        assert_eq!(restored, b"aaaa");
    }

    #[test]
    fn missing_sentinel_fails_closed() {
        let artifact = compress(b"abracadabra").expect("compress");
        let text = artifact.header_text().replace("Uncompressed Length: 11\n", "");
        let mut file = text.into_bytes();
        file.extend_from_slice(artifact.payload());

        assert!(matches!(decompress(&file), Err(CodecError::Format(_))));
    }

    #[test]
    fn short_payload_is_truncated() {
        let bytes = compress(b"abracadabra").expect("compress").to_bytes();
        let cut = &bytes[..bytes.len() - 2];

        assert!(matches!(decompress(cut), Err(CodecError::TruncatedInput { .. })));
    }

    #[test]
    fn payload_ending_mid_code_is_truncated() {
        let artifact = compress(b"abracadabra").expect("compress");
        let tree = HuffmanTree::from_code_table(&artifact.header.table).expect("tree");

        // "10" stops halfway down the path to 'b' (100)
        assert_eq!(
            decode(&tree, b"010", 2, MAX_OUTPUT_SIZE),
            Err(CodecError::TruncatedInput { consumed: 3 })
        );
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = compress(b"abracadabra").expect("compress").to_bytes();
        bytes.extend_from_slice(b"0");

        assert!(matches!(decompress(&bytes), Err(CodecError::Format(_))));
    }

    #[test]
    fn non_binary_payload_is_rejected() {
        let mut bytes = compress(b"abracadabra").expect("compress").to_bytes();
        let last = bytes.len() - 1;
        bytes[last] = b'2';

        assert!(matches!(decompress(&bytes), Err(CodecError::Format(_))));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let artifact = compress(b"abracadabra").expect("compress");
        let text = artifact.header_text().replace("Uncompressed Length: 11\n", "Uncompressed Length: 12\n");
        let mut file = text.into_bytes();
        file.extend_from_slice(artifact.payload());

        assert!(matches!(decompress(&file), Err(CodecError::Format(_))));
    }

    #[test]
    fn empty_table_with_data_is_rejected() {
        let file = b"Uncompressed Length: 3\nCompressed Length: 0\nCompression Ratio: 0.000000\n";
        assert!(matches!(decompress(file), Err(CodecError::Format(_))));
    }

    #[test]
    fn oversized_length_with_short_payload_is_rejected() {
        let file = b"61=0\n62=1\nUncompressed Length: 1099511627776000\nCompressed Length: 1\nCompression Ratio: 0.000000\n0";
        assert!(matches!(decompress(file), Err(CodecError::Format(_))));

        let file = b"61=0\n62=1\nUncompressed Length: 18446744073709551615\nCompressed Length: 1\nCompression Ratio: 0.000000\n0";
        assert!(matches!(decompress(file), Err(CodecError::Format(_))));
    }

    #[test]
    fn length_beyond_payload_is_rejected_before_decoding() {
        let artifact = compress(b"abracadabra").expect("compress");
        let tree = HuffmanTree::from_code_table(&artifact.header.table).expect("tree");

        assert!(matches!(
            decode(&tree, artifact.payload(), 24, MAX_OUTPUT_SIZE),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn oversized_single_symbol_replay_is_rejected() {
        let file = b"61=\nUncompressed Length: 18446744073709551615\nCompressed Length: 0\nCompression Ratio: 0.000000\n";
        assert!(matches!(decompress(file), Err(CodecError::Format(_))));

        let file = b"61=\nUncompressed Length: 4097\nCompressed Length: 0\nCompression Ratio: 0.000000\n";
        assert!(matches!(decompress_with_limit(file, 4096), Err(CodecError::Format(_))));
        assert_eq!(decompress_with_limit(file, 4097).expect("within limit"), vec![b'a'; 4097]);
    }

    #[test]
    fn single_symbol_with_payload_is_rejected() {
        let file = b"61=\nUncompressed Length: 2\nCompressed Length: 1\nCompression Ratio: 0.000000\n0";
        assert!(matches!(decompress(file), Err(CodecError::Format(_))));
    }

    #[test]
    fn descent_into_missing_child_is_rejected() {
        // no code starts with "01"
        let file = b"61=00\n62=1\nUncompressed Length: 1\nCompressed Length: 2\nCompression Ratio: 0.000000\n01";
        assert!(matches!(decompress(file), Err(CodecError::Format(_))));
    }
}
