use tracing::{debug, info};

use crate::engine::{
    code_table::CodeTable,
    error::{CodecError, CodecResult},
    frequency::FrequencyTable,
    header::Header,
    huffman::HuffmanTree,
};

/// Result of a compression pass: the header and the ASCII `'0'`/`'1'`
/// payload that follows it on disk.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub header: Header,
    header_text: String,
    payload: Vec<u8>,
}

impl Artifact {
    pub fn header_text(&self) -> &str {
        &self.header_text
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Byte offset of the payload in the persisted artifact.
    pub fn payload_offset(&self) -> usize {
        self.header_text.len()
    }

    pub fn len(&self) -> usize {
        self.header_text.len() + self.payload.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(self.header_text.as_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Concatenate each input byte's code. Single-symbol tables have an empty
/// code and so produce an empty payload.
pub fn encode(input: &[u8], table: &CodeTable) -> CodecResult<Vec<u8>> {
    debug!("Encoding {} bytes with {} codes", input.len(), table.len());

    let mut index: [Option<&str>; 256] = [None; 256];
    for entry in table.iter() {
        index[entry.symbol as usize] = Some(entry.code.as_str());
    }

    let mut out = Vec::with_capacity(input.len());
    for &byte in input {
        let code = index[byte as usize].ok_or(CodecError::Encoding { symbol: byte })?;
        out.extend_from_slice(code.as_bytes());
    }

    Ok(out)
}

pub fn compress(input: &[u8]) -> CodecResult<Artifact> {
    info!("Start compressing {} bytes", input.len());

    let frequencies = FrequencyTable::analyze(input);
    debug!("Counted {} distinct symbols over {} bytes", frequencies.distinct(), frequencies.total());

    let tree = HuffmanTree::build(&frequencies);
    debug!(
        "Tree has {} leaves, {} internal nodes, root weight {}",
        tree.leaf_count(),
        tree.internal_count(),
        tree.root_frequency()
    );
    let table = CodeTable::derive(&tree);
    let payload = encode(input, &table)?;

    let header = Header::new(table, input.len(), payload.len());
    let header_text = header.serialize();

    info!(
        "Done compressing: {} symbols, {} -> {} bytes (ratio {:.6})",
        tree.size(),
        input.len(),
        header_text.len() + payload.len(),
        header.ratio
    );

    Ok(Artifact {
        header,
        header_text,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::code_table::CodeEntry;

    #[test]
    fn abracadabra_payload() {
        let artifact = compress(b"abracadabra").expect("compress");

        assert_eq!(artifact.payload(), b"01001101010010110100110");
        assert_eq!(artifact.header.compressed_length, 23);
        assert_eq!(artifact.header.uncompressed_length, 11);
        assert!(artifact.header_text().starts_with("61=0\n62=100\n63=1010\n64=1011\n72=11\n"));
    }

    #[test]
    fn single_symbol_emits_no_bits() {
        let artifact = compress(b"aaaa").expect("compress");

        assert!(artifact.payload().is_empty());
        assert!(artifact.header_text().starts_with("61=\nUncompressed Length: 4\nCompressed Length: 0\n"));
    }

    #[test]
    fn empty_input() {
        let artifact = compress(b"").expect("compress");

        assert!(artifact.payload().is_empty());
        assert!(artifact.header_text().starts_with("Uncompressed Length: 0\n"));
        assert_eq!(artifact.header.table.len(), 0);
    }

    #[test]
    fn deterministic_output() {
        let data = b"determinism: the same input must give the same bytes";
        assert_eq!(
            compress(data).expect("first").to_bytes(),
            compress(data).expect("second").to_bytes()
        );
    }

    #[test]
    fn payload_follows_header() {
        let artifact = compress(b"hello world").expect("compress");
        let bytes = artifact.to_bytes();

        assert_eq!(bytes.len(), artifact.len());
        assert_eq!(&bytes[artifact.payload_offset()..], artifact.payload());
    }

    #[test]
    fn unknown_byte_is_an_encoding_error() {
        let table = CodeTable::from_entries(vec![
            CodeEntry { symbol: b'a', code: "0".into() },
            CodeEntry { symbol: b'b', code: "1".into() },
        ]).expect("table");

        assert_eq!(encode(b"abc", &table), Err(CodecError::Encoding { symbol: b'c' }));
    }
}
