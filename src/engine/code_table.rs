use tracing::debug;

use crate::engine::error::{CodecError, CodecResult};
use crate::engine::huffman::HuffmanTree;
use crate::engine::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub symbol: u8,
    /// Root-to-leaf path, `'0'` = left, `'1'` = right.
    pub code: String,
}

/// Symbol to code mapping, always sorted by ascending symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    entries: Vec<CodeEntry>,
}

impl CodeTable {
    /// Walk each leaf up to the root and reverse the recorded path.
    pub fn derive(tree: &HuffmanTree) -> Self {
        debug!("Calculating codes for {} symbols", tree.size());

        let mut entries: Vec<CodeEntry> = tree.leaves()
            .map(|leaf| CodeEntry {
                symbol: tree.node(leaf).symbol,
                code: code_for(tree, leaf),
            })
            .collect();
        entries.sort_by_key(|entry| entry.symbol);

        let table = Self { entries };
        debug_assert!(table.is_prefix_free());
        table
    }

    /// Table from externally supplied entries; duplicates and non-binary
    /// digits are rejected.
    pub fn from_entries(mut entries: Vec<CodeEntry>) -> CodecResult<Self> {
        entries.sort_by_key(|entry| entry.symbol);

        for pair in entries.windows(2) {
            if pair[0].symbol == pair[1].symbol {
                return Err(CodecError::format(format!("duplicate code for {:x}", pair[0].symbol)));
            }
        }

        if let Some(entry) = entries.iter().find(|e| e.code.bytes().any(|b| b != b'0' && b != b'1')) {
            return Err(CodecError::format(format!("code for {:x} is not binary: {:?}", entry.symbol, entry.code)));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, symbol: u8) -> Option<&str> {
        self.entries
            .binary_search_by_key(&symbol, |entry| entry.symbol)
            .ok()
            .map(|idx| self.entries[idx].code.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CodeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let mut codes: Vec<&str> = self.entries.iter().map(|e| e.code.as_str()).collect();
        codes.sort_unstable();
        // lexicographic order puts a prefix directly before some extension of it
        codes.windows(2).all(|pair| !pair[1].starts_with(pair[0]))
    }
}

fn code_for(tree: &HuffmanTree, leaf: NodeId) -> String {
    let mut path = Vec::new();
    let mut current = leaf;

    while let Some(parent) = tree.node(current).parent {
        path.push(if tree.node(parent).left == Some(current) { '0' } else { '1' });
        current = parent;
    }

    path.iter().rev().collect()
}
