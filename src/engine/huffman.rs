use std::collections::BinaryHeap;
use std::cmp::Ordering;
use tracing::{debug, trace};

use crate::engine::code_table::CodeTable;
use crate::engine::error::{CodecError, CodecResult};
use crate::engine::frequency::FrequencyTable;
use crate::engine::node::{Node, NodeId};

/// Active-set entry while merging. Ordered on (frequency, symbol).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    frequency: u64,
    symbol: u8,
    id: NodeId,
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other.frequency.cmp(&self.frequency)
            .then_with(|| other.symbol.cmp(&self.symbol))
    }
}

/// Huffman tree stored as an arena. `size` is the number of distinct
/// symbols, i.e. the leaf count.
#[derive(Debug, Clone, Default)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    size: usize,
}

impl HuffmanTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Greedy merge of the two lowest (frequency, symbol) nodes until one
    /// remains. The child with the smaller symbol goes left and lends its
    /// symbol to the new node, which keeps later tie-breaks deterministic.
    pub fn build(frequencies: &FrequencyTable) -> Self {
        let k = frequencies.distinct();
        debug!("Building tree from {} distinct symbols", k);

        let mut tree = Self {
            nodes: Vec::with_capacity((2 * k).saturating_sub(1)),
            root: None,
            size: k,
        };
        let mut heap = BinaryHeap::with_capacity(k);

        for (symbol, frequency) in frequencies.iter() {
            let id = tree.push(Node::leaf(symbol, frequency));
            heap.push(HeapEntry { frequency, symbol, id });
        }

        while heap.len() > 1 {
            let (Some(a), Some(b)) = (heap.pop(), heap.pop()) else {
                break;
            };
            let id = tree.merge(a.id, b.id);
            let node = &tree.nodes[id];
            trace!("Merged {:#04x} and {:#04x} into weight {}", a.symbol, b.symbol, node.frequency);
            heap.push(HeapEntry {
                frequency: node.frequency,
                symbol: node.symbol,
                id,
            });
        }

        tree.root = heap.pop().map(|entry| entry.id);
        debug!("Tree built with {} nodes", tree.nodes.len());
        tree
    }

    /// Rebuild a tree from a parsed code table, creating internal nodes
    /// along each code path. Fails if one code is a prefix of another.
    pub fn from_code_table(table: &CodeTable) -> CodecResult<Self> {
        debug!("Building tree from header with {} codes", table.len());

        let mut tree = Self::new();
        if table.is_empty() {
            return Ok(tree);
        }

        let root = tree.push(Node::leaf(0, 0));
        tree.root = Some(root);
        // nodes that already carry a decoded symbol
        let mut assigned = vec![false];

        for entry in table.iter() {
            let mut current = root;

            for bit in entry.code.bytes() {
                if assigned[current] {
                    return Err(CodecError::format(format!(
                        "code for {:x} extends the code of {:x}",
                        entry.symbol, tree.nodes[current].symbol
                    )));
                }

                current = match tree.nodes[current].child(bit) {
                    Some(child) => child,
                    None => {
                        let mut child = Node::leaf(0, 0);
                        child.parent = Some(current);
                        let child_id = tree.push(child);
                        assigned.push(false);

                        match bit {
                            b'0' => tree.nodes[current].left = Some(child_id),
                            b'1' => tree.nodes[current].right = Some(child_id),
                            other => {
                                return Err(CodecError::format(format!(
                                    "invalid code digit {:?} for {:x}",
                                    other as char, entry.symbol
                                )));
                            }
                        }
                        child_id
                    }
                };
            }

            if assigned[current] || !tree.nodes[current].is_leaf() {
                return Err(CodecError::format(format!(
                    "code {:?} for {:x} is a prefix of another code",
                    entry.code, entry.symbol
                )));
            }

            tree.nodes[current].symbol = entry.symbol;
            assigned[current] = true;
        }

        tree.size = table.len();
        debug!("Tree rebuilt with {} nodes", tree.nodes.len());
        Ok(tree)
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn merge(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let (left, right) = if self.nodes[a].symbol < self.nodes[b].symbol {
            (a, b)
        } else {
            (b, a)
        };

        let id = self.push(Node {
            symbol: self.nodes[left].symbol,
            frequency: self.nodes[left].frequency + self.nodes[right].frequency,
            parent: None,
            left: Some(left),
            right: Some(right),
        });
        self.nodes[left].parent = Some(id);
        self.nodes[right].parent = Some(id);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Leaf ids in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter()
            .enumerate()
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn internal_count(&self) -> usize {
        self.nodes.len() - self.leaf_count()
    }

    pub fn root_frequency(&self) -> u64 {
        self.root.map(|id| self.nodes[id].frequency).unwrap_or(0)
    }
}
