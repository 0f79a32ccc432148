/// Index of a node inside its tree's arena.
pub type NodeId = usize;

/// Tree element. Children are owned through the arena; `parent` is a plain
/// back-reference used when deriving codes leaf to root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub symbol: u8,
    pub frequency: u64,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl Node {
    pub fn leaf(symbol: u8, frequency: u64) -> Self {
        Self {
            symbol,
            frequency,
            parent: None,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn child(&self, bit: u8) -> Option<NodeId> {
        match bit {
            b'0' => self.left,
            b'1' => self.right,
            _ => None,
        }
    }
}
