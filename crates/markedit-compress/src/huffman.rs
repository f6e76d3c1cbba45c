//! Huffman code tree over byte symbols.
//!
//! Nodes live in an arena. Construction is deterministic: ties in weight are
//! broken by arena index, leaves being created in symbol order, so the same
//! input always yields the same tree.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::bits::{BitReader, BitWriter};
use crate::CompressError;

/// 256 leaves and 255 internal nodes.
pub const MAX_NODES: usize = 511;

const UNSET: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HNode {
    Leaf(u8),
    Internal { left: usize, right: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTree {
    nodes: Vec<HNode>,
}

impl CodeTree {
    /// Build the tree for `freqs[symbol]`. Returns `None` when every
    /// frequency is zero.
    pub fn from_frequencies(freqs: &[u64; 256]) -> Option<Self> {
        let mut nodes = Vec::new();
        let mut heap = BinaryHeap::new();

        for (symbol, &weight) in (0..=u8::MAX).zip(freqs.iter()) {
            if weight > 0 {
                heap.push(Reverse((weight, nodes.len())));
                nodes.push(HNode::Leaf(symbol));
            }
        }

        while heap.len() > 1 {
            let (Some(Reverse((w1, left))), Some(Reverse((w2, right)))) = (heap.pop(), heap.pop())
            else {
                break;
            };
            heap.push(Reverse((w1 + w2, nodes.len())));
            nodes.push(HNode::Internal { left, right });
        }

        let Reverse((_, root)) = heap.pop()?;
        // Keep the root at index 0 so readers and builders agree.
        Some(Self::reindexed(&nodes, root))
    }

    /// Copy the subtree at `root` into a fresh arena in pre-order.
    fn reindexed(nodes: &[HNode], root: usize) -> Self {
        let mut out: Vec<HNode> = Vec::with_capacity(nodes.len());
        // (source index, slot in `out` whose child points here)
        let mut stack = vec![(root, None::<(usize, bool)>)];
        while let Some((src, link)) = stack.pop() {
            let id = out.len();
            out.push(nodes[src]);
            if let Some((parent, is_left)) = link {
                if let HNode::Internal { left, right } = &mut out[parent] {
                    if is_left {
                        *left = id;
                    } else {
                        *right = id;
                    }
                }
            }
            if let HNode::Internal { left, right } = nodes[src] {
                stack.push((right, Some((id, false))));
                stack.push((left, Some((id, true))));
            }
        }
        Self { nodes: out }
    }

    fn root(&self) -> HNode {
        self.nodes[0]
    }

    /// Code for every symbol present in the tree. A tree with a single leaf
    /// gives that symbol the one-bit code `0`.
    pub fn codes(&self) -> Vec<Option<Vec<bool>>> {
        let mut codes = vec![None; 256];
        if let HNode::Leaf(symbol) = self.root() {
            codes[usize::from(symbol)] = Some(vec![false]);
            return codes;
        }

        let mut stack = vec![(0, Vec::new())];
        while let Some((id, path)) = stack.pop() {
            match self.nodes[id] {
                HNode::Leaf(symbol) => codes[usize::from(symbol)] = Some(path),
                HNode::Internal { left, right } => {
                    let mut right_path = path.clone();
                    right_path.push(true);
                    let mut left_path = path;
                    left_path.push(false);
                    stack.push((right, right_path));
                    stack.push((left, left_path));
                }
            }
        }
        codes
    }

    /// Pre-order: bit `1` and the symbol byte for a leaf, bit `0` for an
    /// internal node. The arena is already in pre-order.
    pub fn write(&self, w: &mut BitWriter) {
        for node in &self.nodes {
            match *node {
                HNode::Leaf(symbol) => {
                    w.write_bit(true);
                    w.write_byte(symbol);
                }
                HNode::Internal { .. } => w.write_bit(false),
            }
        }
    }

    pub fn read(r: &mut BitReader<'_>) -> Result<Self, CompressError> {
        let mut nodes = Vec::new();
        // Internal nodes still missing a child.
        let mut open: Vec<usize> = Vec::new();

        loop {
            if nodes.len() >= MAX_NODES {
                return Err(CompressError::TreeTooLarge);
            }
            let id = nodes.len();
            let node = if r.read_bit()? {
                HNode::Leaf(r.read_byte()?)
            } else {
                HNode::Internal {
                    left: UNSET,
                    right: UNSET,
                }
            };
            nodes.push(node);

            if let Some(&parent) = open.last() {
                if let HNode::Internal { left, right } = &mut nodes[parent] {
                    if *left == UNSET {
                        *left = id;
                    } else {
                        *right = id;
                        open.pop();
                    }
                }
            }
            if matches!(node, HNode::Internal { .. }) {
                open.push(id);
            }
            if open.is_empty() {
                return Ok(Self { nodes });
            }
        }
    }

    /// Read one symbol's code from `r`.
    pub fn decode_symbol(&self, r: &mut BitReader<'_>) -> Result<u8, CompressError> {
        let mut node = self.root();
        if let HNode::Leaf(symbol) = node {
            r.read_bit()?;
            return Ok(symbol);
        }
        loop {
            match node {
                HNode::Leaf(symbol) => return Ok(symbol),
                HNode::Internal { left, right } => {
                    node = self.nodes[if r.read_bit()? { right } else { left }];
                }
            }
        }
    }
}
