use log::debug;

use crate::error::WordgridErrorKind;
use crate::WordgridResult;

/// Word-boundary symbol. Sorts before `A`, so a node that accepts a
/// boundary always carries it as its first letter.
pub const END: u8 = b'#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterId(pub u32);

pub const ROOT_NODE: NodeId = NodeId(0);

/// Pseudo-letter every border cell points at: symbol `END`, child = root,
/// aggregates = aggregates of the root node. Walking "past" the border
/// therefore starts a fresh word at the root on both axes.
pub const ROOT_LETTER: LetterId = LetterId(0);

/// One labelled trie edge.
///
/// `leaves` counts the remaining uses of the words passing through this
/// edge: every `END` edge is seeded with the board's word-slot bound, so a
/// word may fill several slots, and the count reaches 0 exactly when no
/// use is left. The search decrements it on commit and restores it on
/// backtrack. `len_min`/`len_max` bound the lengths of the words still
/// reachable (both 0 for an `END` edge).
#[derive(Debug, Clone)]
pub struct Letter {
    pub symbol: u8,
    pub next: NodeId,
    pub leaves: u32,
    pub len_min: u32,
    pub len_max: u32,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    first: u32,
    count: u32,
}

/// Immutable-shape dictionary trie over `A`..=`Z` plus `END`.
///
/// Nodes and letters live in flat arenas; `END` edges reference the root
/// by id instead of owning it, which models the one logically cyclic edge
/// of the structure without ownership cycles.
#[derive(Debug)]
pub struct Trie {
    nodes: Vec<Node>,
    letters: Vec<Letter>,
}

impl Trie {
    pub fn root(&self) -> NodeId {
        ROOT_NODE
    }

    pub fn letters(&self, node: NodeId) -> &[Letter] {
        let node = self.nodes[node.0 as usize];
        &self.letters[node.first as usize..(node.first + node.count) as usize]
    }

    /// Id of the `i`-th letter of `node` (symbol order).
    pub fn letter_id(&self, node: NodeId, i: usize) -> LetterId {
        LetterId(self.nodes[node.0 as usize].first + i as u32)
    }

    /// First letter of `node`, if any. This is the `END` letter whenever
    /// the node accepts a word boundary.
    pub fn first(&self, node: NodeId) -> Option<LetterId> {
        let node = self.nodes[node.0 as usize];
        if node.count > 0 {
            Some(LetterId(node.first))
        } else {
            None
        }
    }

    pub fn letter(&self, id: LetterId) -> &Letter {
        &self.letters[id.0 as usize]
    }

    pub fn letter_mut(&mut self, id: LetterId) -> &mut Letter {
        &mut self.letters[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct BuildLetter {
    symbol: u8,
    // 0 is the root: only END letters point there.
    next: usize,
}

#[derive(Debug, Default)]
struct BuildNode {
    letters: Vec<BuildLetter>,
}

/// Builds a [`Trie`] from a word list.
///
/// Topology is fixed by [`TrieBuilder::build`], which also runs the
/// bottom-up aggregate pass and sorts every node's letters by symbol.
pub struct TrieBuilder {
    nodes: Vec<BuildNode>,
    len_max: usize,
}

impl TrieBuilder {
    /// `len_max` is the longest run the board can hold, i.e. its column
    /// count; no word beyond it can ever be placed.
    pub fn new(len_max: usize) -> TrieBuilder {
        TrieBuilder {
            nodes: vec![BuildNode::default()],
            len_max,
        }
    }

    /// Inserts one word. Duplicates are absorbed: re-walking an existing
    /// path creates no edges, and leaf counts are derived from `END` edges
    /// rather than from insertions. A symbol outside `A`..=`Z` or a word
    /// longer than the board is an error.
    pub fn insert(&mut self, word: &[u8]) -> WordgridResult<()> {
        if word.len() > self.len_max {
            return Err(WordgridErrorKind::Content.with_error(anyhow::anyhow!(
                "word {:?} is longer than the board ({} letters)",
                String::from_utf8_lossy(word),
                self.len_max
            )));
        }
        let mut node = 0usize;
        for &symbol in word {
            if !symbol.is_ascii_uppercase() {
                return Err(WordgridErrorKind::Content.with_error(anyhow::anyhow!(
                    "symbol '{}' is outside the accepted alphabet",
                    symbol as char
                )));
            }
            node = match self.find(node, symbol) {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(BuildNode::default());
                    self.nodes[node].letters.push(BuildLetter { symbol, next });
                    next
                }
            };
        }
        if self.find(node, END).is_none() {
            self.nodes[node].letters.push(BuildLetter {
                symbol: END,
                next: 0,
            });
        }
        Ok(())
    }

    fn find(&self, node: usize, symbol: u8) -> Option<usize> {
        self.nodes[node]
            .letters
            .iter()
            .find(|l| l.symbol == symbol)
            .map(|l| l.next)
    }

    /// Freezes the trie. Every `END` edge is seeded with `leaf_seed` uses.
    ///
    /// When `allow_breaks` is set, an `END` edge is also installed at the
    /// root; it stands for "a word may start after a black square here"
    /// and shares the same seed, which bounds the decrements one search
    /// path can hold against it.
    pub fn build(mut self, leaf_seed: u32, allow_breaks: bool) -> Trie {
        if allow_breaks && self.find(0, END).is_none() {
            self.nodes[0].letters.push(BuildLetter {
                symbol: END,
                next: 0,
            });
        }
        for node in &mut self.nodes {
            node.letters.sort_unstable_by_key(|l| l.symbol);
        }

        // Flatten in node-index order; slot 0 is the root pseudo-letter.
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut letters =
            Vec::with_capacity(1 + self.nodes.iter().map(|n| n.letters.len()).sum::<usize>());
        letters.push(Letter {
            symbol: END,
            next: ROOT_NODE,
            leaves: 0,
            len_min: 0,
            len_max: 0,
        });
        for node in &self.nodes {
            nodes.push(Node {
                first: letters.len() as u32,
                count: node.letters.len() as u32,
            });
            for l in &node.letters {
                letters.push(Letter {
                    symbol: l.symbol,
                    next: NodeId(l.next as u32),
                    leaves: 0,
                    len_min: 0,
                    len_max: 0,
                });
            }
        }

        let mut trie = Trie { nodes, letters };
        let (leaves, len_min, len_max) = measure_node(&mut trie, ROOT_NODE, leaf_seed);
        trie.letters[0].leaves = leaves;
        trie.letters[0].len_min = len_min;
        trie.letters[0].len_max = len_max;
        debug!(
            "trie built: {} nodes, {} letters, {} leaf uses at the root",
            trie.nodes.len(),
            trie.letters.len(),
            leaves
        );
        trie
    }
}

// Fills in the aggregates of every letter of `node`, bottom-up, and
// returns the node's (leaves, len_min, len_max) fold.
fn measure_node(trie: &mut Trie, node: NodeId, leaf_seed: u32) -> (u32, u32, u32) {
    let mut leaves = 0u32;
    let mut len_min = 0u32;
    let mut len_max = 0u32;
    let count = trie.nodes[node.0 as usize].count as usize;
    for i in 0..count {
        let id = trie.letter_id(node, i);
        let (symbol, next) = {
            let l = trie.letter(id);
            (l.symbol, l.next)
        };
        let stats = if symbol == END {
            (leaf_seed, 0, 0)
        } else {
            let (l, mn, mx) = measure_node(trie, next, leaf_seed);
            (l, mn + 1, mx + 1)
        };
        let l = trie.letter_mut(id);
        l.leaves = stats.0;
        l.len_min = stats.1;
        l.len_max = stats.2;
        leaves += stats.0;
        if i == 0 || stats.1 < len_min {
            len_min = stats.1;
        }
        if stats.2 > len_max {
            len_max = stats.2;
        }
    }
    (leaves, len_min, len_max)
}

#[cfg(test)]
mod tests {
    use super::{NodeId, TrieBuilder, END, ROOT_LETTER, ROOT_NODE};

    fn words(ws: &[&str]) -> TrieBuilder {
        let mut builder = TrieBuilder::new(8);
        for w in ws {
            builder.insert(w.as_bytes()).unwrap();
        }
        builder
    }

    #[test]
    fn test_aggregates() {
        let trie = words(&["CAT", "CAR", "DOG"]).build(1, false);
        let root = trie.letters(ROOT_NODE);
        assert_eq!(root.len(), 2);
        assert_eq!(root[0].symbol, b'C');
        assert_eq!(root[0].leaves, 2);
        assert_eq!((root[0].len_min, root[0].len_max), (3, 3));
        assert_eq!(root[1].symbol, b'D');
        assert_eq!(root[1].leaves, 1);
        assert_eq!(trie.letter(ROOT_LETTER).leaves, 3);
        assert_eq!(trie.letter(ROOT_LETTER).len_max, 3);
    }

    #[test]
    fn test_leaf_seed_scales_counts() {
        let trie = words(&["CAT", "CAR", "DOG"]).build(9, false);
        let root = trie.letters(ROOT_NODE);
        assert_eq!(root[0].leaves, 18);
        assert_eq!(root[1].leaves, 9);
        assert_eq!(trie.letter(ROOT_LETTER).leaves, 27);
    }

    #[test]
    fn test_leaf_sum_invariant() {
        let trie = words(&["AA", "AB", "ABC", "B"]).build(10, true);
        for n in 0..trie.node_count() {
            for l in trie.letters(NodeId(n as u32)) {
                if l.symbol == END {
                    continue;
                }
                let children: u32 = trie.letters(l.next).iter().map(|c| c.leaves).sum();
                assert_eq!(l.leaves, children);
            }
        }
    }

    #[test]
    fn test_end_sorts_first() {
        let trie = words(&["A", "AB"]).build(7, true);
        let root = trie.letters(ROOT_NODE);
        assert_eq!(root[0].symbol, END);
        assert_eq!(root[0].leaves, 7);
        // node after 'A' accepts both a boundary and 'B'
        let a = &root[1];
        let after_a = trie.letters(a.next);
        assert_eq!(after_a[0].symbol, END);
        assert_eq!(after_a[0].leaves, 7);
        assert_eq!((a.len_min, a.len_max), (1, 2));
        assert_eq!(a.leaves, 14);
    }

    #[test]
    fn test_no_break_edge_without_blacks() {
        let trie = words(&["AB"]).build(5, false);
        assert_ne!(trie.letters(ROOT_NODE)[0].symbol, END);
    }

    #[test]
    fn test_duplicates_absorbed() {
        let once = words(&["IT", "TO"]).build(1, false);
        let twice = words(&["IT", "TO", "IT"]).build(1, false);
        assert_eq!(once.letter(ROOT_LETTER).leaves, 2);
        assert_eq!(twice.letter(ROOT_LETTER).leaves, 2);
        assert_eq!(once.node_count(), twice.node_count());
    }

    #[test]
    fn test_rejects_bad_symbol() {
        let mut builder = TrieBuilder::new(8);
        assert!(builder.insert(b"CA-T").is_err());
        assert!(builder.insert(b"cat").is_err());
    }

    #[test]
    fn test_rejects_word_longer_than_board() {
        let mut builder = TrieBuilder::new(3);
        assert!(builder.insert(b"CAT").is_ok());
        let err = builder.insert(b"GOAT").unwrap_err();
        assert_eq!(err.kind(), crate::error::WordgridErrorKind::Content);
    }
}
