//! Two-pass nested-set encoder
//!
//! Pass 1 walks the tree depth-first from the root and hands out preorder
//! sequence ids, depths and leaf flags. Pass 2 visits nodes in sequence order
//! and derives each node's exclusive right bound from its next sibling, or
//! from its parent when it is the last child.
//!
//! The edge set is validated as a whole before anything is assigned. A single
//! dangling parent or cycle rejects the batch; nothing is silently dropped.

use std::collections::HashMap;
use thiserror::Error;

use super::{EncodedNode, TaxId, TreeEncoding};

/// One `(id, parent_id)` pair from the dump. The root is its own parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub id: TaxId,
    pub parent_id: TaxId,
}

impl Edge {
    pub fn new(id: TaxId, parent_id: TaxId) -> Self {
        Self { id, parent_id }
    }

    pub fn is_root(&self) -> bool {
        self.id == self.parent_id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("No root found: exactly one node must be its own parent")]
    MissingRoot,

    #[error("Multiple roots found: {first} and {second} are both their own parent")]
    MultipleRoots { first: TaxId, second: TaxId },

    #[error("Node {id} appears more than once in the edge set")]
    DuplicateNode { id: TaxId },

    #[error("Node {id} references parent {parent_id}, which is not in the edge set")]
    DanglingParent { id: TaxId, parent_id: TaxId },

    #[error("Cycle detected: node {id} is its own ancestor")]
    Cycle { id: TaxId },
}

/// Encoding of a full edge set, stored in preorder
#[derive(Debug, Clone)]
pub struct EncodedTree {
    nodes: Vec<EncodedNode>,
    by_tax_id: HashMap<TaxId, usize>,
}

impl EncodedTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a successfully encoded tree, which holds at least the root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &EncodedNode {
        &self.nodes[0]
    }

    pub fn get(&self, tax_id: TaxId) -> Option<&EncodedNode> {
        self.by_tax_id.get(&tax_id).map(|&i| &self.nodes[i])
    }

    pub fn by_sequence_id(&self, sequence_id: i64) -> Option<&EncodedNode> {
        usize::try_from(sequence_id - 1)
            .ok()
            .and_then(|i| self.nodes.get(i))
    }

    /// Nodes in preorder (increasing `sequence_id`)
    pub fn iter(&self) -> impl Iterator<Item = &EncodedNode> {
        self.nodes.iter()
    }

    pub fn max_depth(&self) -> i32 {
        self.nodes.iter().map(|n| n.encoding.depth).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.encoding.is_leaf).count()
    }

    pub fn into_nodes(self) -> Vec<EncodedNode> {
        self.nodes
    }
}

/// Encode an edge set into preorder sequence ids and right bounds.
///
/// Children are visited in the order they first appear in `edges`.
#[tracing::instrument(skip(edges), fields(edges = edges.len()))]
pub fn encode(edges: &[Edge]) -> Result<EncodedTree, EncodeError> {
    let index = EdgeIndex::build(edges)?;
    index.check_acyclic()?;

    let preorder = PreorderTraversal::new(&index).run();
    let right_bounds = propagate_right_bounds(&index, &preorder);

    let nodes: Vec<EncodedNode> = preorder
        .order
        .iter()
        .map(|&node| {
            let edge = index.edges[node];
            EncodedNode {
                tax_id: edge.id,
                parent_tax_id: edge.parent_id,
                encoding: TreeEncoding {
                    sequence_id: preorder.sequence[node],
                    parent_sequence_id: (node != index.root)
                        .then(|| preorder.sequence[index.parent[node]]),
                    depth: preorder.depth[node],
                    right_bound: right_bounds[node],
                    is_leaf: index.children[node].is_empty(),
                },
            }
        })
        .collect();

    let by_tax_id = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.tax_id, i))
        .collect();

    let tree = EncodedTree { nodes, by_tax_id };

    tracing::debug!(
        nodes = tree.len(),
        leaves = tree.leaf_count(),
        max_depth = tree.max_depth(),
        "Encoded taxonomy tree"
    );

    Ok(tree)
}

/// Positional view of the edge set. Nodes are addressed by their index in
/// the input slice; children lists keep first-seen order.
struct EdgeIndex<'a> {
    edges: &'a [Edge],
    root: usize,
    parent: Vec<usize>,
    children: Vec<Vec<usize>>,
}

impl<'a> EdgeIndex<'a> {
    fn build(edges: &'a [Edge]) -> Result<Self, EncodeError> {
        let mut position: HashMap<TaxId, usize> = HashMap::with_capacity(edges.len());
        let mut root: Option<usize> = None;

        for (i, edge) in edges.iter().enumerate() {
            if position.insert(edge.id, i).is_some() {
                return Err(EncodeError::DuplicateNode { id: edge.id });
            }
            if edge.is_root() {
                if let Some(first) = root {
                    return Err(EncodeError::MultipleRoots {
                        first: edges[first].id,
                        second: edge.id,
                    });
                }
                root = Some(i);
            }
        }

        let root = root.ok_or(EncodeError::MissingRoot)?;

        let mut parent = Vec::with_capacity(edges.len());
        let mut children = vec![Vec::new(); edges.len()];

        for (i, edge) in edges.iter().enumerate() {
            let p = *position
                .get(&edge.parent_id)
                .ok_or(EncodeError::DanglingParent {
                    id: edge.id,
                    parent_id: edge.parent_id,
                })?;
            parent.push(p);
            // the root self-edge is not a child relation
            if i != root {
                children[p].push(i);
            }
        }

        Ok(Self {
            edges,
            root,
            parent,
            children,
        })
    }

    /// Walk parent pointers from every node. A walk that runs back into its
    /// own path before reaching the root (or an already cleared node) is a cycle.
    fn check_acyclic(&self) -> Result<(), EncodeError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.edges.len()];
        marks[self.root] = Mark::Done;
        let mut path = Vec::new();

        for start in 0..self.edges.len() {
            let mut node = start;
            while marks[node] == Mark::Unvisited {
                marks[node] = Mark::InProgress;
                path.push(node);
                node = self.parent[node];
            }

            if marks[node] == Mark::InProgress {
                return Err(EncodeError::Cycle {
                    id: self.edges[node].id,
                });
            }

            for visited in path.drain(..) {
                marks[visited] = Mark::Done;
            }
        }

        Ok(())
    }
}

/// Output of pass 1, indexed like the input edges
struct Preorder {
    sequence: Vec<i64>,
    depth: Vec<i32>,
    /// Node indices in visit order
    order: Vec<usize>,
}

/// Explicit-stack depth-first walk. The sequence counter lives here rather
/// than in any shared state, so each encode call starts from 1.
struct PreorderTraversal<'i, 'a> {
    index: &'i EdgeIndex<'a>,
    next_sequence: i64,
    stack: Vec<usize>,
    out: Preorder,
}

impl<'i, 'a> PreorderTraversal<'i, 'a> {
    fn new(index: &'i EdgeIndex<'a>) -> Self {
        let n = index.edges.len();
        Self {
            index,
            next_sequence: 1,
            stack: Vec::new(),
            out: Preorder {
                sequence: vec![0; n],
                depth: vec![0; n],
                order: Vec::with_capacity(n),
            },
        }
    }

    fn run(mut self) -> Preorder {
        self.stack.push(self.index.root);

        while let Some(node) = self.stack.pop() {
            self.visit(node);
            // reversed so the first child is popped first
            self.stack
                .extend(self.index.children[node].iter().rev().copied());
        }

        self.out
    }

    fn visit(&mut self, node: usize) {
        self.out.sequence[node] = self.next_sequence;
        self.next_sequence += 1;

        self.out.depth[node] = if node == self.index.root {
            1
        } else {
            self.out.depth[self.index.parent[node]] + 1
        };

        self.out.order.push(node);
    }
}

/// Pass 2. Parents precede children in preorder, so a last child can always
/// read its parent's bound.
fn propagate_right_bounds(index: &EdgeIndex<'_>, preorder: &Preorder) -> Vec<i64> {
    let n = index.edges.len();

    let mut next_sibling: Vec<Option<usize>> = vec![None; n];
    for siblings in &index.children {
        for pair in siblings.windows(2) {
            next_sibling[pair[0]] = Some(pair[1]);
        }
    }

    let mut right_bound = vec![0_i64; n];
    for &node in &preorder.order {
        right_bound[node] = if node == index.root {
            n as i64 + 1
        } else {
            match next_sibling[node] {
                Some(sibling) => preorder.sequence[sibling],
                None => right_bound[index.parent[node]],
            }
        };
    }

    right_bound
}
