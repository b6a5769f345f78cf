//! Encoder behavior on large and degenerate trees
//!
//! A 200 000-node chain would overflow the stack of a recursive traversal;
//! the encoder must handle it iteratively.

use taxtree_server::tree::{encode, Edge, TreeQuery};

const CHAIN_LEN: i64 = 200_000;

#[test]
fn test_deep_chain() {
    let edges: Vec<Edge> = std::iter::once(Edge::new(1, 1))
        .chain((2..=CHAIN_LEN).map(|id| Edge::new(id, id - 1)))
        .collect();

    let tree = encode(&edges).unwrap();
    assert_eq!(tree.len(), CHAIN_LEN as usize);
    assert_eq!(tree.max_depth(), CHAIN_LEN as i32);
    assert_eq!(tree.leaf_count(), 1);

    let root = tree.root();
    assert_eq!(root.encoding.right_bound, CHAIN_LEN + 1);

    let deepest = tree.get(CHAIN_LEN).unwrap();
    assert_eq!(deepest.encoding.sequence_id, CHAIN_LEN);
    assert!(deepest.encoding.is_leaf);
    assert_eq!(deepest.encoding.right_bound, CHAIN_LEN + 1);

    let ancestors = tree.select(&TreeQuery::ancestors(deepest, false));
    assert_eq!(ancestors.len(), (CHAIN_LEN - 1) as usize);
}

#[test]
fn test_wide_star() {
    let edges: Vec<Edge> = std::iter::once(Edge::new(1, 1))
        .chain((2..=CHAIN_LEN).map(|id| Edge::new(id, 1)))
        .collect();

    let tree = encode(&edges).unwrap();
    assert_eq!(tree.max_depth(), 2);
    assert_eq!(tree.leaf_count(), (CHAIN_LEN - 1) as usize);

    for node in tree.iter().skip(1) {
        assert_eq!(node.encoding.right_bound, node.encoding.sequence_id + 1);
    }

    let middle = tree.get(CHAIN_LEN / 2).unwrap();
    assert_eq!(tree.select(&TreeQuery::siblings(middle)).len(), (CHAIN_LEN - 1) as usize);
}

#[test]
fn test_shuffled_input_order() {
    // children listed before their parents
    let mut edges: Vec<Edge> = (2..=1_000).rev().map(|id| Edge::new(id, id / 2)).collect();
    edges.push(Edge::new(1, 1));

    let tree = encode(&edges).unwrap();
    assert_eq!(tree.root().tax_id, 1);
    assert_eq!(tree.root().encoding.right_bound, 1_001);

    for node in tree.iter() {
        let e = node.encoding;
        assert_eq!(e.right_bound - e.sequence_id, tree.select(&TreeQuery::subtree(node, true)).len() as i64);
    }
}
