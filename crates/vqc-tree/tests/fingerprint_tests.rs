use proptest::prelude::*;
use vqc_test_utils::arb_plain_node;
use vqc_tree::{ContentHash, Node};

proptest! {
    #[test]
    fn prop_reversed_collections_are_equal(items in prop::collection::vec(arb_plain_node(), 0..8)) {
        let forward = Node::set(items.clone());
        let backward = Node::set(items.iter().rev().cloned());
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.fingerprint(), backward.fingerprint());

        // Keys are distinct here, so no pair is overwritten in either order.
        let pairs: Vec<(Node, Node)> = items
            .iter()
            .enumerate()
            .map(|(i, item)| (Node::int(i as i64), item.clone()))
            .collect();
        let forward = Node::map(pairs.clone());
        let backward = Node::map(pairs.into_iter().rev());
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.fingerprint(), backward.fingerprint());
    }

    #[test]
    fn prop_distinct_trees_have_distinct_fingerprints(a in arb_plain_node(), b in arb_plain_node()) {
        prop_assert_eq!(a == b, a.fingerprint() == b.fingerprint());
    }

    #[test]
    fn prop_json_preserves_structure(tree in arb_plain_node()) {
        let json = serde_json::to_string(&tree).unwrap();
        let decoded: Node = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded.fingerprint(), tree.fingerprint());
        prop_assert_eq!(decoded, tree);
    }
}

#[test]
fn test_fingerprint_hex_round_trip() {
    let hash = Node::seq([Node::str("x"), Node::nil()]).fingerprint();
    let parsed: ContentHash = hash.to_string().parse().unwrap();
    assert_eq!(parsed, hash);
    assert_eq!(hash.to_string().len(), 64);
}
