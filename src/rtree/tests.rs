use crate::geometry::Shape;
use crate::payload::Payload;
use crate::rtree::RTree;

fn ids(payloads: &[Payload]) -> Vec<u64> {
    let mut ids: Vec<u64> = payloads.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids
}

#[test]
fn empty_tree_queries_are_total() {
    let tree = RTree::new(4).unwrap();
    assert!(tree.search(&Shape::rect(0.0, 0.0, 10.0, 10.0)).is_empty());
    assert!(tree.search_by_id(1).is_none());
}

#[test]
fn delete_on_empty_tree_returns_false() {
    let mut tree = RTree::new(4).unwrap();
    assert!(!tree.delete_by_id(1));
}

#[test]
fn single_insert_then_delete_leaves_empty_root() {
    let mut tree = RTree::new(4).unwrap();
    tree.insert(Payload::new(1, "a"), Shape::rect(0.0, 0.0, 1.0, 1.0));
    assert!(tree.get_node(tree.root_index()).is_leaf());
    assert_eq!(tree.get_node(tree.root_index()).len(), 1);

    assert!(tree.delete_by_id(1));
    assert!(tree.get_node(tree.root_index()).is_leaf());
    assert!(tree.get_node(tree.root_index()).is_empty());
    assert!(tree.search_by_id(1).is_none());
}

#[test]
fn exactly_max_entries_does_not_split() {
    let mut tree = RTree::new(4).unwrap();
    for i in 0..4u64 {
        tree.insert(
            Payload::new(i, "x"),
            Shape::rect(i as f64, i as f64, i as f64 + 1.0, i as f64 + 1.0),
        );
    }
    assert!(tree.get_node(tree.root_index()).is_leaf());
    assert_eq!(tree.get_node(tree.root_index()).len(), 4);
}

/// Scenario 1: inserting `maxEntries + 1 = 5` payloads (with `maxEntries = 4`)
/// splits the root into an internal root with two leaves.
#[test]
fn overflow_splits_into_two_leaves() {
    let mut tree = RTree::new(4).unwrap();
    for i in 1..=6u64 {
        tree.insert(
            Payload::new(i, "x"),
            Shape::rect(i as f64, i as f64, i as f64 + 1.0, i as f64 + 1.0),
        );
    }

    let root = tree.get_node(tree.root_index());
    assert!(!root.is_leaf());
    assert_eq!(root.len(), 2);

    let hits = tree.search(&Shape::rect(0.0, 0.0, 3.0, 3.0));
    assert_eq!(ids(&hits), vec![1, 2, 3]);
}

/// Scenario 2: deleting from the tree built in scenario 1.
#[test]
fn delete_by_id_removes_payload_and_shrinks_results() {
    let mut tree = RTree::new(4).unwrap();
    for i in 1..=6u64 {
        tree.insert(
            Payload::new(i, "x"),
            Shape::rect(i as f64, i as f64, i as f64 + 1.0, i as f64 + 1.0),
        );
    }

    assert!(tree.delete_by_id(3));
    assert!(tree.search_by_id(3).is_none());

    let hits = tree.search(&Shape::rect(0.0, 0.0, 10.0, 10.0));
    assert_eq!(ids(&hits), vec![1, 2, 4, 5, 6]);
}

/// Scenario 3: a disk's search hit uses MBR overlap, not true geometry.
#[test]
fn disk_search_uses_mbr_overlap() {
    let mut tree = RTree::new(4).unwrap();
    tree.insert(Payload::new(42, "d"), Shape::disk(0.0, 0.0, 5.0));

    let hits = tree.search(&Shape::rect(4.0, 0.0, 6.0, 1.0));
    assert_eq!(ids(&hits), vec![42]);

    assert!(tree
        .search(&Shape::rect(10.0, 10.0, 11.0, 11.0))
        .is_empty());
}

/// Scenario 4: polygon MBR search and true shoelace area.
#[test]
fn polygon_search_and_area() {
    let mut tree = RTree::new(4).unwrap();
    let polygon = Shape::polygon(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 3.0)]).unwrap();
    assert_eq!(polygon.area(), 6.0);
    tree.insert(Payload::new(7, "tri"), polygon);

    let hits = tree.search(&Shape::rect(3.0, 2.0, 4.0, 3.0));
    assert_eq!(ids(&hits), vec![7]);
}

/// Scenario 5: bulk insert/delete over a larger tree; matches a linear scan.
#[test]
fn bulk_delete_matches_linear_scan() {
    let mut tree = RTree::new(8).unwrap();
    let mut rects = Vec::new();
    for i in 0..100u64 {
        let x = (i as f64) * 1.37;
        let y = (i as f64) * 0.91;
        let shape = Shape::rect(x, y, x + 1.0, y + 1.0);
        tree.insert(Payload::new(i, "x"), shape.clone());
        rects.push((i, shape));
    }

    for i in (0..100u64).step_by(2).skip(1) {
        assert!(tree.delete_by_id(i));
    }

    let world = Shape::rect(f64::MIN / 2.0, f64::MIN / 2.0, f64::MAX / 2.0, f64::MAX / 2.0);
    let expected: Vec<u64> = (0..100u64).step_by(2).collect();
    assert_eq!(ids(&tree.search(&world)), expected);

    let linear_scan: Vec<u64> = rects
        .iter()
        .filter(|(id, _)| id % 2 == 0)
        .map(|(id, _)| *id)
        .collect();
    assert_eq!(expected, linear_scan);
}

/// Scenario 6: update_by_id changes the stored shape in place.
#[test]
fn update_by_id_changes_searchable_shape() {
    let mut tree = RTree::new(4).unwrap();
    tree.insert(Payload::new(1, "a"), Shape::rect(0.0, 0.0, 1.0, 1.0));

    assert!(tree.update_by_id(1, Shape::disk(500.0, 500.0, 100.0)));

    assert!(tree.search(&Shape::rect(0.0, 0.0, 1.0, 1.0)).is_empty());
    let hits = tree.search(&Shape::rect(450.0, 450.0, 550.0, 550.0));
    assert_eq!(ids(&hits), vec![1]);

    let payload = tree.search_by_id(1).unwrap();
    assert_eq!(payload.name, "a");
}

#[test]
fn update_by_id_on_missing_id_is_a_noop() {
    let mut tree = RTree::new(4).unwrap();
    tree.insert(Payload::new(1, "a"), Shape::rect(0.0, 0.0, 1.0, 1.0));

    assert!(!tree.update_by_id(99, Shape::rect(0.0, 0.0, 1.0, 1.0)));
    assert_eq!(tree.search_by_id(1).unwrap().name, "a");
}

#[test]
fn touching_edge_mbrs_intersect_in_search() {
    let mut tree = RTree::new(4).unwrap();
    tree.insert(Payload::new(1, "a"), Shape::rect(0.0, 0.0, 1.0, 1.0));

    let hits = tree.search(&Shape::rect(1.0, 0.0, 2.0, 1.0));
    assert_eq!(ids(&hits), vec![1]);
}

#[test]
fn large_deletion_run_keeps_tree_consistent() {
    let mut tree = RTree::new(4).unwrap();
    for i in 0..60u64 {
        let x = i as f64;
        tree.insert(Payload::new(i, "x"), Shape::rect(x, x, x + 1.0, x + 1.0));
    }
    for i in 0..50u64 {
        assert!(tree.delete_by_id(i));
    }

    let world = Shape::rect(f64::MIN / 2.0, f64::MIN / 2.0, f64::MAX / 2.0, f64::MAX / 2.0);
    let expected: Vec<u64> = (50..60).collect();
    assert_eq!(ids(&tree.search(&world)), expected);
    assert_invariants(&tree);
}

/// Exercises invariants I1-I5 directly (the unit-test counterpart of the
/// proptest suite in `tests/test_proptest_rtree.rs`, for quick iteration).
fn assert_invariants(tree: &RTree) {
    fn visit(tree: &RTree, index: crate::rtree::Index, depth: usize, leaf_depth: &mut Option<usize>) {
        let node = tree.get_node(index);
        if node.is_leaf() {
            match leaf_depth {
                Some(d) => assert_eq!(*d, depth, "all leaves must be at the same depth (I3)"),
                None => *leaf_depth = Some(depth),
            }
            return;
        }
        for entry in node.entries() {
            if let Some(child) = entry.child_index() {
                let child_mbr = tree.get_node(child).coverage();
                if let Some(child_mbr) = child_mbr {
                    assert_eq!(entry.mbr(), child_mbr, "internal entry MBR must match child coverage (I1)");
                }
                visit(tree, child, depth + 1, leaf_depth);
            }
        }
    }

    let mut leaf_depth = None;
    visit(tree, tree.root_index(), 0, &mut leaf_depth);
}

#[test]
fn invariants_hold_after_mixed_operations() {
    let mut tree = RTree::new(4).unwrap();
    for i in 0..30u64 {
        let x = (i as f64) * 0.5;
        tree.insert(Payload::new(i, "x"), Shape::rect(x, x, x + 1.0, x + 1.0));
    }
    for i in (0..30u64).step_by(3) {
        tree.delete_by_id(i);
    }
    for i in 30..40u64 {
        let x = (i as f64) * 0.5;
        tree.insert(Payload::new(i, "x"), Shape::rect(x, x, x + 1.0, x + 1.0));
    }
    assert_invariants(&tree);
}

/// §4.3/§6: an empty tree's introspection view is a leaf at level 0 with a
/// null `mbr` and no elements.
#[test]
fn introspect_of_empty_tree_is_a_leaf_with_null_mbr() {
    let tree = RTree::new(4).unwrap();
    let view = tree.introspect();
    assert_eq!(view.kind, crate::rtree::introspect::NodeKind::Leaf);
    assert_eq!(view.level, 0);
    assert!(view.mbr.is_none());
    assert!(view.elements.is_empty());
}

/// §4.3/§6: leaf elements carry `data` and omit `child`; 1-based `index`.
#[test]
fn introspect_leaf_elements_carry_data_not_child() {
    let mut tree = RTree::new(4).unwrap();
    tree.insert(Payload::new(1, "a"), Shape::rect(0.0, 0.0, 1.0, 1.0));
    tree.insert(Payload::new(2, "b"), Shape::rect(2.0, 2.0, 3.0, 3.0));

    let view = tree.introspect();
    assert_eq!(view.kind, crate::rtree::introspect::NodeKind::Leaf);
    assert_eq!(view.elements.len(), 2);
    for (i, element) in view.elements.iter().enumerate() {
        assert_eq!(element.index, i + 1);
        assert!(element.data.is_some());
        assert!(element.child.is_none());
    }
}

/// §4.3/§6: once the root has split, the root's elements carry `child` and
/// omit `data`, and the children they point at are the leaves holding the
/// original payloads.
#[test]
fn introspect_internal_elements_carry_child_not_data() {
    let mut tree = RTree::new(4).unwrap();
    for i in 1..=6u64 {
        tree.insert(
            Payload::new(i, "x"),
            Shape::rect(i as f64, i as f64, i as f64 + 1.0, i as f64 + 1.0),
        );
    }

    let view = tree.introspect();
    assert_eq!(view.kind, crate::rtree::introspect::NodeKind::Internal);
    assert_eq!(view.level, 0);
    assert!(view.mbr.is_some());
    assert_eq!(view.elements.len(), 2);

    let mut leaf_ids = Vec::new();
    for (i, element) in view.elements.iter().enumerate() {
        assert_eq!(element.index, i + 1);
        assert!(element.data.is_none());
        let child = element.child.as_ref().unwrap();
        assert_eq!(child.kind, crate::rtree::introspect::NodeKind::Leaf);
        assert_eq!(child.level, 1);
        for leaf_element in &child.elements {
            assert!(leaf_element.data.is_some());
            assert!(leaf_element.child.is_none());
            leaf_ids.push(leaf_element.data.as_ref().unwrap().id);
        }
    }
    leaf_ids.sort_unstable();
    assert_eq!(leaf_ids, vec![1, 2, 3, 4, 5, 6]);
}

/// §6: the serialized JSON uses the schema's field names exactly, and
/// `data`/`child` remain mutually exclusive after round-tripping through
/// `serde_json`.
#[test]
fn introspect_json_matches_the_documented_schema() {
    let mut tree = RTree::new(4).unwrap();
    tree.insert(Payload::new(1, "a"), Shape::rect(0.0, 0.0, 1.0, 1.0));

    let dump = serde_json::to_value(tree.introspect()).unwrap();
    assert_eq!(dump["type"], "Leaf");
    assert_eq!(dump["level"], 0);

    let element = &dump["elements"][0];
    assert_eq!(element["index"], 1);
    assert_eq!(element["shapeType"], "rect");
    assert_eq!(element["mbr"]["minX"], 0.0);
    assert_eq!(element["mbr"]["minY"], 0.0);
    assert_eq!(element["mbr"]["maxX"], 1.0);
    assert_eq!(element["mbr"]["maxY"], 1.0);
    assert_eq!(element["data"]["id"], 1);
    assert_eq!(element["data"]["name"], "a");
    assert!(element.get("child").is_none());
}
