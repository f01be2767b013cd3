//! Random operation sequences against the Tree Store
//!
//! After every step the tree must keep its structural invariants, a failed
//! step must leave the store on the very same tree version, and the
//! snapshot codec and search filter must agree with the tree.

use canopy::tree::path;
use canopy::tree::{filter, Node, NodeKind, Tree, TreeStore};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Create {
        parent: usize,
        name: &'static str,
        folder: bool,
    },
    Rename {
        target: usize,
        name: &'static str,
    },
    Move {
        target: usize,
        destination: usize,
    },
    Delete {
        target: usize,
    },
    Update {
        target: usize,
        content: String,
    },
}

fn name_strategy() -> impl Strategy<Value = &'static str> {
    // A small pool so duplicates and collisions happen often.
    prop::sample::select(vec!["a", "b", "lib", "main.js", "Notes.md", "A.txt", ""])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), name_strategy(), any::<bool>())
            .prop_map(|(parent, name, folder)| Op::Create { parent, name, folder }),
        1 => (any::<usize>(), name_strategy())
            .prop_map(|(target, name)| Op::Rename { target, name }),
        2 => (any::<usize>(), any::<usize>())
            .prop_map(|(target, destination)| Op::Move { target, destination }),
        1 => any::<usize>().prop_map(|target| Op::Delete { target }),
        1 => (any::<usize>(), "[a-z ]{0,12}")
            .prop_map(|(target, content)| Op::Update { target, content }),
    ]
}

/// Pick an existing path, or `None` (the root level) for the extra slot.
fn pick(paths: &[String], index: usize) -> Option<&str> {
    let slot = index % (paths.len() + 1);
    paths.get(slot).map(String::as_str)
}

fn apply(store: &mut TreeStore, op: &Op) -> Result<Tree, canopy::error::TreeError> {
    let paths: Vec<String> = store
        .current()
        .walk()
        .map(|n| n.path().to_string())
        .collect();
    let missing = "no/such/node";
    match op {
        Op::Create {
            parent,
            name,
            folder,
        } => {
            let kind = if *folder {
                NodeKind::Folder
            } else {
                NodeKind::File
            };
            store.create(pick(&paths, *parent), name, kind)
        }
        Op::Rename { target, name } => {
            store.rename(pick(&paths, *target).unwrap_or(missing), name)
        }
        Op::Move {
            target,
            destination,
        } => store.move_node(
            pick(&paths, *target).unwrap_or(missing),
            pick(&paths, *destination),
        ),
        Op::Delete { target } => store.delete(pick(&paths, *target).unwrap_or(missing)),
        Op::Update { target, content } => {
            store.update(pick(&paths, *target).unwrap_or(missing), content)
        }
    }
}

fn check_level(nodes: &[Arc<Node>], parent: Option<&str>) {
    let mut names = HashSet::new();
    for node in nodes {
        assert!(names.insert(node.name()), "duplicate sibling {}", node.path());
        assert_eq!(node.path(), path::join(parent, node.name()));
        if !node.is_folder() {
            assert!(node.children().is_empty());
        }
        check_level(node.children(), Some(node.path()));
    }
}

fn check_invariants(tree: &Tree) {
    check_level(tree.roots(), None);

    let paths: Vec<&str> = tree.walk().map(|n| n.path()).collect();
    let unique: HashSet<&str> = paths.iter().copied().collect();
    assert_eq!(unique.len(), paths.len());

    let snapshot = tree.serialize().unwrap();
    let decoded = Tree::deserialize(snapshot.as_str()).unwrap();
    assert_eq!(&decoded, tree);

    let identity = filter(tree, "");
    assert_eq!(identity.roots().len(), tree.roots().len());
    assert!(identity
        .roots()
        .iter()
        .zip(tree.roots())
        .all(|(a, b)| Arc::ptr_eq(a, b)));
}

fn check_filter(tree: &Tree, query: &str) {
    let view = filter(tree, query);
    let needle = query.to_lowercase();
    let mut stack: Vec<&Arc<Node>> = view.roots().iter().collect();
    while let Some(node) = stack.pop() {
        let own = node.name().to_lowercase().contains(&needle);
        if node.is_folder() {
            assert!(own || !node.children().is_empty(), "{}", node.path());
        } else {
            assert!(own, "{}", node.path());
        }
        // Every kept node still exists in the tree at the same path.
        assert!(tree.contains(node.path()));
        stack.extend(node.children());
    }
    // Every matching node in the tree is in the view.
    for node in tree.walk() {
        if node.name().to_lowercase().contains(&needle) {
            assert!(view.matches(node.path()), "{}", node.path());
        }
    }
}

#[test]
fn test_random_operations_keep_tree_valid() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    });

    runner
        .run(&prop::collection::vec(op_strategy(), 1..40), |ops| {
            let mut store = TreeStore::new(Tree::empty());
            for op in &ops {
                let before = store.tree();
                match apply(&mut store, op) {
                    Ok(next) => {
                        assert!(Tree::ptr_eq(&next, store.current()));
                        check_invariants(&next);
                    }
                    Err(_) => {
                        assert!(Tree::ptr_eq(&before, store.current()), "{:?}", op);
                    }
                }
                // Older versions are never disturbed by later operations.
                check_invariants(&before);
            }
            for query in ["a", "LIB", ".js", "zz"] {
                check_filter(store.current(), query);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_serialize_is_deterministic() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(op_strategy(), 0..20), |ops| {
            let mut store = TreeStore::new(Tree::empty());
            for op in &ops {
                let _ = apply(&mut store, op);
            }
            let first = store.serialize().unwrap();
            let again = Tree::deserialize(first.as_str())
                .unwrap()
                .serialize()
                .unwrap();
            prop_assert_eq!(first.digest(), again.digest());
            Ok(())
        })
        .unwrap();
}
