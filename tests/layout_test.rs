//! Tests for LayoutEngine coordinate assignment

use std::sync::Arc;

use kpitree::application::services::GenerationService;
use kpitree::application::TreeBuilder;
use kpitree::domain::{Coordinates, DomainError, Forest, LayoutEngine};
use kpitree::infrastructure::store::StoreState;
use kpitree::infrastructure::traits::TreeStore;
use kpitree::infrastructure::MemoryStore;

fn build(store: &MemoryStore, lines: &[&str]) -> Forest {
    let input: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
    let mut tx = store.begin().unwrap();
    TreeBuilder::new().build(&mut *tx, &input).unwrap().forest
}

fn coords(forest: &Forest, label: &str) -> Option<(u32, u32)> {
    forest
        .node_by_label(label)
        .and_then(|n| n.coordinates)
        .map(|c| (c.x, c.y))
}

#[test]
fn given_profit_forest_when_laying_out_then_assigns_depth_and_preorder() {
    // Arrange
    let store = MemoryStore::new();
    let mut forest = build(
        &store,
        &["profit = revenue - cost", "revenue = quantity * price"],
    );
    let roots = forest.roots().to_vec();

    // Act
    let outcome = LayoutEngine::new().layout(&roots, &mut forest).unwrap();

    // Assert
    assert_eq!(coords(&forest, "profit"), Some((0, 0)));
    assert_eq!(coords(&forest, "revenue"), Some((1, 1)));
    assert_eq!(coords(&forest, "quantity"), Some((2, 2)));
    assert_eq!(coords(&forest, "price"), Some((2, 3)));
    assert_eq!(coords(&forest, "cost"), Some((1, 4)));
    assert_eq!(outcome.assigned.len(), 5);
    assert_eq!(outcome.next_sequence, 5);
}

#[test]
fn given_laid_out_forest_when_laying_out_again_then_nothing_moves() {
    // Arrange
    let store = MemoryStore::new();
    let mut forest = build(&store, &["a = b + c", "c = d / e"]);
    let roots = forest.roots().to_vec();
    let engine = LayoutEngine::new();
    engine.layout(&roots, &mut forest).unwrap();
    let before: Vec<_> = forest.nodes().iter().map(|n| n.coordinates).collect();

    // Act
    let second = engine.layout(&roots, &mut forest).unwrap();

    // Assert
    let after: Vec<_> = forest.nodes().iter().map(|n| n.coordinates).collect();
    assert_eq!(before, after);
    assert!(second.assigned.is_empty());
}

#[test]
fn given_node_with_coordinates_when_laying_out_then_subtree_is_skipped() {
    // Arrange: revenue was laid out by an earlier batch
    let mut revenue = kpitree::domain::Node::new("revenue");
    revenue.coordinates = Some(Coordinates { x: 7, y: 7 });
    let store = MemoryStore::with_state(StoreState {
        nodes: vec![revenue],
        decompositions: vec![],
    });
    let mut forest = build(
        &store,
        &["profit = revenue - cost", "revenue = quantity * price"],
    );
    let roots = forest.roots().to_vec();

    // Act
    LayoutEngine::new().layout(&roots, &mut forest).unwrap();

    // Assert
    assert_eq!(coords(&forest, "profit"), Some((0, 0)));
    assert_eq!(coords(&forest, "revenue"), Some((7, 7)));
    assert_eq!(coords(&forest, "cost"), Some((1, 1)));
    assert_eq!(coords(&forest, "quantity"), None);
    assert_eq!(coords(&forest, "price"), None);
}

#[test]
fn given_independent_roots_when_laying_out_then_sequence_is_shared() {
    let store = MemoryStore::new();
    let mut forest = build(&store, &["a = b + c", "x = y - z"]);
    let roots = forest.roots().to_vec();

    LayoutEngine::new().layout(&roots, &mut forest).unwrap();

    assert_eq!(coords(&forest, "a"), Some((0, 0)));
    assert_eq!(coords(&forest, "c"), Some((1, 2)));
    assert_eq!(coords(&forest, "x"), Some((0, 3)));
    assert_eq!(coords(&forest, "z"), Some((1, 5)));
}

#[test]
fn given_deep_chain_and_low_ceiling_when_laying_out_then_consistency_error() {
    // Arrange
    let store = MemoryStore::new();
    let mut forest = build(&store, &["a = b", "b = c", "c = d"]);
    let roots = forest.roots().to_vec();

    // Act
    let result = LayoutEngine::with_max_depth(2).layout(&roots, &mut forest);

    // Assert
    assert!(matches!(result, Err(DomainError::Consistency { .. })));
}

#[test]
fn given_very_long_alias_chain_when_generating_then_lays_out_every_level() {
    // Arrange: n0 = n1, n1 = n2, ... well past what a recursive walk survives
    const DEPTH: u32 = 100_000;
    let input: Vec<String> = (0..DEPTH).map(|i| format!("n{i} = n{}", i + 1)).collect();
    let store = Arc::new(MemoryStore::new());

    // Act
    let generation = GenerationService::new(store.clone())
        .generate(&input)
        .unwrap();

    // Assert
    assert_eq!(generation.nodes_laid_out, DEPTH as usize + 1);
    let forest = &generation.forest;
    assert_eq!(coords(forest, "n0"), Some((0, 0)));
    assert_eq!(coords(forest, "n50000"), Some((50_000, 50_000)));
    assert_eq!(coords(forest, &format!("n{DEPTH}")), Some((DEPTH, DEPTH)));
    assert_eq!(store.snapshot().unwrap().nodes.len(), DEPTH as usize + 1);
}

#[test]
fn given_very_long_chain_closing_on_itself_when_building_then_cycle_detected() {
    // Arrange
    const DEPTH: usize = 100_000;
    let mut input: Vec<String> = (0..DEPTH).map(|i| format!("n{i} = n{}", i + 1)).collect();
    input.push(format!("n{DEPTH} = n0"));
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();

    // Act
    let err = TreeBuilder::new().build(&mut *tx, &input).unwrap_err();

    // Assert
    assert_eq!(err.kind(), kpitree::application::ErrorKind::Consistency);
    assert_eq!(err.position(), Some(DEPTH + 1));
}
