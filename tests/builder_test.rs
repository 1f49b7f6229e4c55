//! Tests for TreeBuilder

use kpitree::application::{ApplicationError, ErrorKind, TreeBuilder};
use kpitree::domain::{Operator, ParsedExpression};
use kpitree::infrastructure::traits::TreeStore;
use kpitree::infrastructure::MemoryStore;

fn formulas(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

fn labels(forest: &kpitree::domain::Forest, ids: &[kpitree::domain::NodeId]) -> Vec<String> {
    ids.iter()
        .map(|&id| forest.node(id).map(|n| n.label.clone()).unwrap_or_default())
        .collect()
}

#[test]
fn given_profit_formulas_when_building_then_creates_shared_forest() {
    // Arrange
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();
    let input = formulas(&["profit = revenue - cost", "revenue = quantity * price"]);

    // Act
    let outcome = TreeBuilder::new().build(&mut *tx, &input).unwrap();

    // Assert
    let forest = &outcome.forest;
    assert_eq!(forest.nodes().len(), 5);
    assert_eq!(forest.decompositions().len(), 2);
    assert_eq!(outcome.nodes_created, 5);

    let profit = forest.node_by_label("profit").unwrap().id;
    let revenue = forest.node_by_label("revenue").unwrap().id;
    let d_profit = forest.decomposition_of(profit).unwrap();
    let d_revenue = forest.decomposition_of(revenue).unwrap();
    assert_eq!(d_profit.operator, Some(Operator::Subtract));
    assert_eq!(labels(forest, &d_profit.children), vec!["revenue", "cost"]);
    assert_eq!(d_revenue.operator, Some(Operator::Multiply));
    assert_eq!(labels(forest, &d_revenue.children), vec!["quantity", "price"]);

    // The child of the first decomposition is the root of the second
    assert_eq!(d_profit.children[0], d_revenue.root);
}

#[test]
fn given_bare_alias_when_building_then_single_child_without_operator() {
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();

    let outcome = TreeBuilder::new()
        .build(&mut *tx, &formulas(&["turnover = revenue"]))
        .unwrap();

    let forest = &outcome.forest;
    let root = forest.node_by_label("turnover").unwrap().id;
    let decomposition = forest.decomposition_of(root).unwrap();
    assert_eq!(decomposition.operator, None);
    assert_eq!(labels(forest, &decomposition.children), vec!["revenue"]);
}

#[test]
fn given_root_decomposed_twice_when_building_then_last_formula_wins() {
    // Arrange
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();
    let input = formulas(&["a = b + c", "a = d * e"]);

    // Act
    let outcome = TreeBuilder::new().build(&mut *tx, &input).unwrap();

    // Assert
    let forest = &outcome.forest;
    let a = forest.node_by_label("a").unwrap().id;
    let active = forest.decomposition_of(a).unwrap();
    assert_eq!(active.operator, Some(Operator::Multiply));
    assert_eq!(labels(forest, &active.children), vec!["d", "e"]);
    assert_eq!(forest.decompositions().len(), 2);
    assert_eq!(forest.roots().len(), 1);
}

#[test]
fn given_formula_without_equals_when_building_then_parse_error_with_position() {
    // Arrange
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();
    let input = formulas(&["profit = revenue - cost", "revenue quantity * price"]);

    // Act
    let err = TreeBuilder::new().build(&mut *tx, &input).unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.position(), Some(2));
    assert!(err.to_string().contains("revenue quantity * price"));
}

#[test]
fn given_empty_operand_when_building_then_parse_error_names_formula() {
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();

    let err = TreeBuilder::new()
        .build(&mut *tx, &formulas(&["profit = revenue -"]))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.position(), Some(1));
}

#[test]
fn given_back_reference_when_building_then_cycle_blamed_on_closing_formula() {
    // Arrange
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();
    let input = formulas(&["a = b + c", "b = a * d"]);

    // Act
    let err = TreeBuilder::new().build(&mut *tx, &input).unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(err.position(), Some(2));
    match err {
        ApplicationError::Formula {
            formula, source, ..
        } => {
            assert_eq!(formula, "b = a * d");
            assert!(source.to_string().contains("cycle"), "got {source}");
        }
        other => panic!("expected error tied to a formula, got {other:?}"),
    }
}

#[test]
fn given_self_reference_when_building_then_cycle_detected() {
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();

    let err = TreeBuilder::new()
        .build(&mut *tx, &formulas(&["a = a + b"]))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(err.position(), Some(1));
}

#[test]
fn given_empty_batch_when_building_then_empty_forest() {
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();

    let outcome = TreeBuilder::new().build(&mut *tx, &[]).unwrap();

    assert!(outcome.forest.nodes().is_empty());
    assert!(outcome.forest.decompositions().is_empty());
}

#[test]
fn given_parsed_expression_when_comparing_then_keeps_operand_order() {
    let parsed = kpitree::domain::parse("z + a + m").unwrap();

    assert_eq!(
        parsed,
        ParsedExpression {
            operands: vec!["z".into(), "a".into(), "m".into()],
            operator: Some(Operator::Add),
        }
    );
}

#[test]
fn given_longer_cycle_when_building_then_cycle_blamed_on_closing_formula() {
    let store = MemoryStore::new();
    let mut tx = store.begin().unwrap();
    let input = formulas(&["a = b + c", "c = d - e", "x = y", "e = a / f"]);

    let err = TreeBuilder::new().build(&mut *tx, &input).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(err.position(), Some(4));
}
