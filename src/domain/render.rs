use std::collections::HashSet;

use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{Node, NodeId};
use crate::domain::forest::Forest;

pub trait ForestRender {
    /// One display tree per decomposition root, in formula order.
    fn to_tree_strings(&self) -> Vec<Tree<String>>;
}

fn node_text(node: &Node) -> String {
    match node.coordinates {
        Some(c) => format!("{} ({}, {})", node.label, c.x, c.y),
        None => node.label.clone(),
    }
}

impl ForestRender for Forest {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_strings(&self) -> Vec<Tree<String>> {
        // A root that already appears beneath an earlier root is shown there only.
        let mut shown: HashSet<NodeId> = HashSet::new();
        let mut trees = Vec::new();
        for &root in self.roots() {
            if shown.contains(&root) {
                continue;
            }
            let mut path = Vec::new();
            if let Some(tree) = build_tree(self, root, &mut path, &mut shown) {
                trees.push(tree);
            }
        }
        trees
    }
}

fn build_tree(
    forest: &Forest,
    id: NodeId,
    path: &mut Vec<NodeId>,
    shown: &mut HashSet<NodeId>,
) -> Option<Tree<String>> {
    let node = forest.node(id)?;
    shown.insert(id);
    let mut text = node_text(node);

    let decomposition = forest.decomposition_of(id);
    if path.contains(&id) {
        return Some(Tree::new(format!("{text} [cycle]")));
    }
    let Some(decomposition) = decomposition else {
        return Some(Tree::new(text));
    };
    if let Some(op) = decomposition.operator {
        text = format!("{text} [{op}]");
    }

    path.push(id);
    let leaves: Vec<_> = decomposition
        .children
        .iter()
        .filter_map(|&child| build_tree(forest, child, path, shown))
        .collect();
    path.pop();

    Some(Tree::new(text).with_leaves(leaves))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::NodeArena;
    use crate::domain::entities::Decomposition;
    use crate::domain::operator::Operator;

    #[test]
    fn given_nested_forest_when_rendering_then_nests_children_once() {
        let mut arena = NodeArena::new();
        let nodes: Vec<Node> = ["profit", "revenue", "cost", "price"]
            .iter()
            .map(|l| Node::new(*l))
            .collect();
        for n in &nodes {
            arena.insert(n.clone()).unwrap();
        }
        let mut forest = Forest::new(arena);
        forest
            .add_decomposition(
                Decomposition::new(nodes[0].id, Some(Operator::Subtract), vec![nodes[1].id, nodes[2].id])
                    .unwrap(),
            )
            .unwrap();
        forest
            .add_decomposition(Decomposition::new(nodes[1].id, None, vec![nodes[3].id]).unwrap())
            .unwrap();

        let trees = forest.to_tree_strings();

        assert_eq!(trees.len(), 1);
        let rendered = trees[0].to_string();
        assert!(rendered.starts_with("profit [-]"));
        assert!(rendered.contains("revenue"));
        assert!(rendered.contains("price"));
    }
}
