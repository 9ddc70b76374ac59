//! Prerequisite Graph Cycle Detection
//!
//! Standard three-color depth-first search over the directed graph formed
//! by prerequisite edges. Top-level traversal follows the adjacency list's
//! insertion order; for a given cycle this affects *which* node is named in
//! the report (a detection-order artifact), never whether it is found.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    Visiting,
    Visited,
}

/// Adjacency list in document order: `(node id, prerequisite ids)`.
pub type Adjacency = Vec<(String, Vec<String>)>;

/// Find one cycle, returning the id of the node at which the back-edge was
/// detected. Edges pointing at ids absent from the adjacency list are
/// ignored here; dangling references are a separate validation rule.
pub fn find_cycle(adjacency: &Adjacency) -> Option<String> {
    let index: HashMap<&str, usize> = adjacency
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.as_str(), i))
        .collect();
    let mut colors = vec![Color::Unvisited; adjacency.len()];

    for start in 0..adjacency.len() {
        if colors[start] == Color::Unvisited {
            if let Some(node) = visit(start, adjacency, &index, &mut colors) {
                return Some(node);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    adjacency: &Adjacency,
    index: &HashMap<&str, usize>,
    colors: &mut Vec<Color>,
) -> Option<String> {
    colors[node] = Color::Visiting;
    for target in &adjacency[node].1 {
        let Some(&next) = index.get(target.as_str()) else {
            continue;
        };
        match colors[next] {
            Color::Visiting => return Some(adjacency[next].0.clone()),
            Color::Unvisited => {
                if let Some(found) = visit(next, adjacency, index, colors) {
                    return Some(found);
                }
            }
            Color::Visited => {}
        }
    }
    colors[node] = Color::Visited;
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(edges: &[(&str, &[&str])]) -> Adjacency {
        edges
            .iter()
            .map(|(id, targets)| {
                (
                    id.to_string(),
                    targets.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn three_node_chain_cycles() {
        let graph = adj(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        assert_eq!(find_cycle(&graph), Some("a".to_string()));
    }

    #[test]
    fn self_loop_cycles() {
        let graph = adj(&[("a", &["a"])]);
        assert_eq!(find_cycle(&graph), Some("a".to_string()));
    }

    #[test]
    fn diamond_is_acyclic() {
        let graph = adj(&[
            ("c", &["a", "b"]),
            ("d", &["a", "b"]),
            ("e", &["c", "d"]),
            ("a", &[]),
            ("b", &[]),
        ]);
        assert_eq!(find_cycle(&graph), None);
    }

    #[test]
    fn dangling_targets_are_ignored() {
        let graph = adj(&[("a", &["missing"])]);
        assert_eq!(find_cycle(&graph), None);
    }
}
