// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Component dependency graph: cycle detection and evaluation order.
//!
//! # Algorithms
//!
//! ## Cycle detection
//! DFS with a recursion stack. A back edge to a node still on the stack is a
//! cycle; the path segment from that node to the current one, closed with the
//! back edge, is reported so the offending components can be named.
//!
//! ## Ordering
//! Kahn's algorithm with a min-heap as the ready queue, so that among
//! components whose sources are all evaluated the earliest declared runs
//! first. The result is deterministic for a given model.
//!
//! ## Levels
//! The same in-degree bookkeeping grouped breadth-first: every component in a
//! level depends only on earlier levels, so the members of one level are
//! independent of each other.

use crate::errors::AssemblyError;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// Edges `a -> b` where an output of component `a` feeds an input of `b`.
/// Nodes are component indices in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new(names: Vec<String>) -> Self {
        let dependents = vec![Vec::new(); names.len()];
        Self { names, dependents }
    }

    pub fn add_edge(&mut self, from: usize, to: usize) {
        let list = &mut self.dependents[from];
        if let Err(pos) = list.binary_search(&to) {
            list.insert(pos, to);
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn dependents(&self, node: usize) -> &[usize] {
        &self.dependents[node]
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.iter().map(Vec::len).sum()
    }

    fn in_degrees(&self) -> Vec<usize> {
        let mut in_degree = vec![0; self.len()];
        for list in &self.dependents {
            for &to in list {
                in_degree[to] += 1;
            }
        }
        in_degree
    }
}

/// Fail with the first cycle found, naming the components on it.
pub fn validate_acyclic(graph: &DependencyGraph) -> Result<(), AssemblyError> {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node in 0..graph.len() {
        if visited.contains(&node) {
            continue;
        }
        if let Some(cycle) = dfs_cycle_detection(node, graph, &mut visited, &mut rec_stack, &mut path) {
            return Err(AssemblyError::CyclicDependency {
                cycle: cycle.into_iter().map(|n| graph.name(n).to_string()).collect(),
            });
        }
    }
    Ok(())
}

fn dfs_cycle_detection(
    node: usize,
    graph: &DependencyGraph,
    visited: &mut HashSet<usize>,
    rec_stack: &mut HashSet<usize>,
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    for &neighbor in graph.dependents(node) {
        if !visited.contains(&neighbor) {
            if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                return Some(cycle);
            }
        } else if rec_stack.contains(&neighbor) {
            let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(neighbor);
            return Some(cycle);
        }
    }

    rec_stack.remove(&node);
    path.pop();
    None
}

/// Evaluation order; ties go to the earliest declared component.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<usize>, AssemblyError> {
    let mut in_degree = graph.in_degrees();
    let mut ready: BinaryHeap<Reverse<usize>> = (0..graph.len())
        .filter(|&n| in_degree[n] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &dependent in graph.dependents(node) {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() != graph.len() {
        // only reachable when validate_acyclic was skipped
        validate_acyclic(graph)?;
    }
    Ok(order)
}

/// Groups of mutually independent components, in dependency order.
pub fn topological_levels(graph: &DependencyGraph) -> Vec<Vec<usize>> {
    let mut in_degree = graph.in_degrees();
    let mut current: Vec<usize> = (0..graph.len()).filter(|&n| in_degree[n] == 0).collect();
    let mut levels = Vec::new();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &node in &current {
            for &dependent in graph.dependents(node) {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    next.push(dependent);
                }
            }
        }
        next.sort_unstable();
        levels.push(std::mem::replace(&mut current, next));
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(names: &[&str], edges: &[(usize, usize)]) -> DependencyGraph {
        let mut g = DependencyGraph::new(names.iter().map(|s| s.to_string()).collect());
        for &(a, b) in edges {
            g.add_edge(a, b);
        }
        g
    }

    #[test]
    fn test_empty_graph() {
        let g = graph(&[], &[]);
        assert!(validate_acyclic(&g).is_ok());
        assert!(topological_order(&g).unwrap().is_empty());
        assert!(topological_levels(&g).is_empty());
    }

    #[test]
    fn test_linear_chain() {
        let g = graph(&["c", "b", "a"], &[(2, 1), (1, 0)]);
        assert_eq!(topological_order(&g).unwrap(), vec![2, 1, 0]);
        assert_eq!(topological_levels(&g), vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn test_ties_follow_declaration_order() {
        // 0 and 2 are both sources; 1 depends on 2
        let g = graph(&["x", "y", "z"], &[(2, 1)]);
        assert_eq!(topological_order(&g).unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn test_diamond_levels() {
        let g = graph(&["top", "left", "right", "bottom"], &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert_eq!(topological_levels(&g), vec![vec![0], vec![1, 2], vec![3]]);
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn test_duplicate_edges_are_ignored() {
        let mut g = graph(&["a", "b"], &[(0, 1)]);
        g.add_edge(0, 1);
        assert_eq!(g.dependents(0), &[1]);
    }

    #[test]
    fn test_simple_cycle_is_named() {
        let g = graph(&["a", "b"], &[(0, 1), (1, 0)]);
        match validate_acyclic(&g) {
            Err(AssemblyError::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
        assert!(topological_order(&g).is_err());
    }

    #[test]
    fn test_self_loop_and_inner_cycle() {
        let g = graph(&["solo"], &[(0, 0)]);
        assert!(matches!(
            validate_acyclic(&g),
            Err(AssemblyError::CyclicDependency { ref cycle }) if cycle == &vec!["solo".to_string(), "solo".to_string()]
        ));

        // a -> b -> c -> d -> b
        let g = graph(&["a", "b", "c", "d"], &[(0, 1), (1, 2), (2, 3), (3, 1)]);
        match validate_acyclic(&g) {
            Err(AssemblyError::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["b", "c", "d", "b"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }
}
