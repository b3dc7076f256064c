//! Record Inheritance Graph
//!
//! Validates `extends` references between records and fixes the order in
//! which records are emitted: parents before children, otherwise input order.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::codegen::names::safe_name;
use crate::error::{CodegenError, Result};
use crate::schema::RecordDecl;

/// Edges point from parent to child
#[derive(Debug)]
pub struct InheritanceGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl InheritanceGraph {
    /// Build the graph. Unknown parents are unresolved references and
    /// repeated record names are invalid input.
    pub fn build(records: &[&RecordDecl]) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(records.len(), records.len());
        let mut indices = HashMap::with_capacity(records.len());

        for record in records {
            let name = safe_name(&record.name);
            if indices.contains_key(&name) {
                return Err(CodegenError::InvalidSchema(format!(
                    "record {} is declared more than once",
                    record.name
                )));
            }
            let idx = graph.add_node(name.clone());
            indices.insert(name, idx);
        }

        for record in records {
            let child = indices[&safe_name(&record.name)];
            for parent in &record.extends {
                let parent_idx = indices
                    .get(&safe_name(parent))
                    .copied()
                    .ok_or_else(|| CodegenError::unresolved(parent.clone()))?;
                graph.add_edge(parent_idx, child, ());
            }
        }

        let built = Self { graph, indices };
        built.check_cycles()?;
        Ok(built)
    }

    fn check_cycles(&self) -> Result<()> {
        for scc in kosaraju_scc(&self.graph) {
            let self_loop = scc.len() == 1 && self.graph.contains_edge(scc[0], scc[0]);
            if scc.len() > 1 || self_loop {
                let mut members: Vec<NodeIndex> = scc;
                members.sort();
                let mut names: Vec<String> = members.iter().map(|i| self.graph[*i].clone()).collect();
                names.push(names[0].clone());
                return Err(CodegenError::InheritanceCycle { members: names });
            }
        }
        Ok(())
    }

    /// Input positions in emission order
    pub fn emission_order(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for child in self.graph.neighbors_directed(NodeIndex::new(i), Direction::Outgoing) {
                let d = &mut in_degree[child.index()];
                *d -= 1;
                if *d == 0 {
                    ready.push(Reverse(child.index()));
                }
            }
        }
        order
    }

    /// Direct parents of a record, by safe name
    pub fn parents(&self, name: &str) -> Vec<&str> {
        let Some(idx) = self.indices.get(name) else {
            return Vec::new();
        };
        let mut parents: Vec<NodeIndex> = self.graph.neighbors_directed(*idx, Direction::Incoming).collect();
        parents.sort();
        parents.into_iter().map(|p| self.graph[p].as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, extends: &[&str]) -> RecordDecl {
        serde_json::from_value(json!({"type": "record", "name": name, "extends": extends})).unwrap()
    }

    #[test]
    fn test_parents_before_children() {
        let decls = [
            record("Tool", &["Process"]),
            record("File", &[]),
            record("Process", &["Labeled"]),
            record("Labeled", &[]),
        ];
        let refs: Vec<&RecordDecl> = decls.iter().collect();
        let graph = InheritanceGraph::build(&refs).unwrap();
        assert_eq!(graph.emission_order(), vec![1, 3, 2, 0]);
        assert_eq!(graph.parents("Tool"), vec!["Process"]);
    }

    #[test]
    fn test_unknown_parent() {
        let decls = [record("Tool", &["http://example.com/schema#Missing"])];
        let refs: Vec<&RecordDecl> = decls.iter().collect();
        let err = InheritanceGraph::build(&refs).unwrap_err();
        assert!(matches!(err, CodegenError::UnresolvedTypeReference { .. }));
    }

    #[test]
    fn test_cycle_detected() {
        let decls = [record("A", &["B"]), record("B", &["A"])];
        let refs: Vec<&RecordDecl> = decls.iter().collect();
        let err = InheritanceGraph::build(&refs).unwrap_err();
        assert_eq!(err.to_string(), "Inheritance cycle detected: A -> B -> A");
    }

    #[test]
    fn test_duplicate_record() {
        let decls = [record("A", &[]), record("A", &[])];
        let refs: Vec<&RecordDecl> = decls.iter().collect();
        assert!(matches!(
            InheritanceGraph::build(&refs).unwrap_err(),
            CodegenError::InvalidSchema(_)
        ));
    }
}
