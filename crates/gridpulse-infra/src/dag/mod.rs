use crate::error::GraphError;
use crate::types::{Descriptor, DescriptorId};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Dependency graph over descriptor IDs
///
/// Edges point from a dependency to its dependent, so a topological order is
/// a valid creation order. Node indices follow insertion order.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    inner: DiGraph<DescriptorId, ()>,
    index: IndexMap<DescriptorId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a descriptor set, checking every endpoint exists
    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = &'a Descriptor>,
    ) -> Result<Self, GraphError> {
        let descriptors: Vec<&Descriptor> = descriptors.into_iter().collect();
        let mut graph = Self::new();
        for descriptor in &descriptors {
            graph.add_node(descriptor.id().clone())?;
        }
        for descriptor in &descriptors {
            for dep in descriptor.dependencies() {
                graph.add_edge(dep, descriptor.id())?;
            }
        }
        Ok(graph)
    }

    pub fn add_node(&mut self, id: DescriptorId) -> Result<(), GraphError> {
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateDescriptor(id.to_string()));
        }
        let node = self.inner.add_node(id.clone());
        self.index.insert(id, node);
        Ok(())
    }

    /// Record that `dependent` must be created after `dependency`
    pub fn add_edge(
        &mut self,
        dependency: &DescriptorId,
        dependent: &DescriptorId,
    ) -> Result<(), GraphError> {
        if dependency == dependent {
            return Err(GraphError::SelfLoop(dependent.to_string()));
        }
        let from = self.node(dependency, dependent)?;
        let to = self.node(dependent, dependency)?;
        if !self.inner.contains_edge(from, to) {
            self.inner.add_edge(from, to, ());
        }
        Ok(())
    }

    fn node(&self, id: &DescriptorId, other: &DescriptorId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::DanglingReference {
                from: other.to_string(),
                to: id.to_string(),
            })
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Validate the entire graph structure
    pub fn validate(&self) -> Result<(), GraphError> {
        match petgraph::algo::toposort(&self.inner, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(GraphError::CycleDetected(
                self.inner[cycle.node_id()].to_string(),
            )),
        }
    }

    /// Creation order, ties broken by insertion order
    ///
    /// Identical graphs always produce identical orders, which keeps the
    /// engine's diff stable across runs.
    pub fn topological_order(&self) -> Result<Vec<DescriptorId>, GraphError> {
        self.validate()?;

        let mut in_degree: Vec<usize> = self
            .inner
            .node_indices()
            .map(|n| self.inner.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.inner.node_count());
        while let Some(Reverse(i)) = ready.pop() {
            let node = NodeIndex::new(i);
            order.push(self.inner[node].clone());
            for next in self.inner.neighbors_directed(node, Direction::Outgoing) {
                let degree = &mut in_degree[next.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(next.index()));
                }
            }
        }
        Ok(order)
    }
}
