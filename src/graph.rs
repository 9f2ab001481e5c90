//! Generated constructor graphs
//!
//! Node `i` is registered as type `Node{i}`. Its constructor parameters name
//! either `Node{j}` directly or the interface `INode{j}`, which is then bound
//! to `Node{j}`.

use std::sync::Arc;

use weave_di::{Container, ContainerBuilder, DIResult, Parameter, TypeDescriptor, Value};

/// A built node, compared by value against hand-built graphs.
#[derive(Debug, PartialEq)]
pub struct Node {
    pub id: usize,
    pub deps: Vec<Arc<Node>>,
}

/// Adjacency list plus which nodes are reached through an interface.
#[derive(Debug, Clone)]
pub struct GraphSpec {
    pub edges: Vec<Vec<usize>>,
    pub via_interface: Vec<bool>,
}

impl GraphSpec {
    /// An acyclic graph: every edge points to a higher index.
    ///
    /// `picks[i]` are reduced into the range above `i`; duplicates are dropped.
    pub fn acyclic(picks: Vec<Vec<usize>>, via_interface: Vec<bool>) -> Self {
        let len = picks.len();
        let edges = picks
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let above = len - i - 1;
                let mut deps: Vec<usize> = Vec::new();
                if above == 0 {
                    return deps;
                }
                for pick in raw {
                    let dep = i + 1 + pick % above;
                    if !deps.contains(&dep) {
                        deps.push(dep);
                    }
                }
                deps
            })
            .collect();

        Self {
            edges,
            via_interface: pad(via_interface, len),
        }
    }

    /// `0 -> 1 -> ... -> len-1 -> 0`.
    pub fn ring(len: usize, via_interface: Vec<bool>) -> Self {
        let edges = (0..len).map(|i| vec![(i + 1) % len]).collect();
        Self {
            edges,
            via_interface: pad(via_interface, len),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn type_name(id: usize) -> String {
        format!("Node{}", id)
    }

    fn dependency_name(&self, id: usize) -> String {
        if self.via_interface[id] {
            format!("INode{}", id)
        } else {
            Self::type_name(id)
        }
    }

    pub fn container(&self) -> DIResult<Container> {
        let mut builder = ContainerBuilder::new();
        for (id, deps) in self.edges.iter().enumerate() {
            let mut descriptor = TypeDescriptor::concrete(Self::type_name(id), move |args| {
                let deps = (0..args.len())
                    .map(|i| args.object::<Node>(i))
                    .collect::<DIResult<Vec<_>>>()?;
                Ok(Value::object(Node { id, deps }))
            });
            for (position, dep) in deps.iter().enumerate() {
                descriptor = descriptor.param(Parameter::new(
                    format!("dep{}", position),
                    self.dependency_name(*dep),
                ));
            }
            builder.add_type(descriptor)?;

            if self.via_interface[id] {
                builder.add_type(TypeDescriptor::abstract_type(format!("INode{}", id)))?;
                builder.add_binding(format!("INode{}", id), Self::type_name(id))?;
            }
        }
        builder.build()
    }

    /// Build node `id` without the container.
    pub fn by_hand(&self, id: usize) -> Node {
        Node {
            id,
            deps: self.edges[id]
                .iter()
                .map(|dep| Arc::new(self.by_hand(*dep)))
                .collect(),
        }
    }
}

fn pad(mut flags: Vec<bool>, len: usize) -> Vec<bool> {
    flags.resize(len, false);
    flags
}
