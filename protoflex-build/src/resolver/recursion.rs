//! Recursive message detection.
//!
//! Messages can reference themselves directly:
//! ```protobuf
//! message Node {
//!   Node child = 1;
//! }
//! ```
//!
//! Or indirectly:
//! ```protobuf
//! message A {
//!   B b = 1;
//! }
//! message B {
//!   A a = 1;
//! }
//! ```
//!
//! Renderers need indirection for such fields, and a zero instance cannot
//! populate them without expanding forever, so their default is absent.
//! Only singular message fields (oneof members included) form edges: lists
//! and maps start out empty and never force an expansion.

use std::collections::{HashMap, HashSet};

use crate::output::{FieldKind, ResolvedMessage, TypeRef};

/// A field that closes a cycle of message references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RecursiveField {
    /// Fully-qualified name of the containing message.
    pub message: String,
    pub field: String,
}

/// Every field that lies on a cycle among `messages`.
///
/// A field is on a cycle when the message it references can reach the
/// message holding it, that is when both sit in the same strongly connected
/// component of the reference graph.
pub(crate) fn find_recursive_fields<'a, I>(messages: I) -> HashSet<RecursiveField>
where
    I: IntoIterator<Item = &'a ResolvedMessage>,
{
    let messages: Vec<&ResolvedMessage> = messages.into_iter().collect();
    let index: HashMap<&str, usize> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| (message.name.as_str(), i))
        .collect();

    // node -> [(field, referenced node)]
    let graph: Vec<Vec<(&str, usize)>> = messages
        .iter()
        .map(|message| {
            message
                .fields
                .iter()
                .filter_map(|field| match &field.kind {
                    FieldKind::Singular(TypeRef::Message(target)) => {
                        index.get(target.as_str()).map(|&to| (field.name.as_str(), to))
                    }
                    _ => None,
                })
                .collect()
        })
        .collect();

    let component = Tarjan::components(&graph);
    let mut result = HashSet::new();
    for (from, edges) in graph.iter().enumerate() {
        for &(field, to) in edges {
            if component[from] == component[to] {
                result.insert(RecursiveField {
                    message: messages[from].name.clone(),
                    field: field.to_string(),
                });
            }
        }
    }
    result
}

/// Tarjan's strongly connected components over an adjacency list.
struct Tarjan<'g, 'a> {
    graph: &'g [Vec<(&'a str, usize)>],
    next: usize,
    order: Vec<Option<usize>>,
    low: Vec<usize>,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    component: Vec<usize>,
}

impl<'g, 'a> Tarjan<'g, 'a> {
    /// The component id of every node.
    fn components(graph: &'g [Vec<(&'a str, usize)>]) -> Vec<usize> {
        let n = graph.len();
        let mut tarjan = Tarjan {
            graph,
            next: 0,
            order: vec![None; n],
            low: vec![0; n],
            stack: Vec::new(),
            on_stack: vec![false; n],
            component: vec![0; n],
        };
        for node in 0..n {
            if tarjan.order[node].is_none() {
                tarjan.visit(node);
            }
        }
        tarjan.component
    }

    fn visit(&mut self, node: usize) {
        self.order[node] = Some(self.next);
        self.low[node] = self.next;
        self.next += 1;
        self.stack.push(node);
        self.on_stack[node] = true;

        let graph = self.graph;
        for &(_, to) in &graph[node] {
            match self.order[to] {
                None => {
                    self.visit(to);
                    self.low[node] = self.low[node].min(self.low[to]);
                }
                Some(order) if self.on_stack[to] => {
                    self.low[node] = self.low[node].min(order);
                }
                Some(_) => (),
            }
        }

        if Some(self.low[node]) == self.order[node] {
            while let Some(member) = self.stack.pop() {
                self.on_stack[member] = false;
                self.component[member] = node;
                if member == node {
                    break;
                }
            }
        }
    }
}
