use std::collections::HashMap;

use petgraph::algo::has_path_connecting;
use petgraph::graph::NodeIndex;
use petgraph::Graph;

use crate::schema::{Cardinality, FieldType, Module};

/// `MessageGraph` builds a graph of messages whose edges correspond to
/// non-repeated message-typed fields (oneof candidates included). The goal is
/// to recognize when message types are recursively nested, so that those
/// slots can be boxed; without boxing, recursive messages would have infinite
/// size in Rust.
pub struct MessageGraph {
    index: HashMap<String, NodeIndex>,
    graph: Graph<String, ()>,
}

impl MessageGraph {
    pub fn new(modules: &[Module]) -> MessageGraph {
        let mut msg_graph = MessageGraph {
            index: HashMap::new(),
            graph: Graph::new(),
        };

        for module in modules {
            for message in &module.messages {
                let msg_index =
                    msg_graph.get_or_insert_index(qualify(&module.name, &message.name));
                for group in &message.groups {
                    for field in group.fields() {
                        if field.cardinality == Cardinality::Repeated {
                            continue;
                        }
                        if let FieldType::Message(type_ref) = &field.ty {
                            let target = qualify(
                                type_ref.module.as_deref().unwrap_or(&module.name),
                                &type_ref.name,
                            );
                            let field_index = msg_graph.get_or_insert_index(target);
                            msg_graph.graph.add_edge(msg_index, field_index, ());
                        }
                    }
                }
            }
        }

        msg_graph
    }

    fn get_or_insert_index(&mut self, msg_name: String) -> NodeIndex {
        let MessageGraph {
            ref mut index,
            ref mut graph,
        } = *self;
        *index
            .entry(msg_name.clone())
            .or_insert_with(|| graph.add_node(msg_name))
    }

    /// Returns true if message type `inner` is reachable from message type
    /// `outer` through non-repeated message fields.
    pub fn is_nested(&self, outer: &str, inner: &str) -> bool {
        let outer = match self.index.get(outer) {
            Some(outer) => *outer,
            None => return false,
        };
        let inner = match self.index.get(inner) {
            Some(inner) => *inner,
            None => return false,
        };

        has_path_connecting(&self.graph, outer, inner, None)
    }
}

/// The fully qualified name of a message within the compilation unit.
pub fn qualify(module: &str, name: &str) -> String {
    format!("{}.{}", module, name)
}
