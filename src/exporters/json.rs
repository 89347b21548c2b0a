//! The hierarchy in the `{name, children | value}` shape d3's
//! `d3.hierarchy` understands. Used for debug logging.

use serde_derive::{Deserialize, Serialize};

use crate::node::DataNode;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum NodeKind {
    Value(u64),
    Children(Vec<Node>),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Node {
    name: String,
    #[serde(flatten)]
    kind: NodeKind,
}

fn node_to_node(name: String, data_node: &DataNode<'_>) -> Node {
    Node {
        name,
        kind: if data_node.is_leaf() {
            NodeKind::Value(data_node.size)
        } else {
            NodeKind::Children(
                data_node
                    .sorted_children()
                    .into_iter()
                    .map(|(name, child)| node_to_node(name.to_string(), child))
                    .collect(),
            )
        },
    }
}

pub fn export(root: &DataNode<'_>, root_label: &str) -> Node {
    node_to_node(root_label.to_string(), root)
}
