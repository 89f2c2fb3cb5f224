//! MeSH hierarchy
//!
//! Nodes are keyed by tree number (`C04.588.894`). The parent of a node is the
//! node whose tree number drops the last dotted segment. A descriptor code can
//! sit at several tree numbers, so lookups by code return every placement.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A single placement of a MeSH descriptor in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTreeNode {
    /// Descriptor code (`D009369`)
    pub code: String,

    /// Position in the hierarchy (`C04.588`)
    pub tree_number: String,

    pub name: String,

    /// Citations classified directly under this descriptor.
    pub direct_count: i64,

    /// Citations classified anywhere below this node.
    pub indirect_count: i64,
}

impl MeshTreeNode {
    /// Tree number of the parent placement, `None` at a root.
    pub fn parent_tree_number(&self) -> Option<&str> {
        self.tree_number.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Number of ancestors above this node.
    pub fn depth(&self) -> usize {
        self.tree_number.matches('.').count()
    }

    /// True when `other` lies strictly below this node.
    pub fn is_ancestor_of(&self, other: &MeshTreeNode) -> bool {
        other
            .tree_number
            .strip_prefix(self.tree_number.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// In-memory arena over a set of tree nodes.
///
/// Parent and child links are resolved by tree-number lookup; nodes never hold
/// references to each other.
#[derive(Debug, Clone, Default)]
pub struct MeshTree {
    nodes: Vec<MeshTreeNode>,
    by_tree_number: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl MeshTree {
    pub fn new(nodes: Vec<MeshTreeNode>) -> Self {
        let mut tree = Self::default();
        for node in nodes {
            if tree.by_tree_number.contains_key(&node.tree_number) {
                continue;
            }
            let idx = tree.nodes.len();
            tree.by_tree_number.insert(node.tree_number.clone(), idx);
            if let Some(parent) = node.parent_tree_number() {
                tree.children.entry(parent.to_string()).or_default().push(idx);
            }
            tree.nodes.push(node);
        }
        for slots in tree.children.values_mut() {
            let nodes = &tree.nodes;
            slots.sort_by(|a, b| nodes[*a].tree_number.cmp(&nodes[*b].tree_number));
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, tree_number: &str) -> Option<&MeshTreeNode> {
        self.by_tree_number.get(tree_number).map(|&i| &self.nodes[i])
    }

    /// Every placement of a descriptor code.
    pub fn by_code(&self, code: &str) -> Vec<&MeshTreeNode> {
        self.nodes.iter().filter(|n| n.code == code).collect()
    }

    /// Parent placement, if it is loaded.
    pub fn parent(&self, node: &MeshTreeNode) -> Option<&MeshTreeNode> {
        node.parent_tree_number().and_then(|p| self.get(p))
    }

    pub fn children(&self, node: &MeshTreeNode) -> Vec<&MeshTreeNode> {
        self.children
            .get(&node.tree_number)
            .map(|idxs| idxs.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    /// All loaded nodes below `node`, depth first.
    pub fn descendants(&self, node: &MeshTreeNode) -> Vec<&MeshTreeNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&MeshTreeNode> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }

    /// Descriptor codes of the given codes and everything below them.
    pub fn subtree_codes<S: AsRef<str>>(&self, codes: &[S]) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for code in codes {
            let code = code.as_ref();
            out.insert(code.to_string());
            for node in self.by_code(code) {
                out.extend(self.descendants(node).into_iter().map(|d| d.code.clone()));
            }
        }
        out
    }
}
