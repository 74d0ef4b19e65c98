//! # Virtual Tree
//!
//! Arena-backed in-memory [`DocumentTree`].
//!
//! - Node keys are never reused, so a key identifies one node for the tree's lifetime
//! - Destroyed nodes are dropped from storage, so a long-lived tree only holds live nodes
//! - The wrapper node is the root; record containers are its direct children
//! - Every mutation is journaled as a [`TreePatch`] addressed by child-index path

use crate::document_tree::DocumentTree;
use crate::errors::{TreeError, TreeResult};
use crate::vnode::{VNode, BODY_NODE_NAME, TITLE_NODE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Stable identity of a node in a [`VirtualTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(usize);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Journaled tree mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum TreePatch {
    #[serde(rename_all = "camelCase")]
    AppendRecord { record_id: String, node: VNode },

    #[serde(rename_all = "camelCase")]
    RemoveRecord { record_id: String, path: Vec<u32> },

    /// The container keeps its node and is renamed to `name`
    RekeyRecord {
        from: String,
        to: String,
        name: String,
    },

    InsertChild {
        path: Vec<u32>,
        index: u32,
        node: VNode,
    },

    RemoveChild { path: Vec<u32>, index: u32 },

    SetText {
        path: Vec<u32>,
        characters: String,
        opacity: f32,
    },

    ClearRecords,
}

/// Observable view of one record container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRecord {
    pub id: String,
    pub title: String,
    pub title_opacity: f32,
    pub blocks: Vec<RenderedBlock>,
}

/// Observable view of one block node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    pub kind: String,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Frame { item_spacing: f32 },
    Text { characters: String, opacity: f32 },
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

#[derive(Debug, Clone)]
pub struct VirtualTree {
    nodes: HashMap<NodeKey, NodeData>,
    next_key: usize,
    root: NodeKey,
    index: HashMap<String, NodeKey>,
    journal: Vec<TreePatch>,
}

impl VirtualTree {
    pub fn new() -> Self {
        let wrapper = NodeData {
            name: "Annotations".to_string(),
            kind: NodeKind::Frame { item_spacing: 0.0 },
            parent: None,
            children: Vec::new(),
        };

        let root = NodeKey(0);
        Self {
            nodes: HashMap::from([(root, wrapper)]),
            next_key: 1,
            root,
            index: HashMap::new(),
            journal: Vec::new(),
        }
    }

    /// The wrapper node holding every record container
    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn node_name(&self, key: NodeKey) -> Option<&str> {
        self.get(key).ok().map(|node| node.name.as_str())
    }

    /// Characters and opacity of a text node
    pub fn text_of(&self, key: NodeKey) -> Option<(&str, f32)> {
        match &self.get(key).ok()?.kind {
            NodeKind::Text {
                characters,
                opacity,
            } => Some((characters.as_str(), *opacity)),
            NodeKind::Frame { .. } => None,
        }
    }

    pub fn item_spacing(&self, key: NodeKey) -> Option<f32> {
        match self.get(key).ok()?.kind {
            NodeKind::Frame { item_spacing } => Some(item_spacing),
            NodeKind::Text { .. } => None,
        }
    }

    /// Record ids in wrapper order
    pub fn record_ids(&self) -> Vec<String> {
        let by_key = self.ids_by_key();
        self.get(self.root)
            .map(|wrapper| {
                wrapper
                    .children
                    .iter()
                    .filter_map(|key| by_key.get(key).map(|id| id.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Observable record list, in wrapper order
    pub fn records(&self) -> Vec<RenderedRecord> {
        let by_key = self.ids_by_key();
        let Ok(wrapper) = self.get(self.root) else {
            return Vec::new();
        };

        wrapper
            .children
            .iter()
            .filter_map(|key| {
                let id = by_key.get(key)?;
                let (title, title_opacity) = self
                    .title_node(*key)
                    .and_then(|title| self.text_of(title))
                    .map(|(characters, opacity)| (characters.to_string(), opacity))
                    .unwrap_or_default();
                let blocks = self
                    .body_node(*key)
                    .map(|body| self.render_blocks(body))
                    .unwrap_or_default();

                Some(RenderedRecord {
                    id: id.to_string(),
                    title,
                    title_opacity,
                    blocks,
                })
            })
            .collect()
    }

    /// Rebuilds a detached copy of the subtree at `key`
    pub fn to_vnode(&self, key: NodeKey) -> Option<VNode> {
        let node = self.get(key).ok()?;
        Some(match &node.kind {
            NodeKind::Frame { item_spacing } => VNode::Frame {
                name: node.name.clone(),
                item_spacing: *item_spacing,
                children: node
                    .children
                    .iter()
                    .filter_map(|child| self.to_vnode(*child))
                    .collect(),
            },
            NodeKind::Text {
                characters,
                opacity,
            } => VNode::Text {
                name: node.name.clone(),
                characters: characters.clone(),
                opacity: *opacity,
            },
        })
    }

    pub fn patches(&self) -> &[TreePatch] {
        &self.journal
    }

    pub fn take_patches(&mut self) -> Vec<TreePatch> {
        std::mem::take(&mut self.journal)
    }

    /// Live nodes, wrapper included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Mutations journaled since the last [`take_patches`](Self::take_patches)
    pub fn mutation_count(&self) -> usize {
        self.journal.len()
    }

    fn render_blocks(&self, body: NodeKey) -> Vec<RenderedBlock> {
        let Ok(body) = self.get(body) else {
            return Vec::new();
        };

        body.children
            .iter()
            .filter_map(|key| {
                let node = self.get(*key).ok()?;
                let texts = node
                    .children
                    .iter()
                    .filter_map(|child| self.text_of(*child))
                    .map(|(characters, _)| characters.to_string())
                    .collect();
                Some(RenderedBlock {
                    kind: node.name.clone(),
                    texts,
                })
            })
            .collect()
    }

    fn ids_by_key(&self) -> HashMap<NodeKey, &str> {
        self.index
            .iter()
            .map(|(id, key)| (*key, id.as_str()))
            .collect()
    }

    fn get(&self, key: NodeKey) -> TreeResult<&NodeData> {
        self.nodes
            .get(&key)
            .ok_or_else(|| TreeError::NodeNotFound(key.to_string()))
    }

    fn get_mut(&mut self, key: NodeKey) -> TreeResult<&mut NodeData> {
        self.nodes
            .get_mut(&key)
            .ok_or_else(|| TreeError::NodeNotFound(key.to_string()))
    }

    fn frame_children_mut(&mut self, key: NodeKey) -> TreeResult<&mut Vec<NodeKey>> {
        let node = self.get_mut(key)?;
        match node.kind {
            NodeKind::Frame { .. } => Ok(&mut node.children),
            NodeKind::Text { .. } => Err(TreeError::NotAFrame),
        }
    }

    /// Child-index path from the wrapper to `key`
    fn path_of(&self, key: NodeKey) -> TreeResult<Vec<u32>> {
        let mut path = Vec::new();
        let mut current = key;

        while let Some(parent) = self.get(current)?.parent {
            let position = self
                .get(parent)?
                .children
                .iter()
                .position(|child| *child == current)
                .ok_or_else(|| TreeError::NodeNotFound(current.to_string()))?;
            path.push(position as u32);
            current = parent;
        }

        path.reverse();
        Ok(path)
    }

    fn materialize(&mut self, fragment: VNode, parent: NodeKey) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        let (name, kind, children) = match fragment {
            VNode::Frame {
                name,
                item_spacing,
                children,
            } => (name, NodeKind::Frame { item_spacing }, children),
            VNode::Text {
                name,
                characters,
                opacity,
            } => (
                name,
                NodeKind::Text {
                    characters,
                    opacity,
                },
                Vec::new(),
            ),
        };

        self.nodes.insert(
            key,
            NodeData {
                name,
                kind,
                parent: Some(parent),
                children: Vec::new(),
            },
        );

        let child_keys: Vec<NodeKey> = children
            .into_iter()
            .map(|child| self.materialize(child, key))
            .collect();
        if let Some(node) = self.nodes.get_mut(&key) {
            node.children = child_keys;
        }

        key
    }

    fn destroy(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.remove(&key) {
            for child in node.children {
                self.destroy(child);
            }
        }
    }

    fn find_descendant(
        &self,
        key: NodeKey,
        predicate: &dyn Fn(&NodeData) -> bool,
    ) -> Option<NodeKey> {
        let node = self.get(key).ok()?;
        for child in &node.children {
            let child_node = self.get(*child).ok()?;
            if predicate(child_node) {
                return Some(*child);
            }
            if let Some(found) = self.find_descendant(*child, predicate) {
                return Some(found);
            }
        }
        None
    }

    fn detach_record(&mut self, record_id: &str) -> TreeResult<Vec<u32>> {
        let key = self
            .index
            .get(record_id)
            .copied()
            .ok_or_else(|| TreeError::RecordNotFound(record_id.to_string()))?;
        let path = self.path_of(key)?;

        let root = self.root;
        self.frame_children_mut(root)?.retain(|child| *child != key);
        self.destroy(key);
        self.index.remove(record_id);

        Ok(path)
    }
}

impl Default for VirtualTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree for VirtualTree {
    type NodeId = NodeKey;
    type Fragment = VNode;

    fn record_container(&self, record_id: &str) -> Option<NodeKey> {
        self.index.get(record_id).copied()
    }

    fn title_node(&self, container: NodeKey) -> Option<NodeKey> {
        self.find_descendant(container, &|node: &NodeData| {
            node.name == TITLE_NODE_NAME && matches!(node.kind, NodeKind::Text { .. })
        })
    }

    fn body_node(&self, container: NodeKey) -> Option<NodeKey> {
        let node = self.get(container).ok()?;
        node.children.iter().copied().find(|child| {
            self.get(*child).is_ok_and(|child| {
                child.name == BODY_NODE_NAME && matches!(child.kind, NodeKind::Frame { .. })
            })
        })
    }

    fn children(&self, parent: NodeKey) -> TreeResult<Vec<NodeKey>> {
        Ok(self.get(parent)?.children.clone())
    }

    fn insert_child(&mut self, parent: NodeKey, index: usize, fragment: VNode) -> TreeResult<NodeKey> {
        let len = self.frame_children_mut(parent)?.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }

        let path = self.path_of(parent)?;
        self.journal.push(TreePatch::InsertChild {
            path,
            index: index as u32,
            node: fragment.clone(),
        });

        let key = self.materialize(fragment, parent);
        self.frame_children_mut(parent)?.insert(index, key);
        trace!(parent = %parent, index, node = %key, "Inserted child");

        Ok(key)
    }

    fn remove_child(&mut self, parent: NodeKey, index: usize) -> TreeResult<()> {
        let len = self.frame_children_mut(parent)?.len();
        if index >= len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }

        let path = self.path_of(parent)?;
        self.journal.push(TreePatch::RemoveChild {
            path,
            index: index as u32,
        });

        let key = self.frame_children_mut(parent)?.remove(index);
        self.destroy(key);
        trace!(parent = %parent, index, node = %key, "Removed child");

        Ok(())
    }

    fn set_text(&mut self, node: NodeKey, characters: &str, opacity: f32) -> TreeResult<()> {
        if !matches!(self.get(node)?.kind, NodeKind::Text { .. }) {
            return Err(TreeError::NotText);
        }

        let path = self.path_of(node)?;
        self.journal.push(TreePatch::SetText {
            path,
            characters: characters.to_string(),
            opacity,
        });

        self.get_mut(node)?.kind = NodeKind::Text {
            characters: characters.to_string(),
            opacity,
        };

        Ok(())
    }

    fn append_record(&mut self, record_id: &str, fragment: VNode) -> TreeResult<NodeKey> {
        if self.index.contains_key(record_id) {
            return Err(TreeError::DuplicateRecord(record_id.to_string()));
        }

        self.journal.push(TreePatch::AppendRecord {
            record_id: record_id.to_string(),
            node: fragment.clone(),
        });

        let root = self.root;
        let key = self.materialize(fragment, root);
        self.frame_children_mut(root)?.push(key);
        self.index.insert(record_id.to_string(), key);
        trace!(record_id, node = %key, "Appended record container");

        Ok(key)
    }

    fn remove_record(&mut self, record_id: &str) -> TreeResult<()> {
        let path = self.detach_record(record_id)?;
        self.journal.push(TreePatch::RemoveRecord {
            record_id: record_id.to_string(),
            path,
        });
        trace!(record_id, "Removed record container");

        Ok(())
    }

    fn rekey_record(&mut self, from: &str, to: &str, name: &str) -> TreeResult<NodeKey> {
        if self.index.contains_key(to) {
            return Err(TreeError::DuplicateRecord(to.to_string()));
        }
        let key = self
            .index
            .remove(from)
            .ok_or_else(|| TreeError::RecordNotFound(from.to_string()))?;

        self.index.insert(to.to_string(), key);
        self.get_mut(key)?.name = name.to_string();
        self.journal.push(TreePatch::RekeyRecord {
            from: from.to_string(),
            to: to.to_string(),
            name: name.to_string(),
        });
        trace!(from, to, node = %key, "Rekeyed record container");

        Ok(key)
    }

    fn clear_records(&mut self) -> TreeResult<()> {
        let root = self.root;
        let containers = std::mem::take(self.frame_children_mut(root)?);
        for key in containers {
            self.destroy(key);
        }
        self.index.clear();
        self.journal.push(TreePatch::ClearRecords);

        Ok(())
    }
}
