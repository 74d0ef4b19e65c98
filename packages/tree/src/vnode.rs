use serde::{Deserialize, Serialize};

/// Name of the text node holding a record's title
pub const TITLE_NODE_NAME: &str = "Title";

/// Name of the frame holding a record's content blocks
pub const BODY_NODE_NAME: &str = "Body";

/// Detached visual node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// Container laid out as a vertical stack
    Frame {
        name: String,
        #[serde(default)]
        item_spacing: f32,
        #[serde(default)]
        children: Vec<VNode>,
    },

    Text {
        name: String,
        characters: String,
        opacity: f32,
    },
}

impl VNode {
    pub fn frame(name: impl Into<String>) -> Self {
        VNode::Frame {
            name: name.into(),
            item_spacing: 0.0,
            children: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>, characters: impl Into<String>) -> Self {
        VNode::Text {
            name: name.into(),
            characters: characters.into(),
            opacity: 1.0,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            VNode::Frame { name, .. } | VNode::Text { name, .. } => name,
        }
    }

    pub fn with_opacity(mut self, value: f32) -> Self {
        if let VNode::Text {
            ref mut opacity, ..
        } = self
        {
            *opacity = value;
        }
        self
    }

    pub fn with_item_spacing(mut self, value: f32) -> Self {
        if let VNode::Frame {
            ref mut item_spacing,
            ..
        } = self
        {
            *item_spacing = value;
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Frame {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Frame {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }
}
