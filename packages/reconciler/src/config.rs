use serde::{Deserialize, Serialize};

/// Rendering rules applied during reconciliation and node construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileConfig {
    /// Label shown in place of an empty title
    #[serde(default = "default_title_placeholder")]
    pub title_placeholder: String,

    #[serde(default = "default_empty_title_opacity")]
    pub empty_title_opacity: f32,

    #[serde(default = "default_filled_title_opacity")]
    pub filled_title_opacity: f32,

    /// Text of the single inline node substituted for empty block content
    #[serde(default = "default_block_text")]
    pub default_block_text: String,

    /// Above this many live blocks, block nodes use compact spacing
    #[serde(default = "default_compact_block_threshold")]
    pub compact_block_threshold: usize,
}

fn default_title_placeholder() -> String {
    "Title".to_string()
}

fn default_empty_title_opacity() -> f32 {
    0.25
}

fn default_filled_title_opacity() -> f32 {
    1.0
}

fn default_block_text() -> String {
    " ".to_string()
}

fn default_compact_block_threshold() -> usize {
    8
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            title_placeholder: default_title_placeholder(),
            empty_title_opacity: default_empty_title_opacity(),
            filled_title_opacity: default_filled_title_opacity(),
            default_block_text: default_block_text(),
            compact_block_threshold: default_compact_block_threshold(),
        }
    }
}

impl ReconcileConfig {
    /// Displayed characters and opacity for a title value
    pub fn title_presentation<'a>(&'a self, title: &'a str) -> (&'a str, f32) {
        if title.is_empty() {
            (self.title_placeholder.as_str(), self.empty_title_opacity)
        } else {
            (title, self.filled_title_opacity)
        }
    }
}
