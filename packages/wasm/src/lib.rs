use wasm_bindgen::prelude::*;
use annotsync_diff::{compare, DiffOptions};
use annotsync_model::{AnnotationRecord, SnapshotMessage};
use annotsync_reconciler::{FrameBuilder, ReconcileConfig, ReconcileOutcome, SyncSession};
use annotsync_tree::{TreePatch, VirtualTree};
use serde::Serialize;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// What the plugin host replays after a pass
#[derive(Serialize)]
struct PassOutput {
    outcome: ReconcileOutcome,
    patches: Vec<TreePatch>,
}

fn parse<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Diff two record snapshots and return the structural diff as JSON
#[wasm_bindgen(js_name = computeDiff)]
pub fn compute_diff_js(old_records: &str, new_records: &str, aligned: bool) -> Result<String, JsValue> {
    let old: Vec<AnnotationRecord> = parse(old_records, "old snapshot")?;
    let new: Vec<AnnotationRecord> = parse(new_records, "new snapshot")?;

    let options = if aligned {
        DiffOptions::aligned()
    } else {
        DiffOptions::default()
    };

    to_json(&compare(&old, &new, &options))
}

/// Long-lived sync session backing one annotation panel
#[wasm_bindgen]
pub struct WasmSession {
    inner: SyncSession<VirtualTree, FrameBuilder>,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session; `config` is an optional ReconcileConfig JSON object
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<WasmSession, JsValue> {
        let config = match config {
            Some(json) => parse::<ReconcileConfig>(&json, "config")?,
            None => ReconcileConfig::default(),
        };

        Ok(WasmSession {
            inner: SyncSession::in_memory(config),
        })
    }

    /// Build the tree from scratch; returns the patches that do so
    #[wasm_bindgen(js_name = initialize)]
    pub fn initialize(&mut self, records: &str) -> Result<String, JsValue> {
        let records: Vec<AnnotationRecord> = parse(records, "snapshot")?;

        self.inner
            .rebuild(&records)
            .map_err(|e| JsValue::from_str(&format!("Rebuild error: {}", e)))?;

        to_json(&self.inner.tree_mut().take_patches())
    }

    /// Apply an `{ oldRecords, newRecords }` message; returns `{ outcome, patches }`
    #[wasm_bindgen(js_name = apply)]
    pub fn apply(&mut self, message: &str) -> Result<String, JsValue> {
        let message: SnapshotMessage = parse(message, "message")?;

        let outcome = self
            .inner
            .apply_or_rebuild(&message)
            .map_err(|e| JsValue::from_str(&format!("Reconcile error: {}", e)))?;
        let patches = self.inner.tree_mut().take_patches();

        to_json(&PassOutput { outcome, patches })
    }

    /// Current records as rendered in the tree
    #[wasm_bindgen(js_name = records)]
    pub fn records(&self) -> Result<String, JsValue> {
        to_json(&self.inner.tree().records())
    }
}
