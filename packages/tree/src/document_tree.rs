use crate::errors::TreeResult;
use std::fmt::Debug;

/// Query and mutation primitives reconciliation needs from a host tree
///
/// Record containers are reached through an id index kept by the tree, never
/// by scanning node names.
pub trait DocumentTree {
    /// Handle to a node that lives in the tree
    type NodeId: Copy + Eq + Debug;

    /// Detached node produced by a builder, inserted as a unit
    type Fragment;

    /// Container of the record with this id
    fn record_container(&self, record_id: &str) -> Option<Self::NodeId>;

    /// Text node showing the record's title
    fn title_node(&self, container: Self::NodeId) -> Option<Self::NodeId>;

    /// Frame whose children correspond to the record's content blocks
    fn body_node(&self, container: Self::NodeId) -> Option<Self::NodeId>;

    /// Ordered children of `parent`
    fn children(&self, parent: Self::NodeId) -> TreeResult<Vec<Self::NodeId>>;

    fn insert_child(
        &mut self,
        parent: Self::NodeId,
        index: usize,
        fragment: Self::Fragment,
    ) -> TreeResult<Self::NodeId>;

    /// Detaches and destroys the child at `index`
    fn remove_child(&mut self, parent: Self::NodeId, index: usize) -> TreeResult<()>;

    fn set_text(&mut self, node: Self::NodeId, characters: &str, opacity: f32) -> TreeResult<()>;

    /// Appends a record container to the wrapper and indexes it
    fn append_record(&mut self, record_id: &str, fragment: Self::Fragment)
        -> TreeResult<Self::NodeId>;

    /// Detaches a record container and drops it from the index
    fn remove_record(&mut self, record_id: &str) -> TreeResult<()>;

    /// Moves an existing container to a new id in the index and renames it
    fn rekey_record(&mut self, from: &str, to: &str, name: &str) -> TreeResult<Self::NodeId>;

    /// Removes every record container
    fn clear_records(&mut self) -> TreeResult<()>;
}
