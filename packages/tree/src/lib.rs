//! # Annotation Document Tree
//!
//! The mutable visual tree that reconciliation edits in place.
//!
//! ## Layout
//!
//! ```text
//! wrapper
//! ├── record container   (indexed by record id)
//! │   ├── Title          (text node)
//! │   └── Body           (frame, children 1:1 with content blocks)
//! │       ├── block node
//! │       └── ...
//! └── ...
//! ```
//!
//! [`DocumentTree`] is the seam to a host tree. [`VirtualTree`] is the
//! in-memory implementation; it journals every mutation as a [`TreePatch`]
//! so a host can replay them.

mod document_tree;
mod errors;
mod vnode;
mod virtual_tree;

pub use document_tree::DocumentTree;
pub use errors::{TreeError, TreeResult};
pub use vnode::{VNode, BODY_NODE_NAME, TITLE_NODE_NAME};
pub use virtual_tree::{NodeKey, RenderedBlock, RenderedRecord, TreePatch, VirtualTree};
