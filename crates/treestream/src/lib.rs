//! Flat tagged-tree serialization with zero-copy traversal.
//!
//! `treestream` encodes an in-memory node tree into a single flat byte
//! buffer and answers queries against that buffer directly: no node graph is
//! rebuilt on load, and traversal allocates nothing per step. It is built
//! for loading game/world-definition data where per-node heap allocation is
//! the enemy.
//!
//! Every node is a 16-byte navigation tag followed by the node's body and
//! then its children, contiguous in depth-first order:
//!
//! ```text
//! [meta blob][pad to 4][name table][pad to 4][tag|body|children...]
//! ```
//!
//! Because a tag records its body size and total subtree size, the positions
//! of its first child and next sibling are plain arithmetic, and a
//! [`DfsCursor`] can walk, skip subtrees, and follow cross-stream jump links
//! using offsets alone.
//!
//! # Example
//!
//! ```
//! use treestream::{SourceNode, TreeStream};
//!
//! let world = SourceNode::named("world")
//!     .with_child(SourceNode::named("terrain"))
//!     .with_child(SourceNode::named("actors").with_child(SourceNode::named("player")));
//!
//! let stream: TreeStream = TreeStream::from_node(&world, None);
//!
//! let player = stream.find_tag(stream.root(), &["actors", "player"]).unwrap();
//! assert_eq!(stream.rebuild_path(player).as_deref(), Some("world/actors/player"));
//! ```

pub mod build;
pub mod dfs;
pub mod entry;
pub mod error;
pub mod json;
pub mod lookup;
pub mod node;
pub mod store;
pub mod stream;
pub mod tag;

pub use build::{Built, build};
pub use dfs::{DfsCursor, Siblings, TreeLinks};
pub use entry::{Entry, Field, FieldKind, Schema};
pub use error::{Error, Result};
pub use json::{from_json, to_json};
pub use lookup::NameTable;
pub use node::{RawMeta, SourceNode, Streamable, TreeNode};
pub use store::{ALIGNMENT, TreeStore};
pub use stream::{BasicObject, StreamObject, TreeStream};
pub use tag::{TAG_SIZE, Tag, UNSET};
