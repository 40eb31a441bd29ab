//! Tree stream facade.
//!
//! [`TreeStream`] owns a built buffer, its name table, and the companion
//! object cache, and exposes the query surface: path lookup, child
//! enumeration, path reconstruction from raw offsets, and lazy
//! companion-object materialization. One facade instance exclusively owns
//! its buffer; concurrent use requires external synchronization.

use std::io;
use std::path::Path;

use crate::build::{Built, build};
use crate::dfs::{DfsCursor, Siblings};
use crate::error::{Error, Result};
use crate::lookup::NameTable;
use crate::node::{Streamable, TreeNode};
use crate::store::{ALIGNMENT, TreeStore};
use crate::tag::{TAG_SIZE, Tag, UNSET};

/// A lazily materialized object associated 1:1 with a tag's position.
///
/// The cache slot is recorded in the tag's `ObjectIndex` field for O(1)
/// re-lookup; slots are session-only state, never meaningful across
/// save/reload.
pub trait StreamObject {
    /// Materialize the object for the tag at `position`.
    fn create(position: usize) -> Self;

    /// The tag position this object was created for.
    fn position(&self) -> usize;
}

/// Minimal [`StreamObject`]: remembers its tag position and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicObject {
    position: usize,
}

impl StreamObject for BasicObject {
    fn create(position: usize) -> Self {
        Self { position }
    }

    fn position(&self) -> usize {
        self.position
    }
}

/// Owner of one built stream: buffer, name table, root tag, and companion
/// object cache.
#[derive(Debug)]
pub struct TreeStream<O: StreamObject = BasicObject> {
    store: TreeStore,
    names: NameTable,
    tree_start: usize,
    objects: Vec<O>,
}

impl<O: StreamObject> TreeStream<O> {
    /// Take ownership of a builder's output.
    #[must_use]
    pub fn from_build<N: TreeNode>(built: Built<'_, N>) -> Self {
        Self {
            store: TreeStore::new(built.buffer),
            names: built.names,
            tree_start: built.tree_start,
            objects: Vec::new(),
        }
    }

    /// Build `root` and wrap the result in one step.
    #[must_use]
    pub fn from_node<N: TreeNode>(root: &N, meta: Option<&dyn Streamable>) -> Self {
        Self::from_build(build(root, meta))
    }

    /// Reconstruct a stream from raw bytes, e.g. loaded from disk.
    ///
    /// `meta` (when given) is reconstructed from the stream head; the name
    /// table and tree offset follow the aligned layout the builder wrote.
    ///
    /// # Errors
    ///
    /// Returns an error if the header, name table, or root tag run past the
    /// end of `bytes`.
    pub fn from_bytes(bytes: Vec<u8>, meta: Option<&mut dyn Streamable>) -> Result<Self> {
        let mut pos = 0;
        if let Some(meta) = meta {
            pos = meta.read(&bytes)?;
            pos = pos.next_multiple_of(ALIGNMENT);
        }

        let (names, used) = NameTable::read_from(bytes.get(pos..).ok_or(Error::TruncatedStream {
            needed: pos,
            len: bytes.len(),
        })?)?;
        pos += used;
        pos = pos.next_multiple_of(ALIGNMENT);

        let tree_start = pos;
        if bytes.len() < tree_start + TAG_SIZE {
            return Err(Error::TruncatedStream { needed: tree_start + TAG_SIZE, len: bytes.len() });
        }

        let store = TreeStore::new(bytes);
        let root = Tag::read(&store, tree_start);
        if root.sibling_position() > store.len() {
            return Err(Error::TruncatedStream {
                needed: root.sibling_position(),
                len: store.len(),
            });
        }

        Ok(Self { store, names, tree_start, objects: Vec::new() })
    }

    /// The underlying buffer store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    /// Mutable access to the underlying store, for in-place field writes.
    #[inline]
    pub fn store_mut(&mut self) -> &mut TreeStore {
        &mut self.store
    }

    /// The interned name table.
    #[inline]
    #[must_use]
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// Absolute offset of the root tag within the buffer.
    #[inline]
    #[must_use]
    pub fn tree_start(&self) -> usize {
        self.tree_start
    }

    /// The root tag.
    #[must_use]
    pub fn root(&self) -> Tag {
        Tag::read(&self.store, self.tree_start)
    }

    /// Place a tag at an absolute buffer position.
    #[must_use]
    pub fn tag_at(&self, position: usize) -> Tag {
        Tag::read(&self.store, position)
    }

    /// Resolve a tag's name, empty for unnamed tags.
    #[must_use]
    pub fn name_of(&self, tag: Tag) -> &str {
        let index = tag.name_index(&self.store);
        if index == UNSET { "" } else { self.names.get(index) }
    }

    /// Companion-object slot for `tag`, materializing and caching the object
    /// on first access.
    ///
    /// The slot is written into the tag's `ObjectIndex` field so later
    /// accesses are a single field read.
    pub fn get_object(&mut self, tag: Tag) -> u16 {
        let index = tag.object_index(&self.store);
        if index == UNSET {
            assert!(
                self.objects.iter().all(|o| o.position() != tag.position()),
                "companion object already exists at position {}",
                tag.position()
            );
            let slot = self.objects.len();
            assert!(slot < UNSET as usize, "companion cache capacity exceeded");
            self.objects.push(O::create(tag.position()));
            tag.set_object_index(&mut self.store, slot as u16);
            return slot as u16;
        }

        assert!(
            (index as usize) < self.objects.len(),
            "object index {index} out of range ({} cached)",
            self.objects.len()
        );
        index
    }

    /// The cached object in `slot`.
    #[must_use]
    pub fn object(&self, slot: u16) -> &O {
        &self.objects[slot as usize]
    }

    /// Mutable access to the cached object in `slot`.
    pub fn object_mut(&mut self, slot: u16) -> &mut O {
        &mut self.objects[slot as usize]
    }

    /// Number of materialized companion objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Find the tag at the named path below `start`.
    #[must_use]
    pub fn find_tag(&self, start: Tag, path: &[&str]) -> Option<Tag> {
        let mut cursor = DfsCursor::new(self);
        if cursor.move_to(self, start, path) { Some(cursor.current()) } else { None }
    }

    /// Find the companion object at the named path below `start`.
    pub fn find_object(&mut self, start: Tag, path: &[&str]) -> Option<u16> {
        let tag = self.find_tag(start, path)?;
        Some(self.get_object(tag))
    }

    /// Depth-first scan below `start` for the first tag with `name`,
    /// returning its companion object.
    pub fn find_first_object(&mut self, start: Tag, name: &str) -> Option<u16> {
        let mut cursor = DfsCursor::new(self);
        cursor.reset_at(start);
        while cursor.move_next(self, false) {
            if cursor.current_name(self) == name {
                let tag = cursor.current();
                return Some(self.get_object(tag));
            }
        }
        None
    }

    /// Iterate the direct children of `tag`.
    #[must_use]
    pub fn children(&self, tag: Tag) -> Siblings<'_> {
        Siblings::new(&self.store, tag)
    }

    /// Companion objects of all direct children of `tag`, in child order.
    pub fn child_objects(&mut self, tag: Tag) -> Vec<u16> {
        let tags: Vec<Tag> = self.children(tag).collect();
        tags.into_iter().map(|child| self.get_object(child)).collect()
    }

    /// Reconstruct the slash-joined name path from the root to `target`
    /// purely from byte offsets.
    ///
    /// Returns `None` when `target` is not reachable as a descendant of the
    /// root, or when it is reachable but unnamed. The root must be named.
    #[must_use]
    pub fn rebuild_path(&self, target: Tag) -> Option<String> {
        let entry_position = target.entry_position();

        let mut parent = self.root();
        assert!(parent.name_index(&self.store) != UNSET, "root tag must be named");
        let mut path = self.name_of(parent).to_string();

        if parent.entry_position() == entry_position {
            return Some(path);
        }
        if parent.is_leaf() {
            return None;
        }

        let mut tag = Tag::read(&self.store, parent.first_child_position());
        while tag.position() < entry_position {
            if tag.entry_position() == entry_position {
                if tag.name_index(&self.store) != UNSET {
                    path.push('/');
                    path.push_str(self.name_of(tag));
                    return Some(path);
                }
                return None;
            } else if tag.first_child_position() < entry_position
                && entry_position < tag.sibling_position()
            {
                // Target lies strictly inside this subtree.
                if tag.name_index(&self.store) != UNSET {
                    path.push('/');
                    path.push_str(self.name_of(tag));
                }
                assert!(!tag.is_leaf());
                parent = tag;
                tag = Tag::read(&self.store, tag.first_child_position());
            } else {
                if tag.sibling_position() == parent.sibling_position() {
                    return None;
                }
                tag = Tag::read(&self.store, tag.sibling_position());
            }
        }
        None
    }

    /// Point `tag` at a link-table entry, in place.
    pub fn set_jump(&mut self, tag: Tag, index: u16) {
        tag.set_jump_index(&mut self.store, index);
    }

    /// The raw stream bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.store.as_bytes()
    }

    /// Dump the raw stream bytes to a file. Identical bytes round-trip
    /// through [`TreeStream::from_bytes`].
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the underlying write.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.store.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{RawMeta, SourceNode};

    fn sample_stream() -> TreeStream {
        let tree = SourceNode::named("r")
            .with_child(SourceNode::named("x"))
            .with_child(SourceNode::named("y").with_child(SourceNode::named("z")));
        TreeStream::from_node(&tree, None)
    }

    #[test]
    fn test_find_tag() {
        let tree = sample_stream();
        let z = tree.find_tag(tree.root(), &["y", "z"]).unwrap();
        assert_eq!(tree.name_of(z), "z");
        assert!(tree.find_tag(tree.root(), &["y", "q"]).is_none());

        // Search can start below the root.
        let y = tree.find_tag(tree.root(), &["y"]).unwrap();
        assert_eq!(tree.find_tag(y, &["z"]).unwrap(), z);
    }

    #[test]
    fn test_rebuild_path() {
        let tree = sample_stream();
        let z = tree.find_tag(tree.root(), &["y", "z"]).unwrap();
        assert_eq!(tree.rebuild_path(z).as_deref(), Some("r/y/z"));
        assert_eq!(tree.rebuild_path(tree.root()).as_deref(), Some("r"));

        let x = tree.find_tag(tree.root(), &["x"]).unwrap();
        assert_eq!(tree.rebuild_path(x).as_deref(), Some("r/x"));
    }

    #[test]
    fn test_rebuild_path_unnamed_target() {
        let tree = SourceNode::named("r").with_child(SourceNode::unnamed());
        let stream: TreeStream = TreeStream::from_node(&tree, None);
        let child = stream.tag_at(stream.root().first_child_position());
        assert_eq!(stream.rebuild_path(child), None);
    }

    #[test]
    fn test_path_idempotence() {
        let tree = sample_stream();
        for path in [vec!["x"], vec!["y"], vec!["y", "z"]] {
            let tag = tree.find_tag(tree.root(), &path).unwrap();
            let rebuilt = tree.rebuild_path(tag).unwrap();
            let expected = format!("r/{}", path.join("/"));
            assert_eq!(rebuilt, expected);
        }
    }

    #[test]
    fn test_object_memoization() {
        let mut tree = sample_stream();
        let y = tree.find_tag(tree.root(), &["y"]).unwrap();
        let z = tree.find_tag(tree.root(), &["y", "z"]).unwrap();

        let slot_y = tree.get_object(y);
        let slot_z = tree.get_object(z);
        assert_ne!(slot_y, slot_z);
        assert_eq!(tree.object_count(), 2);

        // Repeat access reuses the cached slot.
        assert_eq!(tree.get_object(y), slot_y);
        assert_eq!(tree.object_count(), 2);
        assert_eq!(tree.object(slot_y).position(), y.position());
    }

    #[test]
    fn test_find_object_and_first() {
        let mut tree = sample_stream();
        let slot = tree.find_object(tree.root(), &["y", "z"]).unwrap();
        let z = tree.find_tag(tree.root(), &["y", "z"]).unwrap();
        assert_eq!(tree.object(slot).position(), z.position());

        let first = tree.find_first_object(tree.root(), "z").unwrap();
        assert_eq!(first, slot);

        assert!(tree.find_object(tree.root(), &["missing"]).is_none());
        assert!(tree.find_first_object(tree.root(), "missing").is_none());
    }

    #[test]
    fn test_child_objects() {
        let mut tree = sample_stream();
        let root = tree.root();
        let slots = tree.child_objects(root);
        assert_eq!(slots.len(), 2);
        let x = tree.find_tag(tree.root(), &["x"]).unwrap();
        assert_eq!(tree.object(slots[0]).position(), x.position());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let source = SourceNode::named("r")
            .with_child(SourceNode::named("x").with_body(vec![1, 2, 3]))
            .with_child(SourceNode::named("y"));
        let meta = RawMeta(vec![7; 6]);
        let stream: TreeStream = TreeStream::from_node(&source, Some(&meta));

        let mut parsed_meta = RawMeta(vec![0; 6]);
        let reloaded: TreeStream =
            TreeStream::from_bytes(stream.as_bytes().to_vec(), Some(&mut parsed_meta)).unwrap();

        assert_eq!(parsed_meta, meta);
        assert_eq!(reloaded.tree_start(), stream.tree_start());
        assert_eq!(reloaded.as_bytes(), stream.as_bytes());
        let x = reloaded.find_tag(reloaded.root(), &["x"]).unwrap();
        assert_eq!(x.entry_size(reloaded.store()), 3);
    }

    #[test]
    fn test_from_bytes_truncated() {
        let result = TreeStream::<BasicObject>::from_bytes(vec![0, 0, 0], None);
        assert!(matches!(result, Err(Error::TruncatedStream { .. })));

        // Valid name table but no room for a root tag.
        let bytes = vec![0, 0, 0, 0];
        let result = TreeStream::<BasicObject>::from_bytes(bytes, None);
        assert!(matches!(result, Err(Error::TruncatedStream { .. })));
    }
}
