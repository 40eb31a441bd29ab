//! Depth-first traversal over a built stream.
//!
//! A [`DfsCursor`] walks tag records in place: no node graph is ever
//! materialized, and a full traversal performs no per-step allocation beyond
//! the cursor's own depth stack. The cursor keeps one tag per depth level on
//! the path from its reset point to the current node; ascent across several
//! exhausted levels is detected by sibling-position equality with the parent
//! rather than by counting children.
//!
//! Cross-tree jumps are an explicit cursor state: a tag whose jump index is
//! set splices another stream's traversal in as if it were a subtree, driven
//! through an externally supplied [`TreeLinks`] table.

use crate::store::TreeStore;
use crate::stream::{StreamObject, TreeStream};
use crate::tag::{Tag, UNSET};

/// Traversal mode: walking the primary tree, or delegated to a jump-linked
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Local,
    Jumped(u16),
}

/// Stateful depth-first cursor over one stream's tag records.
#[derive(Debug, Clone)]
pub struct DfsCursor {
    stack: Vec<Tag>,
    index: usize,
    link: Link,
}

impl DfsCursor {
    /// Cursor positioned at the stream's root tag.
    #[must_use]
    pub fn new<O: StreamObject>(tree: &TreeStream<O>) -> Self {
        Self { stack: vec![tree.root()], index: 0, link: Link::Local }
    }

    /// Restore the cursor to depth 0 at the stream's root, clearing any
    /// active jump state.
    pub fn reset<O: StreamObject>(&mut self, tree: &TreeStream<O>) {
        self.reset_at(tree.root());
    }

    /// Restore the cursor to depth 0 at `tag`, clearing any active jump
    /// state.
    pub fn reset_at(&mut self, tag: Tag) {
        self.stack.clear();
        self.stack.push(tag);
        self.index = 0;
        self.link = Link::Local;
    }

    /// Current depth below the reset point.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.index
    }

    /// Whether traversal is currently delegated to a jump-linked stream.
    #[inline]
    #[must_use]
    pub fn is_linked(&self) -> bool {
        matches!(self.link, Link::Jumped(_))
    }

    /// Index of the active jump link, if any. While this is `Some`, the
    /// current tag lives in the linked stream and is addressed through
    /// [`TreeLinks::current`].
    #[inline]
    #[must_use]
    pub fn link_index(&self) -> Option<u16> {
        match self.link {
            Link::Local => None,
            Link::Jumped(index) => Some(index),
        }
    }

    /// The current tag in the primary tree.
    #[must_use]
    pub fn current(&self) -> Tag {
        assert!(!self.is_linked(), "current tag is in a jump-linked stream");
        self.stack[self.index]
    }

    /// The current tag's parent.
    #[must_use]
    pub fn parent(&self) -> Tag {
        assert!(self.index > 0, "cursor at its reset point has no parent");
        self.stack[self.index - 1]
    }

    /// Name of the current tag, empty for unnamed nodes.
    #[must_use]
    pub fn current_name<'t, O: StreamObject>(&self, tree: &'t TreeStream<O>) -> &'t str {
        tree.name_of(self.current())
    }

    /// Companion-object slot for the current tag, materializing it on first
    /// access.
    pub fn current_object<O: StreamObject>(&self, tree: &mut TreeStream<O>) -> u16 {
        tree.get_object(self.current())
    }

    /// Companion-object slot for the current tag's parent.
    pub fn parent_object<O: StreamObject>(&self, tree: &mut TreeStream<O>) -> u16 {
        tree.get_object(self.parent())
    }

    fn set_slot(&mut self, index: usize, tag: Tag) {
        if index == self.stack.len() {
            self.stack.push(tag);
        } else {
            self.stack[index] = tag;
        }
    }

    /// Finish the current subtree: ascend while the current tag is the last
    /// child at its level, then advance to the next sibling. Returns `false`
    /// when the reset point itself is exhausted.
    fn finish_subtree(&mut self, store: &TreeStore) -> bool {
        while self.index > 0
            && self.stack[self.index].sibling_position() == self.stack[self.index - 1].sibling_position()
        {
            self.index -= 1;
        }
        if self.index == 0 {
            return false;
        }
        let next = Tag::read(store, self.stack[self.index].sibling_position());
        self.stack[self.index] = next;
        true
    }

    /// Advance one step of depth-first order within the primary tree.
    ///
    /// With `skip_subtree` the current node's descendants are passed over.
    /// Jump-bearing tags are traversed as ordinary local subtrees; use
    /// [`move_next_linked`](Self::move_next_linked) to follow jumps.
    /// Returns `false` once the subtree below the reset point is exhausted.
    pub fn move_next<O: StreamObject>(&mut self, tree: &TreeStream<O>, skip_subtree: bool) -> bool {
        let store = tree.store();
        let current = self.stack[self.index];

        if skip_subtree {
            self.finish_subtree(store)
        } else if current.is_leaf() {
            if self.index == 0 {
                return false;
            }
            if current.sibling_position() < self.stack[self.index - 1].sibling_position() {
                self.stack[self.index] = Tag::read(store, current.sibling_position());
                true
            } else {
                self.finish_subtree(store)
            }
        } else {
            let first = Tag::read(store, current.first_child_position());
            self.index += 1;
            self.set_slot(self.index, first);
            true
        }
    }

    /// Advance one step, following jump links through `links`.
    ///
    /// When the current tag carries a jump index, the linked stream's cursor
    /// is reset and traversal is delegated to it until it is exhausted; the
    /// jump tag is then finished like any completed subtree. A jump index
    /// with no matching link table entry is an invariant breach and aborts.
    pub fn move_next_linked<O: StreamObject>(
        &mut self,
        tree: &TreeStream<O>,
        links: &mut TreeLinks<'_, O>,
        skip_subtree: bool,
    ) -> bool {
        let store = tree.store();

        let jumped = match self.link {
            Link::Jumped(index) => Some(index),
            Link::Local => {
                let jump = self.stack[self.index].jump_index(store);
                if jump == UNSET {
                    None
                } else {
                    assert!(
                        (jump as usize) < links.len(),
                        "jump index {jump} out of range ({} links)",
                        links.len()
                    );
                    links.reset(jump);
                    self.link = Link::Jumped(jump);
                    let current = self.stack[self.index];
                    self.index += 1;
                    self.set_slot(self.index, current);
                    Some(jump)
                }
            }
        };

        if let Some(index) = jumped {
            if links.advance(index, skip_subtree) {
                return true;
            }
            self.link = Link::Local;
            self.index -= 1;
            return self.finish_subtree(store);
        }

        self.move_next(tree, skip_subtree)
    }

    /// Reset to `start` and walk toward the named `path`, descending into a
    /// node only when its name matches the next unmatched segment at
    /// direct-child depth; everything else is skipped subtree-wise. Returns
    /// `true` with the cursor on the final segment's tag, or `false` when
    /// the path does not exist below `start`.
    pub fn move_to<O: StreamObject>(
        &mut self,
        tree: &TreeStream<O>,
        start: Tag,
        path: &[&str],
    ) -> bool {
        self.reset_at(start);

        let mut matched = 0;
        let mut skip_subtree = false;
        while matched < path.len() && self.move_next(tree, skip_subtree) {
            if self.index <= matched {
                // Ascended out of the last matched node; its children are
                // exhausted and the remaining segments cannot match.
                return false;
            }
            if self.index == matched + 1 && self.current_name(tree) == path[matched] {
                matched += 1;
                skip_subtree = false;
            } else {
                skip_subtree = true;
            }
        }
        matched == path.len()
    }
}

/// Externally supplied table of jump-link targets, indexed by a tag's jump
/// index.
///
/// Each entry pairs a linked stream with its own cursor; [`DfsCursor`]
/// delegates to the entry while a jump is active.
#[derive(Debug, Default)]
pub struct TreeLinks<'t, O: StreamObject> {
    targets: Vec<LinkTarget<'t, O>>,
}

#[derive(Debug)]
struct LinkTarget<'t, O: StreamObject> {
    tree: &'t TreeStream<O>,
    cursor: DfsCursor,
}

impl<'t, O: StreamObject> TreeLinks<'t, O> {
    /// Empty link table.
    #[must_use]
    pub fn new() -> Self {
        Self { targets: Vec::new() }
    }

    /// Number of link targets.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the table holds no targets.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Register `tree` as a jump target, returning the index to store in a
    /// tag's jump field.
    pub fn push(&mut self, tree: &'t TreeStream<O>) -> u16 {
        assert!(
            self.targets.len() < UNSET as usize,
            "link table capacity exceeded ({} targets)",
            self.targets.len()
        );
        self.targets.push(LinkTarget { tree, cursor: DfsCursor::new(tree) });
        (self.targets.len() - 1) as u16
    }

    /// The linked stream behind `index`.
    #[must_use]
    pub fn tree(&self, index: u16) -> &'t TreeStream<O> {
        self.target(index).tree
    }

    /// Current tag of the linked cursor behind `index`.
    #[must_use]
    pub fn current(&self, index: u16) -> Tag {
        self.target(index).cursor.current()
    }

    /// Name of the linked cursor's current tag.
    #[must_use]
    pub fn current_name(&self, index: u16) -> &'t str {
        let target = self.target(index);
        target.tree.name_of(target.cursor.current())
    }

    fn target(&self, index: u16) -> &LinkTarget<'t, O> {
        assert!(
            (index as usize) < self.targets.len(),
            "link index {index} out of range ({} targets)",
            self.targets.len()
        );
        &self.targets[index as usize]
    }

    fn reset(&mut self, index: u16) {
        let target = &mut self.targets[index as usize];
        target.cursor.reset(target.tree);
    }

    fn advance(&mut self, index: u16, skip_subtree: bool) -> bool {
        let target = &mut self.targets[index as usize];
        target.cursor.move_next(target.tree, skip_subtree)
    }
}

/// Iterator over one level of a tag's direct children.
#[derive(Debug, Clone)]
pub struct Siblings<'t> {
    store: &'t TreeStore,
    next_position: usize,
    end_position: usize,
}

impl<'t> Siblings<'t> {
    /// Iterate the direct children of `parent`.
    #[must_use]
    pub fn new(store: &'t TreeStore, parent: Tag) -> Self {
        Self {
            store,
            next_position: parent.first_child_position(),
            end_position: parent.sibling_position(),
        }
    }
}

impl Iterator for Siblings<'_> {
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        if self.next_position >= self.end_position {
            return None;
        }
        let tag = Tag::read(self.store, self.next_position);
        self.next_position = tag.sibling_position();
        Some(tag)
    }
}
