//! Tree-to-buffer builder.
//!
//! Encodes a [`TreeNode`] graph into a single flat buffer:
//! `[meta blob][pad to 4][name table][pad to 4][root tag subtree]`, where a
//! subtree is tag + body + children, contiguous and in child order. Built
//! once at construction; traversal never allocates afterwards.
//!
//! Capacity limits are format limits and abort the build when exceeded:
//! fewer than 65535 names, bodies under 65535 bytes, subtree sizes within
//! the i32 domain.

use std::borrow::Cow;

use crate::lookup::NameTable;
use crate::node::{Streamable, TreeNode};
use crate::store::{ALIGNMENT, pad_to};
use crate::tag::{TAG_SIZE, UNSET, encode_tag};

/// Output of [`build`]: the assembled buffer plus everything needed to
/// address it.
#[derive(Debug)]
pub struct Built<'a, N: TreeNode> {
    /// The complete stream buffer.
    pub buffer: Vec<u8>,
    /// Names interned during the build, in first-insertion order.
    pub names: NameTable,
    /// Absolute offset of the root tag within `buffer`.
    pub tree_start: usize,
    /// Every source node paired with the absolute offset of its tag,
    /// in post-order.
    pub positions: Vec<(&'a N, usize)>,
}

/// Encode `root` (and an optional meta blob) into a flat stream buffer.
pub fn build<'a, N: TreeNode>(root: &'a N, meta: Option<&dyn Streamable>) -> Built<'a, N> {
    let mut names = NameTable::new();
    let mut positions = Vec::new();
    let mut tree = Vec::new();
    build_recursive(&mut tree, root, &mut names, &mut positions);

    let mut buffer = Vec::new();
    if let Some(meta) = meta {
        meta.write(&mut buffer);
        pad_to(&mut buffer, ALIGNMENT);
    }
    names.write_into(&mut buffer);
    pad_to(&mut buffer, ALIGNMENT);

    let tree_start = buffer.len();
    buffer.extend_from_slice(&tree);

    // Recursion recorded offsets relative to the tree bytes; the meta blob
    // and name table sizes are only known now.
    for entry in &mut positions {
        entry.1 += tree_start;
    }

    Built { buffer, names, tree_start, positions }
}

/// Encode one node and its subtree at the current end of `out`, returning
/// the node's `(entry_size, subtree_size)` pair for the parent's bookkeeping.
fn build_recursive<'a, N: TreeNode>(
    out: &mut Vec<u8>,
    node: &'a N,
    names: &mut NameTable,
    positions: &mut Vec<(&'a N, usize)>,
) -> (u16, i32) {
    let name_index = match node.name() {
        Some(name) if !name.is_empty() => names.intern(name),
        _ => UNSET,
    };

    // Children go into a scratch buffer first; their total size becomes this
    // node's subtree size.
    let mut scratch = Vec::new();
    let mut child_positions: Vec<(&'a N, usize)> = Vec::new();
    let mut subtree_size: u64 = 0;
    for child in node.children() {
        let (child_entry, child_subtree) =
            build_recursive(&mut scratch, child, names, &mut child_positions);
        subtree_size += child_entry as u64 + TAG_SIZE as u64 + child_subtree as u64;
    }
    assert!(
        subtree_size < i32::MAX as u64,
        "subtree of {subtree_size} bytes exceeds format capacity"
    );
    let subtree_size = subtree_size as i32;

    let body: Cow<'_, [u8]> = node.body();
    assert!(
        body.len() < UNSET as usize,
        "entry body of {} bytes exceeds format capacity",
        body.len()
    );
    let entry_size = body.len() as u16;

    let type_index = node.type_index();
    assert!(
        type_index < u8::MAX,
        "type index {type_index} exceeds format capacity"
    );

    let tag_position = out.len();
    out.extend_from_slice(&encode_tag(name_index, entry_size, subtree_size, type_index));
    out.extend_from_slice(&body);

    // Child offsets were relative to the scratch buffer; they land at the
    // current write position.
    let child_base = out.len();
    for entry in &mut child_positions {
        entry.1 += child_base;
    }
    out.extend_from_slice(&scratch);

    positions.append(&mut child_positions);
    positions.push((node, tag_position));

    (entry_size, subtree_size)
}
