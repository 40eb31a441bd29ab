//! Collaborator traits at the build seam, plus an owned source-tree type.
//!
//! [`TreeNode`] is the shape the builder consumes; anything with ordered
//! children, an optional name, a type index, and a serializable body can be
//! encoded. [`SourceNode`] is the crate's owned implementation, used by the
//! JSON authoring layer and by tests. [`Streamable`] is the opaque meta blob
//! written ahead of the name table.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// A node of an in-memory tree that can be built into a stream.
pub trait TreeNode: Sized {
    /// Ordered child nodes.
    fn children(&self) -> &[Self];

    /// Node name, `None` for unnamed nodes.
    fn name(&self) -> Option<&str>;

    /// Index into the caller's type/factory catalog.
    fn type_index(&self) -> u8;

    /// The node's own serialized body.
    fn body(&self) -> Cow<'_, [u8]>;
}

/// Opaque fixed-size meta blob written at the head of a stream.
pub trait Streamable {
    /// Append the blob's wire form to `out`.
    fn write(&self, out: &mut Vec<u8>);

    /// Reconstruct the blob from the head of `bytes`, returning the number
    /// of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream head does not hold this blob.
    fn read(&mut self, bytes: &[u8]) -> Result<usize>;
}

/// A fixed-size opaque byte blob, the simplest [`Streamable`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawMeta(pub Vec<u8>);

impl Streamable for RawMeta {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }

    fn read(&mut self, bytes: &[u8]) -> Result<usize> {
        let needed = self.0.len();
        if bytes.len() < needed {
            return Err(Error::TruncatedStream { needed, len: bytes.len() });
        }
        self.0.copy_from_slice(&bytes[..needed]);
        Ok(needed)
    }
}

/// Owned tree node for authoring streams in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceNode {
    name: Option<String>,
    type_index: u8,
    body: Vec<u8>,
    children: Vec<SourceNode>,
}

impl SourceNode {
    /// Named node with no body and no children.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    /// Unnamed node with no body and no children.
    #[must_use]
    pub fn unnamed() -> Self {
        Self::default()
    }

    /// Set the type catalog index.
    #[must_use]
    pub fn with_type(mut self, type_index: u8) -> Self {
        self.type_index = type_index;
        self
    }

    /// Set the body bytes.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: SourceNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child in place.
    pub fn push_child(&mut self, child: SourceNode) {
        self.children.push(child);
    }
}

impl TreeNode for SourceNode {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn type_index(&self) -> u8 {
        self.type_index
    }

    fn body(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.body)
    }
}
