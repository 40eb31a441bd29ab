//! Deduplicated node-name table.
//!
//! Names are interned during build and referenced from tags by index. Wire
//! form: `i32 count` followed by `count` NUL-terminated UTF-8 strings (no
//! per-string length prefix).

use crate::error::{Error, Result};
use crate::tag::UNSET;

/// Ordered, deduplicated list of node names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    /// Empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned names.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table holds no names.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of `name` if already interned.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.names.iter().position(|n| n == name).map(|i| i as u16)
    }

    /// Intern `name`, returning its index. Duplicates resolve to the index
    /// of the first insertion.
    pub fn intern(&mut self, name: &str) -> u16 {
        if let Some(index) = self.index_of(name) {
            return index;
        }
        assert!(
            self.names.len() < UNSET as usize,
            "name table capacity exceeded ({} names)",
            self.names.len()
        );
        self.names.push(name.to_string());
        (self.names.len() - 1) as u16
    }

    /// Resolve an index to its name.
    #[must_use]
    pub fn get(&self, index: u16) -> &str {
        assert!(
            (index as usize) < self.names.len(),
            "name index {index} out of range ({} names)",
            self.names.len()
        );
        &self.names[index as usize]
    }

    /// Append the wire form to `out`.
    pub fn write_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.names.len() as i32).to_le_bytes());
        for name in &self.names {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
    }

    /// Parse the wire form from the head of `bytes`, returning the table and
    /// the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedStream`] if the count or a string runs past
    /// the buffer, [`Error::InvalidNameCount`] on a negative count field,
    /// [`Error::InvalidNameBytes`] on non-UTF-8 name bytes.
    pub fn read_from(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < 4 {
            return Err(Error::TruncatedStream { needed: 4, len: bytes.len() });
        }
        let count = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if count < 0 {
            return Err(Error::InvalidNameCount(count));
        }
        let mut pos = 4;

        let mut names = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start = pos;
            while pos < bytes.len() && bytes[pos] != 0 {
                pos += 1;
            }
            if pos >= bytes.len() {
                return Err(Error::TruncatedStream { needed: pos + 1, len: bytes.len() });
            }
            let name = std::str::from_utf8(&bytes[start..pos]).map_err(|_| Error::InvalidNameBytes)?;
            names.push(name.to_string());
            pos += 1; // NUL
        }

        Ok((Self { names }, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut table = NameTable::new();
        let a = table.intern("root");
        let b = table.intern("child");
        let c = table.intern("root");
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(c, a);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_wire_roundtrip() {
        let mut table = NameTable::new();
        table.intern("r");
        table.intern("xy");

        let mut out = Vec::new();
        table.write_into(&mut out);
        assert_eq!(
            out,
            vec![
                0x02, 0x00, 0x00, 0x00, // count
                b'r', 0x00, // "r"
                b'x', b'y', 0x00, // "xy"
            ]
        );

        let (parsed, used) = NameTable::read_from(&out).unwrap();
        assert_eq!(used, out.len());
        assert_eq!(parsed, table);
        assert_eq!(parsed.get(0), "r");
        assert_eq!(parsed.get(1), "xy");
    }

    #[test]
    fn test_read_truncated() {
        assert_eq!(
            NameTable::read_from(&[0x01, 0x00]),
            Err(Error::TruncatedStream { needed: 4, len: 2 })
        );
        // Count says one name but no terminator follows.
        let bytes = [0x01, 0x00, 0x00, 0x00, b'a'];
        assert!(matches!(
            NameTable::read_from(&bytes),
            Err(Error::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_read_negative_count() {
        // A garbled header must surface as an error, not as an empty table.
        let bytes = (-1i32).to_le_bytes();
        assert_eq!(
            NameTable::read_from(&bytes),
            Err(Error::InvalidNameCount(-1))
        );
    }

    #[test]
    #[should_panic(expected = "name index 3 out of range")]
    fn test_get_out_of_range() {
        let mut table = NameTable::new();
        table.intern("only");
        let _ = table.get(3);
    }
}
