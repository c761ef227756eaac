//! A minimal, flat symbol table built on [`indexmap::IndexMap`].
//!
//! Each unique name gets a stable integer index in insertion order;
//! re-interning an existing name returns its index without touching the
//! stored value. The calculator uses it to hold variable bindings across
//! statements.
//!
//! ```rust
//! # use partab_calc::SymTab;
//! let mut st = SymTab::new();
//! let i = st.intern("foo");
//! assert_eq!(st.get(i).unwrap(), 0);
//! st.set(i, 42).unwrap();
//! assert_eq!(st.get(i).unwrap(), 42);
//! assert_eq!(st.intern("foo"), i);
//! ```

use indexmap::{map::Entry, IndexMap};
use smartstring::alias::String;
use thiserror::Error;

/// Errors that can occur when operating on a [`SymTab`].
#[derive(Debug, Error)]
pub enum SymTabError {
    /// Attempted to access an invalid index (out of bounds).
    #[error("invalid symbol index {index} (table length {len})")]
    InvalidIndex {
        /// The index that was requested.
        index: usize,
        /// The number of entries currently in the table.
        len: usize,
    },
}

/// A symbol table mapping string names to integer values.
#[derive(Debug, Default)]
pub struct SymTab {
    tab: IndexMap<String, i64>,
}

impl SymTab {
    /// Creates a new, empty symbol table.
    pub fn new() -> Self {
        Self {
            tab: IndexMap::new(),
        }
    }

    /// Returns the number of interned symbols.
    pub fn len(&self) -> usize {
        self.tab.len()
    }

    /// `true` when no symbol has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.tab.is_empty()
    }

    /// Inserts the name if missing and returns its index. A fresh entry
    /// starts at value 0.
    pub fn intern(&mut self, name: impl AsRef<str>) -> usize {
        match self.tab.entry(String::from(name.as_ref())) {
            Entry::Occupied(o) => o.index(),
            Entry::Vacant(v) => {
                let o = v.insert_entry(0);
                o.index()
            }
        }
    }

    /// Updates the value at the given index.
    pub fn set(&mut self, index: usize, new_value: i64) -> Result<(), SymTabError> {
        let n = self.tab.len();
        let (_, value) = self
            .tab
            .get_index_mut(index)
            .ok_or(SymTabError::InvalidIndex { index, len: n })?;
        *value = new_value;
        Ok(())
    }

    /// Returns the value stored at the given index.
    pub fn get(&self, index: usize) -> Result<i64, SymTabError> {
        let (_, value) = self.tab.get_index(index).ok_or(SymTabError::InvalidIndex {
            index,
            len: self.tab.len(),
        })?;
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_is_empty() {
        let st = SymTab::new();
        assert_eq!(st.len(), 0);
        assert!(st.is_empty());
    }

    #[test]
    fn intern_assigns_sequential_indices() {
        let mut st = SymTab::new();
        assert_eq!(st.intern("a"), 0);
        assert_eq!(st.intern("b"), 1);
        assert_eq!(st.intern("c"), 2);
        assert_eq!(st.len(), 3);
    }

    #[test]
    fn re_intern_returns_same_index_and_preserves_value() {
        let mut st = SymTab::new();
        let i = st.intern("x");
        st.set(i, 42).unwrap();
        assert_eq!(st.intern("x"), i);
        assert_eq!(st.get(i).unwrap(), 42);
        assert_eq!(st.len(), 1);
    }

    #[test]
    fn fresh_entries_start_at_zero() {
        let mut st = SymTab::new();
        let i = st.intern("unset");
        assert_eq!(st.get(i).unwrap(), 0);
    }

    #[test]
    fn out_of_bounds_access_errors() {
        let mut st = SymTab::new();
        st.intern("only");
        let err = st.get(5).unwrap_err();
        let SymTabError::InvalidIndex { index, len } = err;
        assert_eq!((index, len), (5, 1));
        assert!(st.set(999, 1).is_err());
    }
}
