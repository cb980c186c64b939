//! The shared store for string-attribute values.
//!
//! Pattern restrictions and text annotations both mention free-form string
//! values (lemmas, surface stems). They only ever compare by identity, so
//! both sides intern into one [`StringStore`] and carry the index as the
//! attribute value. Index 0 is the interner's reserved empty string — the
//! null attribute value.
//!
//! The store is interior-mutable: interning happens while the pattern set
//! or a text is being loaded, through a shared reference.

use std::cell::RefCell;

use morphex_base::{Interner, Symbol};

use crate::attributes::AttributeValue;

/// Interior-mutable string interner shared by the pattern builder and the
/// text loader.
#[derive(Debug, Default)]
pub struct StringStore {
    inner: RefCell<Interner>,
}

impl StringStore {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Interner::new()),
        }
    }

    /// Interns `value` and returns its attribute-value index.
    pub fn index_of(&self, value: &str) -> AttributeValue {
        self.inner.borrow_mut().intern(value).index() as AttributeValue
    }

    /// Renders a previously interned value.
    pub fn value(&self, index: AttributeValue) -> String {
        self.inner
            .borrow()
            .resolve(Symbol::from_index(index as usize))
            .to_owned()
    }
}
