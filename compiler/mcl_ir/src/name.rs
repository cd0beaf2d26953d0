//! Interned string identifier.
//!
//! Identifiers, resource kinds, field names and class names are all interned
//! through a single [`StringInterner`] so equality is an integer compare
//! rather than a string compare.

use rustc_hash::FxHashMap;
use std::fmt;

/// An interned string.
///
/// Layout: a single `u32` index into the owning [`StringInterner`]. Two
/// `Name`s are equal iff they were interned from equal strings by the same
/// interner.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string, always index 0.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Single-threaded string interner.
///
/// The front end never shares an interner across threads (see the
/// concurrency model: lex/parse/scope/unify/lower are cooperative and
/// single-threaded), so this is a plain `Vec`/`FxHashMap` pair rather than
/// the sharded, lock-protected interner a concurrent compiler needs.
#[derive(Default)]
pub struct StringInterner {
    map: FxHashMap<Box<str>, u32>,
    strings: Vec<Box<str>>,
}

impl StringInterner {
    pub fn new() -> Self {
        let mut interner = StringInterner {
            map: FxHashMap::default(),
            strings: Vec::new(),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Name::EMPTY);
        interner
    }

    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&idx) = self.map.get(s) {
            return Name(idx);
        }
        let idx = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| unreachable!("more than u32::MAX distinct identifiers"));
        self.strings.push(s.into());
        self.map.insert(s.into(), idx);
        Name(idx)
    }

    pub fn resolve(&self, name: Name) -> &str {
        self.strings
            .get(name.0 as usize)
            .unwrap_or_else(|| unreachable!("Name {:?} not produced by this interner", name))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_equal_strings_to_equal_names() {
        let mut i = StringInterner::new();
        let a = i.intern("foo");
        let b = i.intern("foo");
        assert_eq!(a, b);
        assert_eq!(i.resolve(a), "foo");
    }

    #[test]
    fn distinct_strings_get_distinct_names() {
        let mut i = StringInterner::new();
        let a = i.intern("foo");
        let b = i.intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_string_is_pre_interned() {
        let mut i = StringInterner::new();
        let e = i.intern("");
        assert_eq!(e, Name::EMPTY);
    }
}
