//! Core identifier and value types shared across the crate.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(NonZeroU32);

impl SymbolId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(self) -> u32 {
        self.0.get()
    }
}

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(self) -> u32 {
        self.0.get()
    }
}

impl EdgeId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(self) -> u32 {
        self.0.get()
    }
}

/// Monotonic id allocator. The Store owns one of each per open index so
/// ids stay stable across an incremental run instead of being reassigned
/// from a freshly-zeroed counter.
#[derive(Debug, Default)]
pub struct IdCounter(u32);

impl IdCounter {
    pub fn starting_after(last: u32) -> Self {
        Self(last)
    }

    pub fn next_symbol(&mut self) -> SymbolId {
        self.0 += 1;
        SymbolId::new(self.0).expect("counter never yields zero")
    }

    pub fn next_file(&mut self) -> FileId {
        self.0 += 1;
        FileId::new(self.0).expect("counter never yields zero")
    }

    pub fn next_edge(&mut self) -> EdgeId {
        self.0 += 1;
        EdgeId::new(self.0).expect("counter never yields zero")
    }

    pub fn current(&self) -> u32 {
        self.0
    }
}

/// 1-indexed line range, inclusive on both ends, as reported by spec-level
/// line counting (tree-sitter rows are 0-indexed; extractors add 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl LineRange {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    pub fn single(line: u32) -> Self {
        Self {
            start_line: line,
            end_line: line,
        }
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Number of lines spanned, at least 1.
    pub fn len(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Closed vocabulary of declaration kinds (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Constructor,
    Interface,
    Struct,
    Enum,
    Trait,
    Module,
    Field,
    Property,
    Variable,
    Constant,
    Parameter,
    Decorator,
    Trigger,
}

impl SymbolKind {
    /// Kinds treated as "architectural anchors" for community labeling
    /// (spec §4.5).
    pub fn is_architectural_anchor(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Trait
                | SymbolKind::Module
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_rejects_zero() {
        assert!(SymbolId::new(0).is_none());
        assert_eq!(SymbolId::new(42).unwrap().value(), 42);
    }

    #[test]
    fn id_counter_is_monotonic_and_resumable() {
        let mut counter = IdCounter::starting_after(5);
        assert_eq!(counter.next_symbol().value(), 6);
        assert_eq!(counter.next_symbol().value(), 7);
        assert_eq!(counter.current(), 7);
    }

    #[test]
    fn line_range_contains() {
        let r = LineRange::new(10, 15);
        assert!(r.contains(10));
        assert!(r.contains(15));
        assert!(!r.contains(9));
        assert!(!r.contains(16));
        assert_eq!(r.len(), 6);
    }

    #[test]
    fn anchor_kinds() {
        assert!(SymbolKind::Class.is_architectural_anchor());
        assert!(!SymbolKind::Function.is_architectural_anchor());
    }
}
