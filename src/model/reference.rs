use serde::{Deserialize, Serialize};

/// Edge/reference kind vocabulary (spec §3, GLOSSARY "Edge kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Call,
    Import,
    Inherits,
    Implements,
    Uses,
    UsesTrait,
    Template,
    Reference,
}

/// A loose, transient reference record produced by an extractor's
/// reference pass. Never persisted — the Resolver consumes these and
/// emits [`crate::model::Edge`] records in their place (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Name (possibly dotted, e.g. `Class.method`) the reference points at.
    pub target_name: Box<str>,
    pub kind: ReferenceKind,
    pub line: u32,
    /// Name of the symbol in `source_file` that owns this reference, when
    /// the extractor can name it directly (e.g. the enclosing function).
    /// `None` triggers line-containment source resolution.
    pub source_name: Option<Box<str>>,
    /// Repository-relative path of the file this reference was extracted
    /// from. Always set by extractors; optional only to keep construction
    /// ergonomic in tests.
    pub source_file: Option<Box<str>>,
    /// Literal import path/module specifier, when the reference arose from
    /// an import statement (or an import-introduced local name is being
    /// referenced later).
    pub import_path: Option<Box<str>>,
}

impl Reference {
    pub fn new(target_name: impl Into<String>, kind: ReferenceKind, line: u32) -> Self {
        Self {
            target_name: target_name.into().into_boxed_str(),
            kind,
            line,
            source_name: None,
            source_file: None,
            import_path: None,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into().into_boxed_str());
        self
    }

    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = Some(path.into().into_boxed_str());
        self
    }

    pub fn with_import_path(mut self, path: impl Into<String>) -> Self {
        self.import_path = Some(path.into().into_boxed_str());
        self
    }
}
