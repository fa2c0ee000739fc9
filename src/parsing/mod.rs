//! Per-language tree walkers (spec §4.2/§4.3).
//!
//! Every extractor implements the uniform contract: given a parsed tree
//! (or, for regex/quick-xml extractors that never build a tree-sitter
//! tree, the source text directly) plus the source bytes and file path,
//! produce [`RawSymbol`] and [`RawReference`] records for that file. Ids
//! are not assigned here — the orchestrator inserts each file's raw
//! symbols into the Store in order and keeps the `parent_index -> SymbolId`
//! mapping, since only the Store knows the next free id.

pub mod coordinator;
pub mod generic;
pub mod javascript;
pub mod salesforce;
pub mod sfc;
pub mod vue;

use crate::model::ReferenceKind;
use crate::types::{LineRange, SymbolKind, Visibility};

/// A symbol as produced by an extractor, before the orchestrator assigns
/// it a [`crate::types::SymbolId`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawSymbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub signature: String,
    pub range: LineRange,
    pub docstring: Option<String>,
    pub visibility: Visibility,
    pub is_exported: bool,
    /// Index into the same file's `Vec<RawSymbol>`, resolved to a
    /// `SymbolId` by the orchestrator after insertion.
    pub parent_index: Option<usize>,
}

impl RawSymbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: LineRange) -> Self {
        let name = name.into();
        Self {
            qualified_name: name.clone(),
            name,
            kind,
            signature: String::new(),
            range,
            docstring: None,
            visibility: Visibility::Public,
            is_exported: false,
            parent_index: None,
        }
    }

    pub fn with_qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = qualified_name.into();
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn with_docstring(mut self, doc: impl Into<String>) -> Self {
        self.docstring = Some(doc.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn exported(mut self, is_exported: bool) -> Self {
        self.is_exported = is_exported;
        self
    }

    pub fn with_parent(mut self, parent_index: usize) -> Self {
        self.parent_index = Some(parent_index);
        self
    }
}

/// A reference as produced by an extractor, source/target still loose
/// names (spec §4.4 resolves these into [`crate::model::Edge`]s).
#[derive(Debug, Clone, PartialEq)]
pub struct RawReference {
    pub target_name: String,
    pub kind: ReferenceKind,
    pub line: u32,
    pub source_name: Option<String>,
    pub import_path: Option<String>,
}

impl RawReference {
    pub fn new(target_name: impl Into<String>, kind: ReferenceKind, line: u32) -> Self {
        Self {
            target_name: target_name.into(),
            kind,
            line,
            source_name: None,
            import_path: None,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_import_path(mut self, path: impl Into<String>) -> Self {
        self.import_path = Some(path.into());
        self
    }
}

/// Everything one extractor pass over one file yields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub symbols: Vec<RawSymbol>,
    pub references: Vec<RawReference>,
}

/// Closed grammar identifier table (spec §4.2). `Xml` covers both
/// Salesforce `-meta.xml` metadata and generic XML-ish config read by
/// [`generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Vue,
    Svelte,
    ApexClass,
    ApexTrigger,
    SalesforceMetaXml,
    Generic,
}

impl Grammar {
    pub fn language_tag(self) -> &'static str {
        match self {
            Grammar::JavaScript => "javascript",
            Grammar::TypeScript => "typescript",
            Grammar::Vue => "vue",
            Grammar::Svelte => "svelte",
            Grammar::ApexClass => "apex",
            Grammar::ApexTrigger => "apex",
            Grammar::SalesforceMetaXml => "salesforce-xml",
            Grammar::Generic => "generic",
        }
    }
}

/// Maps a repository-relative path to a grammar identifier via the
/// closed extension table plus the `-meta.xml` path-sensitive override
/// (spec §4.2).
pub fn grammar_for_path(path: &str) -> Option<Grammar> {
    let lower = path.to_lowercase();
    if lower.ends_with("-meta.xml") {
        return Some(Grammar::SalesforceMetaXml);
    }
    if lower.ends_with(".trigger") {
        return Some(Grammar::ApexTrigger);
    }
    if lower.ends_with(".cls") {
        return Some(Grammar::ApexClass);
    }
    if lower.ends_with(".vue") {
        return Some(Grammar::Vue);
    }
    if lower.ends_with(".svelte") {
        return Some(Grammar::Svelte);
    }
    if lower.ends_with(".ts") || lower.ends_with(".tsx") {
        return Some(Grammar::TypeScript);
    }
    if lower.ends_with(".js") || lower.ends_with(".jsx") || lower.ends_with(".mjs") || lower.ends_with(".cjs") {
        return Some(Grammar::JavaScript);
    }
    if lower.ends_with(".page") || lower.ends_with(".component") || lower.ends_with(".cmp") || lower.ends_with(".app") {
        return Some(Grammar::Generic);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_xml_override_wins_over_extension() {
        assert_eq!(
            grammar_for_path("force-app/objects/Account/Account.object-meta.xml"),
            Some(Grammar::SalesforceMetaXml)
        );
    }

    #[test]
    fn dispatches_known_extensions() {
        assert_eq!(grammar_for_path("src/a.ts"), Some(Grammar::TypeScript));
        assert_eq!(grammar_for_path("src/a.js"), Some(Grammar::JavaScript));
        assert_eq!(grammar_for_path("src/a.vue"), Some(Grammar::Vue));
        assert_eq!(grammar_for_path("classes/Foo.cls"), Some(Grammar::ApexClass));
    }

    #[test]
    fn unknown_extension_has_no_grammar() {
        assert_eq!(grammar_for_path("README.md"), None);
    }
}
