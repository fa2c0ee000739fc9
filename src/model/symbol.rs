use crate::types::{FileId, LineRange, SymbolId, SymbolKind, Visibility};
use serde::{Deserialize, Serialize};

/// A named declaration (spec §3).
///
/// `(file, name, line_start)` is intentionally not unique — overloads are
/// legitimate. `qualified_name` is unique per file once the parent chain
/// is included; enforcing that is the Store's job, not this type's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub file_id: FileId,
    pub name: Box<str>,
    pub qualified_name: Box<str>,
    pub kind: SymbolKind,
    pub signature: Box<str>,
    pub range: LineRange,
    pub docstring: Option<Box<str>>,
    pub visibility: Visibility,
    pub is_exported: bool,
    pub parent: Option<SymbolId>,
}

impl Symbol {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SymbolId,
        file_id: FileId,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        kind: SymbolKind,
        range: LineRange,
        visibility: Visibility,
    ) -> Self {
        Self {
            id,
            file_id,
            name: name.into().into_boxed_str(),
            qualified_name: qualified_name.into().into_boxed_str(),
            kind,
            signature: Box::from(""),
            range,
            docstring: None,
            visibility,
            is_exported: false,
            parent: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into().into_boxed_str();
        self
    }

    pub fn with_docstring(mut self, doc: impl Into<String>) -> Self {
        self.docstring = Some(doc.into().into_boxed_str());
        self
    }

    pub fn exported(mut self, is_exported: bool) -> Self {
        self.is_exported = is_exported;
        self
    }

    pub fn with_parent(mut self, parent: SymbolId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Invariant check from spec §8: `end_line >= start_line` always holds
    /// by construction of `LineRange`, so this only validates the
    /// qualified name is non-empty (it must at least equal `name`).
    pub fn is_well_formed(&self) -> bool {
        !self.qualified_name.is_empty() && self.range.end_line >= self.range.start_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(v: u32) -> SymbolId {
        SymbolId::new(v).unwrap()
    }
    fn fid(v: u32) -> FileId {
        FileId::new(v).unwrap()
    }

    #[test]
    fn builder_methods_compose() {
        let s = Symbol::new(
            sid(1),
            fid(1),
            "uploadImage",
            "CloudinaryService.uploadImage",
            SymbolKind::Method,
            LineRange::new(10, 14),
            Visibility::Public,
        )
        .with_signature("uploadImage(data)")
        .with_docstring("Uploads an image")
        .exported(true);

        assert_eq!(&*s.name, "uploadImage");
        assert!(s.is_exported);
        assert!(s.is_well_formed());
    }
}
