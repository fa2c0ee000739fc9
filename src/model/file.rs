use crate::types::FileId;
use serde::{Deserialize, Serialize};

/// One source file tracked by the index (spec §3).
///
/// `path` is always forward-slash normalized and repository-relative so
/// that hashes and paths compare equal across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub path: Box<str>,
    pub language: Box<str>,
    /// Stable content hash (sha256 hex), independent of line-ending style.
    pub content_hash: Box<str>,
    pub mtime_unix: i64,
    pub line_count: u32,
}

impl File {
    pub fn new(
        id: FileId,
        path: impl Into<String>,
        language: impl Into<String>,
        content_hash: impl Into<String>,
        mtime_unix: i64,
        line_count: u32,
    ) -> Self {
        Self {
            id,
            path: normalize_path(&path.into()).into(),
            language: language.into().into_boxed_str(),
            content_hash: content_hash.into().into_boxed_str(),
            mtime_unix,
            line_count,
        }
    }
}

/// Forward-slash normalization used for every repository-relative path
/// stored in the index.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_backslashes() {
        assert_eq!(normalize_path("src\\lib\\mod.rs"), "src/lib/mod.rs");
    }

    #[test]
    fn file_new_normalizes_path() {
        let f = File::new(
            FileId::new(1).unwrap(),
            "a\\b.ts",
            "typescript",
            "deadbeef",
            0,
            10,
        );
        assert_eq!(&*f.path, "a/b.ts");
    }
}
