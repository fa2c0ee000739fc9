//! File discovery for an indexing run: walks the project root honoring
//! `.gitignore` plus the configured extra ignore patterns, keeping only
//! paths the parser coordinator has a grammar for.

use crate::config::Settings;
use crate::error::{Result, RoamError};
use ignore::gitignore::GitignoreBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: String,
    pub absolute: PathBuf,
    pub content_hash: Box<str>,
    pub mtime_unix: i64,
}

pub fn discover(root: &Path, settings: &Settings) -> Result<Vec<DiscoveredFile>> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in &settings.indexing.ignore_patterns {
        builder.add_line(None, pattern).map_err(|e| RoamError::Config {
            reason: format!("invalid ignore pattern '{pattern}': {e}"),
        })?;
    }
    let extra_ignores = builder.build().map_err(|e| RoamError::Config {
        reason: e.to_string(),
    })?;

    let mut out = Vec::new();
    for entry in WalkBuilder::new(root).build() {
        let entry = entry.map_err(|e| RoamError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(path);
        if extra_ignores.matched(rel, false).is_ignore() {
            continue;
        }

        let normalized = crate::model::normalize_path(&rel.to_string_lossy());
        if crate::parsing::grammar_for_path(&normalized).is_none() {
            continue;
        }

        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        let content_hash = crate::store::hash_content(&bytes);
        let mtime_unix = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        out.push(DiscoveredFile {
            path: normalized,
            absolute: path.to_path_buf(),
            content_hash: content_hash.into(),
            mtime_unix,
        });
    }

    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_js_files_and_skips_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "function a() {}\n").unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/dep.js"), "function b() {}\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "not code\n").unwrap();

        let found = discover(dir.path(), &Settings::default()).unwrap();
        let paths: Vec<&str> = found.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.js"]);
    }
}
