//! Auxiliary git-history tables (spec §6).
//!
//! A git-history collector is optional and external to this core; these
//! tables exist so the Store can hold and expose rows a collector
//! writes, but nothing here populates them. Schemas are exactly those
//! named in spec §6.

use crate::types::FileId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub id: Box<str>,
    pub author: Box<str>,
    pub message: Box<str>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFileChange {
    pub commit_id_index: u32,
    pub file_id: FileId,
    pub lines_added: u32,
    pub lines_removed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub file_id: FileId,
    pub commit_count: u32,
    pub total_churn: u32,
    pub complexity: u32,
    pub distinct_authors: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCochange {
    pub file_id_a: FileId,
    pub file_id_b: FileId,
    pub cochange_count: u32,
}

/// Holds whatever an external collector has written. Empty until
/// something calls the `insert_*` methods; this core never does.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GitHistory {
    commits: Vec<GitCommit>,
    file_changes: Vec<GitFileChange>,
    file_stats: Vec<FileStats>,
    cochanges: Vec<GitCochange>,
}

impl GitHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_commit(&mut self, commit: GitCommit) -> u32 {
        self.commits.push(commit);
        (self.commits.len() - 1) as u32
    }

    pub fn insert_file_change(&mut self, change: GitFileChange) {
        self.file_changes.push(change);
    }

    pub fn insert_file_stats(&mut self, stats: FileStats) {
        self.file_stats.push(stats);
    }

    pub fn insert_cochange(&mut self, cochange: GitCochange) {
        self.cochanges.push(cochange);
    }

    pub fn commits(&self) -> &[GitCommit] {
        &self.commits
    }

    pub fn file_changes_for(&self, file_id: FileId) -> Vec<&GitFileChange> {
        self.file_changes
            .iter()
            .filter(|c| c.file_id == file_id)
            .collect()
    }

    pub fn stats_for(&self, file_id: FileId) -> Option<&FileStats> {
        self.file_stats.iter().find(|s| s.file_id == file_id)
    }

    /// Hidden coupling (GLOSSARY): co-change pairs above `min_count` that
    /// have no corresponding structural file edge are surfaced by the
    /// caller joining this against `Store::file_edges`; this just returns
    /// the raw co-change rows.
    pub fn cochanges(&self) -> &[GitCochange] {
        &self.cochanges
    }
}
