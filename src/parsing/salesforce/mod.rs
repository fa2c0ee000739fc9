//! Salesforce-specific extractors (spec §4.3 "Salesforce Apex specifics",
//! "Salesforce XML metadata"). No tree-sitter Apex grammar is depended on
//! here — both the spec's own description of Apex/XML extraction and the
//! original collector behind it are pattern-based (regex over DML/SOQL/
//! Label text, regex over formula text), not AST-driven, so these stay
//! regex/quick-xml extractors rather than reaching for an unpublished
//! grammar.

pub mod apex;
pub mod sfxml;
