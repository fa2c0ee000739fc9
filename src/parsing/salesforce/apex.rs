//! Apex extractor (spec §4.3 "Salesforce Apex specifics").
//!
//! No tree-sitter Apex grammar is available on crates.io, and the
//! behavior this spec describes is itself pattern-based (DML keywords,
//! SOQL `FROM` clauses, `Label.X` lookups), so this walks the source
//! text with regex and manual brace matching instead of an AST.

use super::super::{ExtractionResult, RawReference, RawSymbol};
use crate::model::ReferenceKind;
use crate::types::{LineRange, SymbolKind, Visibility};
use regex::Regex;
use std::sync::OnceLock;

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(global|public|private|protected)?\s*(?:with sharing|without sharing|inherited sharing)?\s*(?:virtual|abstract)?\s*class\s+(\w+)(?:\s+extends\s+(\w+))?(?:\s+implements\s+([\w,\s]+))?\s*\{",
        )
        .unwrap()
    })
}

fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(global|public|private|protected)?\s*(?:static\s+|virtual\s+|override\s+|abstract\s+)*([\w<>.\[\],\s]+?)\s+(\w+)\s*\(([^)]*)\)\s*\{",
        )
        .unwrap()
    })
}

fn trigger_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*trigger\s+(\w+)\s+on\s+(\w+)\s*\(([^)]*)\)\s*\{").unwrap())
}

fn dml_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)\b(insert|update|delete|upsert|merge|undelete)\s+[\w.]+\s*;").unwrap())
}

fn soql_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\bSELECT\s+(.*?)\s+FROM\s+(\w+)").unwrap())
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:System\.Label|Label)\.(\w+)\b").unwrap())
}

fn line_of(source: &str, byte_offset: usize) -> u32 {
    source[..byte_offset.min(source.len())].matches('\n').count() as u32 + 1
}

/// Byte offset just past the brace matching the one at `open_idx`
/// (which must itself be `{`). Ignores string/char literal content only
/// superficially — adequate for the code-intel heuristics this spec asks
/// for, not a full Apex lexer.
fn matching_brace_end(source: &str, open_idx: usize) -> usize {
    let bytes = source.as_bytes();
    let mut depth = 0i32;
    let mut i = open_idx;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

pub fn extract(source: &str) -> ExtractionResult {
    let mut symbols = Vec::new();
    let mut references = Vec::new();

    extract_classes(source, &mut symbols, &mut references);
    extract_triggers(source, &mut symbols, &mut references);
    extract_dml(source, &mut references);
    extract_soql(source, &mut references);
    extract_labels(source, &mut references);

    ExtractionResult { symbols, references }
}

fn extract_classes(source: &str, symbols: &mut Vec<RawSymbol>, references: &mut Vec<RawReference>) {
    for caps in class_re().captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let open_brace = whole.end() - 1;
        let close = matching_brace_end(source, open_brace);
        let name = caps.get(2).unwrap().as_str();
        let start_line = line_of(source, whole.start());
        let end_line = line_of(source, close.saturating_sub(1));
        let visibility = match caps.get(1).map(|m| m.as_str()) {
            Some("global") | Some("public") => Visibility::Public,
            Some("protected") => Visibility::Protected,
            _ => Visibility::Private,
        };

        let class_idx = symbols.len();
        symbols.push(
            RawSymbol::new(name, SymbolKind::Class, LineRange::new(start_line, end_line))
                .with_visibility(visibility)
                .exported(matches!(visibility, Visibility::Public)),
        );

        if let Some(extends) = caps.get(3) {
            references.push(
                RawReference::new(extends.as_str(), ReferenceKind::Inherits, start_line).with_source_name(name),
            );
        }
        if let Some(implements) = caps.get(4) {
            for iface in implements.as_str().split(',') {
                let iface = iface.trim();
                if !iface.is_empty() {
                    references.push(
                        RawReference::new(iface, ReferenceKind::Implements, start_line).with_source_name(name),
                    );
                }
            }
        }

        extract_methods(&source[open_brace..close], open_brace, source, name, class_idx, symbols);
    }
}

fn extract_methods(
    body: &str,
    body_offset: usize,
    full_source: &str,
    owner_name: &str,
    owner_index: usize,
    symbols: &mut Vec<RawSymbol>,
) {
    for caps in method_re().captures_iter(body) {
        let whole = caps.get(0).unwrap();
        let return_type = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        // Filter obvious non-methods: constructors look like `public ClassName(` with no return type.
        let name = caps.get(3).unwrap().as_str();
        if return_type.is_empty() {
            continue;
        }
        let kind = if name == owner_name {
            SymbolKind::Constructor
        } else {
            SymbolKind::Method
        };
        let open_brace = body_offset + whole.end() - 1;
        let close = matching_brace_end(full_source, open_brace);
        let start_line = line_of(full_source, body_offset + whole.start());
        let end_line = line_of(full_source, close.saturating_sub(1));
        let visibility = match caps.get(1).map(|m| m.as_str()) {
            Some("global") | Some("public") => Visibility::Public,
            Some("protected") => Visibility::Protected,
            _ => Visibility::Private,
        };
        symbols.push(
            RawSymbol::new(name, kind, LineRange::new(start_line, end_line))
                .with_qualified_name(format!("{owner_name}.{name}"))
                .with_signature(whole.as_str().trim_end_matches('{').trim().to_string())
                .with_visibility(visibility)
                .exported(matches!(visibility, Visibility::Public))
                .with_parent(owner_index),
        );
    }
}

fn extract_triggers(source: &str, symbols: &mut Vec<RawSymbol>, references: &mut Vec<RawReference>) {
    for caps in trigger_re().captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let open_brace = whole.end() - 1;
        let close = matching_brace_end(source, open_brace);
        let name = caps.get(1).unwrap().as_str();
        let sobject = caps.get(2).unwrap().as_str();
        let start_line = line_of(source, whole.start());
        let end_line = line_of(source, close.saturating_sub(1));

        symbols.push(RawSymbol::new(name, SymbolKind::Trigger, LineRange::new(start_line, end_line)));
        references.push(RawReference::new(sobject, ReferenceKind::Call, start_line).with_source_name(name));
    }
}

fn extract_dml(source: &str, references: &mut Vec<RawReference>) {
    for caps in dml_re().captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let keyword = caps.get(1).unwrap().as_str().to_lowercase();
        let line = line_of(source, whole.start());
        references.push(RawReference::new(format!("DML.{keyword}"), ReferenceKind::Call, line));
    }
}

fn extract_soql(source: &str, references: &mut Vec<RawReference>) {
    for caps in soql_re().captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let line = line_of(source, whole.start());
        let fields = caps.get(1).unwrap().as_str();
        let sobject = caps.get(2).unwrap().as_str();

        references.push(RawReference::new(sobject, ReferenceKind::Reference, line));

        for field in fields.split(',') {
            let field = field.trim();
            if let Some(trailing) = field.rsplit('.').next() {
                if trailing != field && !trailing.is_empty() {
                    references.push(RawReference::new(trailing, ReferenceKind::Reference, line));
                }
            }
        }
    }
}

fn extract_labels(source: &str, references: &mut Vec<RawReference>) {
    for caps in label_re().captures_iter(source) {
        let whole = caps.get(0).unwrap();
        let line = line_of(source, whole.start());
        references.push(RawReference::new(&caps[1], ReferenceKind::Reference, line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_and_method_are_extracted() {
        let source = "public class CloudinaryService {\n    public static String uploadImage(String data) {\n        return data;\n    }\n}\n";
        let result = extract(source);
        let names: Vec<&str> = result.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"CloudinaryService"));
        assert!(names.contains(&"uploadImage"));
    }

    #[test]
    fn trigger_emits_symbol_and_call_reference() {
        let source = "trigger AccountTrigger on Account (before insert) {\n    insert new Account();\n}\n";
        let result = extract(source);
        assert!(result.symbols.iter().any(|s| s.kind == SymbolKind::Trigger && s.name == "AccountTrigger"));
        assert!(result.references.iter().any(|r| r.target_name == "Account" && r.kind == ReferenceKind::Call));
    }

    #[test]
    fn dml_statement_emits_synthetic_target() {
        let source = "insert acct;\n";
        let result = extract(source);
        assert!(result.references.iter().any(|r| r.target_name == "DML.insert"));
    }

    #[test]
    fn soql_from_clause_references_sobject() {
        let source = "List<Account> accs = [SELECT Id, Name, Owner.Name FROM Account];\n";
        let result = extract(source);
        assert!(result.references.iter().any(|r| r.target_name == "Account"));
        assert!(result.references.iter().any(|r| r.target_name == "Name"));
    }

    #[test]
    fn label_reference_is_extracted() {
        let source = "String s = System.Label.Welcome_Message;\n";
        let result = extract(source);
        assert!(result.references.iter().any(|r| r.target_name == "Welcome_Message"));
    }
}
