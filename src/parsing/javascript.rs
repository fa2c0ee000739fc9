//! Shared JavaScript/TypeScript extractor (spec §4.3 "Common extraction
//! rules" and "JavaScript/TypeScript specifics").
//!
//! Walks the tree-sitter-javascript/typescript tree once for symbols and
//! once for references, exactly as the contract in [`super`] requires.
//! Both passes are pure functions of `(tree, source, file_path)` — the
//! inheritance/implements scratch area the spec allows for is folded
//! into the symbol pass directly here since tree-sitter already hands us
//! the heritage clause at the class node.

use super::{ExtractionResult, RawReference, RawSymbol};
use crate::model::ReferenceKind;
use crate::types::{LineRange, SymbolKind, Visibility};
use tree_sitter::Node;

pub fn extract(tree: &tree_sitter::Tree, source: &[u8]) -> ExtractionResult {
    let mut symbols = Vec::new();
    walk_symbols(tree.root_node(), source, None, false, &mut symbols);

    let mut references = Vec::new();
    walk_references(tree.root_node(), source, &mut references);

    ExtractionResult { symbols, references }
}

fn text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn line_range(node: Node) -> LineRange {
    LineRange::new(node.start_position().row as u32 + 1, node.end_position().row as u32 + 1)
}

/// Doc comment immediately preceding `node`: a `comment` sibling whose
/// text starts with `/**` (JSDoc convention, spec §4.3).
fn preceding_docstring(node: Node, source: &[u8]) -> Option<String> {
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "comment" {
            let t = text(s, source);
            if t.starts_with("/**") {
                return Some(t.to_string());
            }
            return None;
        }
        if s.is_extra() {
            sibling = s.prev_sibling();
            continue;
        }
        break;
    }
    None
}

/// Whether `node` sits directly under an `export_statement` (drives
/// `is_exported` per spec §4.3 "export determines is_exported").
fn is_under_export(node: Node) -> bool {
    node.parent()
        .map(|p| p.kind() == "export_statement")
        .unwrap_or(false)
}

fn walk_symbols(
    node: Node,
    source: &[u8],
    parent_index: Option<usize>,
    parent_exported: bool,
    out: &mut Vec<RawSymbol>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let idx = push_symbol(
                        out,
                        text(name_node, source),
                        SymbolKind::Function,
                        &child,
                        source,
                        parent_index,
                        is_under_export(child) || parent_exported,
                    );
                    walk_symbols(child, source, Some(idx), false, out);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let exported = is_under_export(child) || parent_exported;
                    let idx = push_symbol(
                        out,
                        text(name_node, source),
                        SymbolKind::Class,
                        &child,
                        source,
                        parent_index,
                        exported,
                    );
                    walk_symbols(child, source, Some(idx), false, out);
                }
            }
            "interface_declaration" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let idx = push_symbol(
                        out,
                        text(name_node, source),
                        SymbolKind::Interface,
                        &child,
                        source,
                        parent_index,
                        is_under_export(child) || parent_exported,
                    );
                    walk_symbols(child, source, Some(idx), false, out);
                }
            }
            "method_definition" | "method_signature" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let name = text(name_node, source);
                    let kind = if name == "constructor" {
                        SymbolKind::Constructor
                    } else {
                        SymbolKind::Method
                    };
                    let visibility = if name.starts_with('_') || name.starts_with('#') {
                        Visibility::Private
                    } else {
                        Visibility::Public
                    };
                    let idx = push_symbol_vis(
                        out, name, kind, &child, source, parent_index, parent_exported, visibility,
                    );
                    walk_symbols(child, source, Some(idx), false, out);
                }
            }
            "public_field_definition" | "field_definition" => {
                if let Some(name_node) = child.child_by_field_name("property") {
                    push_symbol(
                        out,
                        text(name_node, source),
                        SymbolKind::Field,
                        &child,
                        source,
                        parent_index,
                        parent_exported,
                    );
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                handle_variable_declaration(child, source, parent_index, parent_exported, out);
            }
            "export_statement" => {
                walk_symbols(child, source, parent_index, true, out);
            }
            _ => {
                walk_symbols(child, source, parent_index, parent_exported, out);
            }
        }
    }
}

fn handle_variable_declaration(
    node: Node,
    source: &[u8],
    parent_index: Option<usize>,
    parent_exported: bool,
    out: &mut Vec<RawSymbol>,
) {
    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        let value = declarator.child_by_field_name("value");
        let is_function_valued = value
            .map(|v| matches!(v.kind(), "function" | "function_expression" | "arrow_function"))
            .unwrap_or(false);

        match name_node.kind() {
            "identifier" => {
                let kind = if is_function_valued {
                    SymbolKind::Function
                } else {
                    SymbolKind::Variable
                };
                let idx = push_symbol(
                    out,
                    text(name_node, source),
                    kind,
                    &declarator,
                    source,
                    parent_index,
                    parent_exported,
                );
                if let Some(value) = value {
                    if is_function_valued {
                        walk_symbols(value, source, Some(idx), false, out);
                    }
                }
            }
            "object_pattern" | "array_pattern" => {
                for binding in destructured_names(name_node, source) {
                    push_symbol(
                        out,
                        binding,
                        SymbolKind::Variable,
                        &declarator,
                        source,
                        parent_index,
                        parent_exported,
                    );
                }
            }
            _ => {}
        }
    }
}

/// Flattens `{a, b: c}` / `[a, b]` destructuring patterns into the bound
/// names (spec §4.3 "one Symbol per binding").
fn destructured_names(node: Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "shorthand_property_identifier_pattern" | "identifier" => {
                names.push(text(child, source).to_string());
            }
            "pair_pattern" => {
                if let Some(value) = child.child_by_field_name("value") {
                    if value.kind() == "identifier" {
                        names.push(text(value, source).to_string());
                    }
                }
            }
            "object_pattern" | "array_pattern" => {
                names.extend(destructured_names(child, source));
            }
            _ => {}
        }
    }
    names
}

#[allow(clippy::too_many_arguments)]
fn push_symbol(
    out: &mut Vec<RawSymbol>,
    name: &str,
    kind: SymbolKind,
    node: &Node,
    source: &[u8],
    parent_index: Option<usize>,
    is_exported: bool,
) -> usize {
    push_symbol_vis(out, name, kind, node, source, parent_index, is_exported, Visibility::Public)
}

#[allow(clippy::too_many_arguments)]
fn push_symbol_vis(
    out: &mut Vec<RawSymbol>,
    name: &str,
    kind: SymbolKind,
    node: &Node,
    source: &[u8],
    parent_index: Option<usize>,
    is_exported: bool,
    visibility: Visibility,
) -> usize {
    let mut raw = RawSymbol::new(name, kind, line_range(*node))
        .with_visibility(visibility)
        .exported(is_exported);
    if let Some(doc) = preceding_docstring(*node, source) {
        raw = raw.with_docstring(doc);
    }
    if let Some(p) = parent_index {
        raw = raw.with_parent(p);
    }
    out.push(raw);
    out.len() - 1
}

fn walk_references(node: Node, source: &[u8], out: &mut Vec<RawReference>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                handle_import(child, source, out);
            }
            "call_expression" => {
                handle_call(child, source, out);
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let owner = text(name_node, source).to_string();
                    if let Some(heritage) = child.child_by_field_name("heritage") {
                        handle_heritage(heritage, source, &owner, out);
                    }
                }
            }
            "assignment_expression" => {
                handle_commonjs_export(child, source, out);
            }
            "shorthand_property_identifier" => {
                out.push(
                    RawReference::new(text(child, source), ReferenceKind::Reference, child.start_position().row as u32 + 1),
                );
            }
            _ => {}
        }
        walk_references(child, source, out);
    }
}

fn handle_heritage(heritage: Node, source: &[u8], owner: &str, out: &mut Vec<RawReference>) {
    let mut cursor = heritage.walk();
    for clause in heritage.children(&mut cursor) {
        let kind = match clause.kind() {
            "class_heritage" => None,
            "extends_clause" => Some(ReferenceKind::Inherits),
            "implements_clause" => Some(ReferenceKind::Implements),
            _ => None,
        };
        if let Some(kind) = kind {
            let mut type_cursor = clause.walk();
            for name_node in clause.children(&mut type_cursor) {
                if matches!(name_node.kind(), "identifier" | "type_identifier") {
                    out.push(
                        RawReference::new(text(name_node, source), kind, clause.start_position().row as u32 + 1)
                            .with_source_name(owner),
                    );
                }
            }
        } else {
            handle_heritage(clause, source, owner, out);
        }
    }
}

/// ES imports and the Salesforce `@salesforce/*` convention (spec §4.3).
fn handle_import(node: Node, source: &[u8], out: &mut Vec<RawReference>) {
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let module_path = text(source_node, source).trim_matches(|c| c == '"' || c == '\'').to_string();
    let line = node.start_position().row as u32 + 1;

    if let Some(salesforce_target) = salesforce_import_target(&module_path) {
        out.push(
            RawReference::new(salesforce_target, ReferenceKind::Call, line).with_import_path(module_path.clone()),
        );
        if let Some(class_target) = salesforce_class_only(&module_path) {
            out.push(
                RawReference::new(class_target, ReferenceKind::Call, line).with_import_path(module_path),
            );
        }
        return;
    }

    let mut cursor = node.walk();
    let mut had_clause = false;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_clause" => {
                had_clause = true;
                emit_import_clause_refs(child, source, &module_path, line, out);
            }
            _ => {}
        }
    }
    if !had_clause {
        // Side-effect import `import 'X'` (spec §4.3).
        out.push(RawReference::new(module_path.clone(), ReferenceKind::Import, line).with_import_path(module_path));
    }
}

fn emit_import_clause_refs(
    clause: Node,
    source: &[u8],
    module_path: &str,
    line: u32,
    out: &mut Vec<RawReference>,
) {
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                out.push(
                    RawReference::new(text(child, source), ReferenceKind::Import, line)
                        .with_import_path(module_path.to_string()),
                );
            }
            "namespace_import" | "named_imports" => {
                emit_import_clause_refs(child, source, module_path, line, out);
            }
            "import_specifier" => {
                let name_node = child.child_by_field_name("name").unwrap_or(child);
                out.push(
                    RawReference::new(text(name_node, source), ReferenceKind::Import, line)
                        .with_import_path(module_path.to_string()),
                );
            }
            _ => {}
        }
    }
}

fn salesforce_import_target(module_path: &str) -> Option<String> {
    if let Some(rest) = module_path.strip_prefix("@salesforce/apex/") {
        return Some(rest.to_string());
    }
    if let Some(rest) = module_path.strip_prefix("@salesforce/schema/") {
        return Some(rest.to_string());
    }
    if let Some(rest) = module_path.strip_prefix("@salesforce/label/") {
        return Some(rest.rsplit('.').next().unwrap_or(rest).to_string());
    }
    if let Some(rest) = module_path.strip_prefix("@salesforce/messageChannel/") {
        return Some(rest.to_string());
    }
    None
}

/// `@salesforce/apex/Class.method` additionally targets the bare class
/// name (spec §4.3 "two call-kind references").
fn salesforce_class_only(module_path: &str) -> Option<String> {
    let rest = module_path.strip_prefix("@salesforce/apex/")?;
    let class_name = rest.split('.').next()?;
    if class_name == rest {
        None
    } else {
        Some(class_name.to_string())
    }
}

fn handle_call(node: Node, source: &[u8], out: &mut Vec<RawReference>) {
    let Some(function_node) = node.child_by_field_name("function") else {
        return;
    };
    let line = node.start_position().row as u32 + 1;

    match function_node.kind() {
        "identifier" => {
            let name = text(function_node, source);
            if name == "require" {
                if let Some(arg) = first_string_argument(node, source) {
                    let last_segment = arg
                        .rsplit('/')
                        .next()
                        .unwrap_or(&arg)
                        .trim_end_matches(".js")
                        .trim_end_matches(".ts")
                        .to_string();
                    out.push(RawReference::new(last_segment, ReferenceKind::Import, line).with_import_path(arg));
                    return;
                }
            }
            out.push(RawReference::new(name, ReferenceKind::Call, line));
        }
        "member_expression" => {
            if let Some(property) = function_node.child_by_field_name("property") {
                out.push(RawReference::new(text(property, source), ReferenceKind::Call, line));
            }
        }
        _ => {}
    }

    // Callback-by-name arguments: `addEventListener("x", handler)` (spec §4.3).
    if let Some(args) = node.child_by_field_name("arguments") {
        let mut cursor = args.walk();
        for arg in args.children(&mut cursor) {
            if arg.kind() == "identifier" {
                out.push(RawReference::new(text(arg, source), ReferenceKind::Reference, line));
            }
        }
    }
}

fn first_string_argument<'a>(call: Node<'a>, source: &'a [u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    for arg in args.children(&mut cursor) {
        if arg.kind() == "string" {
            return Some(text(arg, source).trim_matches(|c| c == '"' || c == '\'').to_string());
        }
    }
    None
}

/// `module.exports = X` / `exports.X = …` (spec §4.3). These are recorded
/// as reference-kind hints the resolver can use to upgrade an existing
/// symbol's `is_exported`; this core only emits the reference, the
/// upgrade itself happens in the resolver pass.
fn handle_commonjs_export(node: Node, source: &[u8], out: &mut Vec<RawReference>) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    let line = node.start_position().row as u32 + 1;
    let left_text = text(left, source);
    if left_text == "module.exports" {
        if let Some(right) = node.child_by_field_name("right") {
            if right.kind() == "identifier" {
                out.push(RawReference::new(text(right, source), ReferenceKind::Reference, line));
            }
        }
    } else if let Some(rest) = left_text.strip_prefix("exports.") {
        out.push(RawReference::new(rest, ReferenceKind::Reference, line));
    }
}
