//! Vue template scanner (spec §4.3 "Vue template scanning").
//!
//! Runs over the full template text (not per line) so multi-line
//! attribute values stay intact; line numbers are reconstructed from
//! each match's byte offset. Four expression contexts plus PascalCase
//! component tags are scanned; each distinct name is emitted at most
//! once per template.

use crate::model::ReferenceKind;
use crate::parsing::RawReference;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn mustache_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(.*?)\s*\}\}").unwrap())
}

fn binding_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?:^|\s):[a-zA-Z][\w-]*=["']([^"']*)["']|v-bind:[a-zA-Z][\w-]*=["']([^"']*)["']"#).unwrap())
}

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"v-[a-zA-Z-]+(?::[\w.-]+)?=["']([^"']*)["']"#).unwrap())
}

fn event_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"@[\w:.-]+=["']([^"']*)["']|v-on:[\w.-]+=["']([^"']*)["']"#).unwrap()
    })
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").unwrap())
}

fn component_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?([A-Z][A-Za-z0-9]*)\b").unwrap())
}

const JS_KEYWORDS: &[&str] = &[
    "true", "false", "null", "undefined", "this", "new", "typeof", "in", "of", "if", "else",
];

fn line_of(template: &str, byte_offset: usize) -> u32 {
    template[..byte_offset.min(template.len())].matches('\n').count() as u32
}

/// Scans `template` (already at `template_start_line`) for identifier
/// references in the four expression contexts plus PascalCase component
/// tags. `known_script_symbols` is unused for filtering — every matched
/// identifier is emitted as a template-kind reference and the resolver
/// decides whether it matches a known symbol.
pub fn scan_template(template: &str, template_start_line: u32) -> Vec<RawReference> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for m in mustache_re().captures_iter(template) {
        emit_expression(&m[1], m.get(0).unwrap().start(), template, template_start_line, &mut seen, &mut out);
    }
    for m in binding_re().captures_iter(template) {
        let expr = m.get(1).or_else(|| m.get(2)).map(|g| g.as_str()).unwrap_or("");
        emit_expression(expr, m.get(0).unwrap().start(), template, template_start_line, &mut seen, &mut out);
    }
    for m in directive_re().captures_iter(template) {
        emit_expression(&m[1], m.get(0).unwrap().start(), template, template_start_line, &mut seen, &mut out);
    }
    for m in event_re().captures_iter(template) {
        let expr = m.get(1).or_else(|| m.get(2)).map(|g| g.as_str()).unwrap_or("");
        emit_expression(expr, m.get(0).unwrap().start(), template, template_start_line, &mut seen, &mut out);
    }
    for m in component_tag_re().captures_iter(template) {
        let name = m[1].to_string();
        if seen.insert(name.clone()) {
            let line = template_start_line + line_of(template, m.get(0).unwrap().start());
            out.push(RawReference::new(name, ReferenceKind::Template, line));
        }
    }

    out
}

fn emit_expression(
    expr: &str,
    byte_offset: usize,
    template: &str,
    template_start_line: u32,
    seen: &mut HashSet<String>,
    out: &mut Vec<RawReference>,
) {
    let line = template_start_line + line_of(template, byte_offset);
    for ident in identifier_re().find_iter(expr) {
        let name = ident.as_str();
        if JS_KEYWORDS.contains(&name) || name.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            continue;
        }
        if seen.insert(name.to_string()) {
            out.push(RawReference::new(name, ReferenceKind::Template, line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mustache_expression_emits_template_reference() {
        let refs = scan_template("<p>{{ handleClick }}</p>", 1);
        assert!(refs.iter().any(|r| r.target_name == "handleClick" && r.kind == ReferenceKind::Template));
    }

    #[test]
    fn event_handler_attribute_is_scanned() {
        let refs = scan_template(r#"<button @click="handleClick">go</button>"#, 1);
        assert!(refs.iter().any(|r| r.target_name == "handleClick"));
    }

    #[test]
    fn pascal_case_tag_is_component_reference() {
        let refs = scan_template("<div><Foo :bar=\"baz\" /></div>", 1);
        assert!(refs.iter().any(|r| r.target_name == "Foo"));
    }

    #[test]
    fn each_name_emitted_at_most_once() {
        let refs = scan_template("{{ x }} {{ x }} {{ x }}", 1);
        assert_eq!(refs.iter().filter(|r| r.target_name == "x").count(), 1);
    }
}
