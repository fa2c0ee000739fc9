//! Salesforce metadata XML extractor (spec §4.3 "Salesforce XML
//! metadata"). Tag-driven, not schema-validated: a fixed tag-to-kind map
//! plus always-reference / context-dependent reference tag sets and a
//! formula-text regex pass.

use super::super::{ExtractionResult, RawReference, RawSymbol};
use crate::model::ReferenceKind;
use crate::types::{LineRange, SymbolKind};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::OnceLock;

fn element_kind(tag: &str) -> Option<SymbolKind> {
    match tag {
        "CustomObject" | "ApexClass" => Some(SymbolKind::Class),
        "fields" => Some(SymbolKind::Field),
        "validationRules" => Some(SymbolKind::Property),
        "Flow" | "Profile" | "PermissionSet" | "LightningComponentBundle" => Some(SymbolKind::Module),
        "CustomLabel" => Some(SymbolKind::Constant),
        _ => None,
    }
}

const ALWAYS_REFERENCE_TAGS: &[&str] = &[
    "apexClass",
    "apexPage",
    "referenceTo",
    "customObject",
    "relationshipName",
    "actionName",
    "flowName",
];

/// `(tag, required_ancestor)`: the tag is a reference only when nested
/// inside `required_ancestor` somewhere up the stack (spec §4.3, e.g.
/// `<field>` inside `<fieldPermissions>`).
const CONTEXT_REFERENCE_TAGS: &[(&str, &str)] = &[
    ("field", "fieldPermissions"),
    ("object", "objectPermissions"),
];

const FORMULA_TAGS: &[&str] = &["formula", "formulaText", "errorConditionFormula"];

const NAME_SOURCE_TAGS: &[&str] = &["fullName", "apiName", "label", "masterLabel"];

fn formula_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*__c\b").unwrap())
}

struct OpenRecord {
    tag: String,
    kind: SymbolKind,
    name: Option<String>,
    start_line: u32,
}

pub fn extract(source: &str, file_stem: &str) -> ExtractionResult {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut symbols = Vec::new();
    let mut references = Vec::new();
    let mut tag_stack: Vec<String> = Vec::new();
    let mut records: Vec<OpenRecord> = Vec::new();
    let mut current_tag: Option<String> = None;
    let mut in_action_calls = false;
    let mut action_name: Option<String> = None;
    let mut action_type: Option<String> = None;

    loop {
        let line = source[..reader.buffer_position().min(source.len())].matches('\n').count() as u32 + 1;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if name == "actionCalls" {
                    in_action_calls = true;
                    action_name = None;
                    action_type = None;
                }
                if let Some(kind) = element_kind(&name) {
                    records.push(OpenRecord {
                        tag: name.clone(),
                        kind,
                        name: None,
                        start_line: line,
                    });
                }
                tag_stack.push(name.clone());
                current_tag = Some(name);
            }
            Ok(Event::Empty(_)) => {
                // Self-closing elements carry no text; nothing to extract.
            }
            Ok(Event::Text(t)) => {
                let Ok(raw) = t.unescape() else { continue };
                let text = raw.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                let Some(tag) = current_tag.clone() else { continue };

                if in_action_calls {
                    if tag == "name" {
                        action_name = Some(text.clone());
                    } else if tag == "actionType" {
                        action_type = Some(text.clone());
                    }
                }

                if NAME_SOURCE_TAGS.contains(&tag.as_str()) {
                    if let Some(record) = records.last_mut().filter(|r| r.name.is_none()) {
                        record.name = Some(text.clone());
                    }
                }

                if ALWAYS_REFERENCE_TAGS.contains(&tag.as_str()) {
                    references.push(RawReference::new(text.clone(), ReferenceKind::Reference, line));
                } else if let Some(&(_, ancestor)) = CONTEXT_REFERENCE_TAGS
                    .iter()
                    .find(|(t, _)| *t == tag)
                {
                    if tag_stack.iter().any(|t| t == ancestor) {
                        references.push(RawReference::new(text.clone(), ReferenceKind::Reference, line));
                    }
                }

                if FORMULA_TAGS.contains(&tag.as_str()) {
                    for m in formula_field_re().find_iter(&text) {
                        references.push(RawReference::new(m.as_str(), ReferenceKind::Reference, line));
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(&e);
                if name == "actionCalls" {
                    if action_type.as_deref() == Some("apex") {
                        if let Some(handler) = action_name.clone() {
                            references.push(RawReference::new(handler, ReferenceKind::Call, line));
                        }
                    }
                    in_action_calls = false;
                }
                if records.last().map(|r| r.tag == name).unwrap_or(false) {
                    let record = records.pop().unwrap();
                    let symbol_name = record.name.unwrap_or_else(|| file_stem.to_string());
                    symbols.push(RawSymbol::new(symbol_name, record.kind, LineRange::single(record.start_line)));
                }
                tag_stack.pop();
                current_tag = tag_stack.last().cloned();
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    ExtractionResult { symbols, references }
}

fn local_name(e: &quick_xml::events::BytesStart) -> String {
    let name = e.name();
    let full = String::from_utf8_lossy(name.as_ref());
    full.rsplit(':').next().unwrap_or(&full).to_string()
}
