//! Tier-2 generic extractor (SPEC_FULL §B): a thin markup tag-to-reference
//! scanner reused for Visualforce and Aura, sharing the same regex
//! approach already built for SFC templates ([`super::vue`]) and
//! Salesforce XML ([`super::salesforce::sfxml`]) rather than bespoke
//! per-framework modules.

use super::{ExtractionResult, RawReference, RawSymbol};
use crate::model::ReferenceKind;
use crate::types::{LineRange, SymbolKind};
use regex::Regex;
use std::sync::OnceLock;

/// A markup dialect's tag-reference convention: a namespace prefix
/// (`apex:`, `aura:`, `lightning:`, `c:`) treated as a component
/// reference, plus the attribute name (if any) that carries a
/// controller/handler reference instead of a tag reference.
pub struct MarkupDialect {
    pub name: &'static str,
    pub component_prefixes: &'static [&'static str],
    pub controller_attr: Option<&'static str>,
}

pub const VISUALFORCE: MarkupDialect = MarkupDialect {
    name: "visualforce",
    component_prefixes: &["apex:", "c:"],
    controller_attr: Some("controller"),
};

pub const AURA: MarkupDialect = MarkupDialect {
    name: "aura",
    component_prefixes: &["aura:", "lightning:", "c:"],
    controller_attr: Some("controller"),
};

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?([A-Za-z][\w-]*:[A-Za-z][\w-]*)\b").unwrap())
}

fn attr_re(attr_name: &str) -> Regex {
    Regex::new(&format!(r#"\b{attr_name}="([^"]*)""#)).unwrap()
}

fn line_of(source: &str, byte_offset: usize) -> u32 {
    source[..byte_offset.min(source.len())].matches('\n').count() as u32 + 1
}

/// Scans markup for component tag references matching `dialect`'s
/// prefixes and, when present, a controller attribute reference. Unlike
/// [`super::vue::scan_template`] this has no companion script to tie
/// bindings back to, so every match is emitted as a component reference
/// (`ReferenceKind::Template`) with no source-symbol hint — the resolver
/// falls back to line containment.
pub fn extract(source: &str, dialect: &MarkupDialect, file_stem: &str) -> ExtractionResult {
    let mut references = Vec::new();

    for m in tag_re().captures_iter(source) {
        let tag = &m[1];
        if dialect.component_prefixes.iter().any(|p| tag.starts_with(p)) {
            let line = line_of(source, m.get(0).unwrap().start());
            references.push(RawReference::new(tag, ReferenceKind::Template, line));
        }
    }

    if let Some(attr) = dialect.controller_attr {
        for m in attr_re(attr).captures_iter(source) {
            let line = line_of(source, m.get(0).unwrap().start());
            references.push(RawReference::new(&m[1], ReferenceKind::Reference, line));
        }
    }

    // One file-level symbol stands in for the page/component itself, so
    // the resolver's module-scope fallback has something to attach these
    // references to (spec §4.4).
    let symbols = vec![RawSymbol::new(
        file_stem,
        SymbolKind::Module,
        LineRange::new(1, source.matches('\n').count() as u32 + 1),
    )
    .with_visibility(crate::types::Visibility::Public)
    .exported(true)];

    ExtractionResult { symbols, references }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visualforce_component_tags_are_references() {
        let source = r#"<apex:page controller="CloudinaryController"><apex:outputText value="{!greeting}"/></apex:page>"#;
        let result = extract(source, &VISUALFORCE, "GreetingPage");
        assert!(result.references.iter().any(|r| r.target_name == "apex:page"));
        assert!(result.references.iter().any(|r| r.target_name == "CloudinaryController"));
    }

    #[test]
    fn aura_component_tags_are_references() {
        let source = r#"<aura:component><lightning:button label="Go"/></aura:component>"#;
        let result = extract(source, &AURA, "MyCmp");
        assert!(result.references.iter().any(|r| r.target_name == "aura:component"));
        assert!(result.references.iter().any(|r| r.target_name == "lightning:button"));
    }
}
