//! Parser coordinator (spec §4.2): extension/path dispatch, lenient
//! file reads, and failure-category counting.

use super::{generic, javascript, salesforce, sfc, vue, ExtractionResult, Grammar};
use tree_sitter::{Parser, Tree};

#[derive(Debug, Default, Clone, Copy)]
pub struct FailureCounters {
    pub no_grammar: u32,
    pub parse_error: u32,
    pub unreadable: u32,
}

pub struct FileExtraction {
    pub language: &'static str,
    pub line_count: u32,
    pub result: ExtractionResult,
}

/// Reads `bytes` as UTF-8, falling back to a lossy decode rather than
/// counting the file as unreadable — only a decode that produces no
/// usable text at all is "unreadable" (spec §4.2).
fn read_lenient(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn line_count(source: &str) -> u32 {
    source.matches('\n').count() as u32 + 1
}

fn file_stem(path: &str) -> String {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .split('.')
        .next()
        .unwrap_or(path)
        .to_string()
}

fn parse_js_ts(source: &str, grammar: Grammar) -> Option<Tree> {
    let mut parser = Parser::new();
    let language = match grammar {
        Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        _ => tree_sitter_javascript::LANGUAGE.into(),
    };
    parser.set_language(&language).ok()?;
    parser.parse(source, None)
}

fn dialect_for_path(path: &str) -> Option<&'static generic::MarkupDialect> {
    let lower = path.to_lowercase();
    if lower.ends_with(".page") || lower.ends_with(".component") {
        Some(&generic::VISUALFORCE)
    } else if lower.ends_with(".cmp") || lower.ends_with(".app") || lower.ends_with(".evt") {
        Some(&generic::AURA)
    } else {
        None
    }
}

/// Extracts symbols and references for one file. Returns `None` when the
/// file has no registered grammar or fails to parse, after recording the
/// appropriate failure category in `counters` (spec §4.2). Bytes that
/// cannot be read at all by the caller should be counted as
/// `counters.unreadable` before this is even called.
pub fn extract_file(path: &str, bytes: &[u8], counters: &mut FailureCounters) -> Option<FileExtraction> {
    let Some(grammar) = super::grammar_for_path(path) else {
        counters.no_grammar += 1;
        return None;
    };
    let source = read_lenient(bytes);
    let line_count = line_count(&source);

    let result = match grammar {
        Grammar::JavaScript | Grammar::TypeScript => {
            let Some(tree) = parse_js_ts(&source, grammar) else {
                counters.parse_error += 1;
                return None;
            };
            javascript::extract(&tree, source.as_bytes())
        }
        Grammar::Vue | Grammar::Svelte => extract_sfc(&source, counters),
        Grammar::ApexClass | Grammar::ApexTrigger => salesforce::apex::extract(&source),
        Grammar::SalesforceMetaXml => salesforce::sfxml::extract(&source, &file_stem(path)),
        Grammar::Generic => {
            let dialect = dialect_for_path(path).unwrap_or(&generic::VISUALFORCE);
            generic::extract(&source, dialect, &file_stem(path))
        }
    };

    Some(FileExtraction {
        language: grammar.language_tag(),
        line_count,
        result,
    })
}

fn extract_sfc(source: &str, counters: &mut FailureCounters) -> ExtractionResult {
    let (blanked, blocks) = sfc::blank_non_script(source);
    let script_grammar = match blocks.first().map(|b| b.lang) {
        Some(sfc::ScriptLang::TypeScript) => Grammar::TypeScript,
        _ => Grammar::JavaScript,
    };

    let mut result = match parse_js_ts(&blanked, script_grammar) {
        Some(tree) => javascript::extract(&tree, blanked.as_bytes()),
        None => {
            counters.parse_error += 1;
            ExtractionResult::default()
        }
    };

    if let Some((template, start_line)) = sfc::extract_template(source) {
        result.references.extend(vue::scan_template(&template, start_line));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_increments_no_grammar() {
        let mut counters = FailureCounters::default();
        let result = extract_file("README.md", b"hello", &mut counters);
        assert!(result.is_none());
        assert_eq!(counters.no_grammar, 1);
    }

    #[test]
    fn javascript_file_is_extracted() {
        let mut counters = FailureCounters::default();
        let result = extract_file("src/a.js", b"function a() {}\n", &mut counters).unwrap();
        assert_eq!(result.language, "javascript");
        assert!(result.result.symbols.iter().any(|s| s.name == "a"));
        assert_eq!(counters.no_grammar, 0);
    }

    #[test]
    fn vue_sfc_combines_script_and_template_references() {
        let source = "<template>\n<button @click=\"handleClick\">go</button>\n</template>\n<script setup>\nfunction handleClick() {}\n</script>\n";
        let mut counters = FailureCounters::default();
        let result = extract_file("src/Comp.vue", source.as_bytes(), &mut counters).unwrap();
        assert!(result.result.symbols.iter().any(|s| s.name == "handleClick"));
        assert!(result
            .result
            .references
            .iter()
            .any(|r| r.target_name == "handleClick" && r.kind == crate::model::ReferenceKind::Template));
    }
}
