//! Single-file-component preprocessing for `.vue`/`.svelte` sources
//! (spec §4.2).
//!
//! Two independent passes over the raw text: [`blank_non_script`] keeps
//! line numbers stable by replacing every non-script byte with a
//! newline-preserving blank, and [`extract_template`] pulls the
//! outermost `<template>` block via depth-counted tag matching.

use crate::types::SymbolKind;

/// The effective host-language grammar chosen by a `<script>` block's
/// `lang` attribute (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLang {
    JavaScript,
    TypeScript,
}

pub struct ScriptBlock {
    pub lang: ScriptLang,
    pub start_line: u32,
}

/// Replaces every byte outside `<script>...</script>` bodies with a
/// space, except newlines which are preserved, so the host parser sees
/// clean script text at the original line numbers.
pub fn blank_non_script(source: &str) -> (String, Vec<ScriptBlock>) {
    let mut blanked = String::with_capacity(source.len());
    let mut blocks = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    let mut line = 1u32;

    while i < bytes.len() {
        if let Some((open_end, lang, is_self_closing)) = match_script_open(source, i) {
            if is_self_closing {
                blanked.push(' ');
                i = open_end;
                continue;
            }
            let start_line = line;
            if let Some(close_start) = source[open_end..].find("</script>") {
                let body_start = open_end;
                let body_end = open_end + close_start;
                blocks.push(ScriptBlock { lang, start_line });
                // Blank the opening tag itself.
                for _ in source[i..body_start].chars() {
                    line_safe_push(&mut blanked, ' ', &mut line);
                }
                blanked.push_str(&source[body_start..body_end]);
                line += source[body_start..body_end].matches('\n').count() as u32;
                let close_tag_end = body_end + "</script>".len();
                for _ in source[body_end..close_tag_end].chars() {
                    line_safe_push(&mut blanked, ' ', &mut line);
                }
                i = close_tag_end;
                continue;
            } else {
                // Unterminated script block: blank the rest of the file.
                for _ in source[i..].chars() {
                    line_safe_push(&mut blanked, ' ', &mut line);
                }
                i = bytes.len();
                continue;
            }
        }

        let ch = source[i..].chars().next().unwrap();
        line_safe_push(&mut blanked, ch, &mut line);
        i += ch.len_utf8();
    }

    (blanked, blocks)
}

fn line_safe_push(buf: &mut String, ch: char, line: &mut u32) {
    if ch == '\n' {
        buf.push('\n');
        *line += 1;
    } else {
        buf.push(' ');
    }
}

/// Recognizes a `<script ...>` open tag at byte offset `i`. Returns the
/// byte offset just past the `>`, the chosen language, and whether the
/// tag is self-closing (`<script />`, which opens no body).
fn match_script_open(source: &str, i: usize) -> Option<(usize, ScriptLang, bool)> {
    let rest = &source[i..];
    if !rest.starts_with("<script") {
        return None;
    }
    let after_tag_name = &rest[7..];
    // Must be followed by whitespace, `>`, or `/` — not e.g. `<scripting>`.
    if !after_tag_name
        .chars()
        .next()
        .map(|c| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(false)
    {
        return None;
    }
    let tag_end = rest.find('>')?;
    let tag_text = &rest[..tag_end];
    let is_self_closing = tag_text.trim_end().ends_with('/');
    let lang = if tag_text.contains("lang=\"ts\"") || tag_text.contains("lang='ts'") || tag_text.contains("lang=\"typescript\"")
    {
        ScriptLang::TypeScript
    } else {
        ScriptLang::JavaScript
    };
    Some((i + tag_end + 1, lang, is_self_closing))
}

/// Extracts the outermost `<template>` block using depth-counted tag
/// matching; self-closing `<template ... />` does not open a body (spec
/// §4.2).
pub fn extract_template(source: &str) -> Option<(String, u32)> {
    let open_idx = source.find("<template")?;
    let after_open_tag_end = source[open_idx..].find('>')? + open_idx;
    let open_tag = &source[open_idx..=after_open_tag_end];
    if open_tag.trim_end_matches('>').trim_end().ends_with('/') {
        return None;
    }

    let body_start = after_open_tag_end + 1;
    let start_line = source[..open_idx].matches('\n').count() as u32 + 1;

    let mut depth = 1i32;
    let mut cursor = body_start;
    while depth > 0 {
        let next_open = source[cursor..].find("<template").map(|p| p + cursor);
        let next_close = source[cursor..].find("</template>").map(|p| p + cursor);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                // Only count as nested open if it's a real tag start, not part of a larger word.
                let tail = &source[o + "<template".len()..];
                if tail.starts_with(|ch: char| ch.is_whitespace() || ch == '>' || ch == '/') {
                    let tag_end = source[o..].find('>').map(|p| p + o).unwrap_or(o);
                    let is_self_closing = source[o..=tag_end].trim_end_matches('>').trim_end().ends_with('/');
                    if !is_self_closing {
                        depth += 1;
                    }
                    cursor = tag_end + 1;
                } else {
                    cursor = o + "<template".len();
                }
            }
            (_, Some(c)) => {
                depth -= 1;
                if depth == 0 {
                    return Some((source[body_start..c].to_string(), start_line));
                }
                cursor = c + "</template>".len();
            }
            _ => return None,
        }
    }
    None
}

/// Synthetic symbol kind label used when a Vue/Svelte template reference
/// has no owning script symbol to attach to (module-scope fallback is
/// still the resolver's job; the `Module` kind here only documents what
/// this file contributes when nothing else does).
pub const TEMPLATE_OWNER_KIND: SymbolKind = SymbolKind::Module;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_non_script_preserves_line_numbers() {
        let source = "<template>\n<div/>\n</template>\n<script>\nfunction a() {}\n</script>\n";
        let (blanked, blocks) = blank_non_script(source);
        assert_eq!(blanked.matches('\n').count(), source.matches('\n').count());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lang, ScriptLang::JavaScript);
        assert!(blanked.contains("function a() {}"));
    }

    #[test]
    fn typescript_lang_attribute_is_detected() {
        let source = "<script lang=\"ts\">\nconst x: number = 1;\n</script>\n";
        let (_, blocks) = blank_non_script(source);
        assert_eq!(blocks[0].lang, ScriptLang::TypeScript);
    }

    #[test]
    fn extract_template_finds_outermost_block() {
        let source = "<template>\n<div><template-thing/></div>\n</template>\n<script></script>\n";
        let (text, start_line) = extract_template(source).unwrap();
        assert!(text.contains("<div>"));
        assert_eq!(start_line, 1);
    }

    #[test]
    fn self_closing_template_tag_is_not_a_block() {
        let source = "<template />\n<script></script>\n";
        assert!(extract_template(source).is_none());
    }
}
