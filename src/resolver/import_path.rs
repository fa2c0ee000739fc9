//! Import-path normalization (spec §4.4): aliases stripped, relative
//! prefixes removed, file extensions dropped, so a literal import
//! specifier can be compared against a stored file path.

const KNOWN_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".vue", ".svelte"];

/// Salesforce's own import prefixes get a dedicated matcher upstream
/// (the resolver recognizes `@salesforce/apex/`, `@salesforce/schema/`,
/// `@salesforce/label/` targets directly via their fully-qualified
/// target name), so this normalizer only needs the generic
/// `@/` → `src/` alias and relative-path stripping used by everything
/// else.
pub fn normalize_import_path(path: &str) -> String {
    let mut normalized = path.to_string();

    if let Some(rest) = normalized.strip_prefix("@/") {
        normalized = format!("src/{rest}");
    }

    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    while let Some(rest) = normalized.strip_prefix("../") {
        normalized = rest.to_string();
    }

    for ext in KNOWN_EXTENSIONS {
        if let Some(stripped) = normalized.strip_suffix(ext) {
            normalized = stripped.to_string();
            break;
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_alias_and_extension() {
        assert_eq!(normalize_import_path("@/components/Foo.vue"), "src/components/Foo");
    }

    #[test]
    fn strips_relative_prefixes() {
        assert_eq!(normalize_import_path("../../utils/helpers.js"), "utils/helpers");
    }

    #[test]
    fn leaves_plain_module_specifiers_alone() {
        assert_eq!(normalize_import_path("lodash"), "lodash");
    }
}
