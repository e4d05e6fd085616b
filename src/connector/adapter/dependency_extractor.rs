use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use streaming_iterator::StreamingIterator;
use tracing::{debug, warn};
use tree_sitter::{Parser, Query, QueryCursor};

use crate::domain::Language;

/// One entry in the static language table (§4.2): which suffixes the
/// language owns, its compiled query, the capture whose text is the raw
/// import string, and an optional second capture used purely to filter
/// matches (e.g. "only keep this `(string)` when the call's callee is
/// named `require`"). Matching `#eq?`-style query predicates is done here
/// in plain Rust rather than via tree-sitter predicate syntax, following
/// the corpus's existing capture-name-dispatch idiom rather than the
/// predicate-evaluation API.
struct LanguageDefinition {
    language: Language,
    ts_language: fn() -> tree_sitter::Language,
    query_source: &'static str,
    capture_name: &'static str,
    filter_capture: Option<&'static str>,
    filter_values: &'static [&'static str],
}

fn language_table() -> Vec<LanguageDefinition> {
    vec![
        LanguageDefinition {
            language: Language::Python,
            ts_language: || tree_sitter_python::LANGUAGE.into(),
            query_source: r#"
                (import_statement name: (dotted_name) @import)
                (import_statement name: (aliased_import name: (dotted_name) @import))
                (import_from_statement module_name: (dotted_name) @import)
                (import_from_statement module_name: (relative_import) @import)
            "#,
            capture_name: "import",
            filter_capture: None,
            filter_values: &[],
        },
        LanguageDefinition {
            language: Language::JavaScript,
            ts_language: || tree_sitter_javascript::LANGUAGE.into(),
            query_source: JS_TS_QUERY,
            capture_name: "import",
            filter_capture: Some("callee"),
            filter_values: &["require"],
        },
        LanguageDefinition {
            language: Language::TypeScript,
            ts_language: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            query_source: JS_TS_QUERY,
            capture_name: "import",
            filter_capture: Some("callee"),
            filter_values: &["require"],
        },
        LanguageDefinition {
            language: Language::C,
            ts_language: || tree_sitter_c::LANGUAGE.into(),
            query_source: r#"
                (preproc_include path: (string_literal) @import)
                (preproc_include path: (system_lib_string) @import)
            "#,
            capture_name: "import",
            filter_capture: None,
            filter_values: &[],
        },
        LanguageDefinition {
            language: Language::Cpp,
            ts_language: || tree_sitter_cpp::LANGUAGE.into(),
            query_source: r#"
                (preproc_include path: (string_literal) @import)
                (preproc_include path: (system_lib_string) @import)
            "#,
            capture_name: "import",
            filter_capture: None,
            filter_values: &[],
        },
        LanguageDefinition {
            language: Language::CSharp,
            ts_language: || tree_sitter_c_sharp::LANGUAGE.into(),
            query_source: r#"
                (using_directive name: (_) @import)
            "#,
            capture_name: "import",
            filter_capture: None,
            filter_values: &[],
        },
        LanguageDefinition {
            language: Language::Html,
            ts_language: || tree_sitter_html::LANGUAGE.into(),
            query_source: r#"
                (attribute
                  (attribute_name) @attr_name
                  (quoted_attribute_value (attribute_value) @import))
            "#,
            capture_name: "import",
            filter_capture: Some("attr_name"),
            filter_values: &["href", "src"],
        },
        LanguageDefinition {
            language: Language::Css,
            ts_language: || tree_sitter_css::LANGUAGE.into(),
            query_source: r#"
                (import_statement (string_value) @import)
                (import_statement (call_expression (arguments (plain_value) @import)))
                (import_statement (call_expression (arguments (string_value) @import)))
                (call_expression
                  (function_name) @callee
                  (arguments (plain_value) @import))
                (call_expression
                  (function_name) @callee
                  (arguments (string_value) @import))
            "#,
            capture_name: "import",
            filter_capture: Some("callee"),
            filter_values: &["url"],
        },
    ]
}

const JS_TS_QUERY: &str = r#"
    (import_statement source: (string) @import)
    (export_statement source: (string) @import)
    (call_expression
      function: (identifier) @callee
      arguments: (arguments (string) @import))
"#;

struct CompiledLanguage {
    ts_language: tree_sitter::Language,
    query: Query,
    capture_idx: u32,
    filter_idx: Option<u32>,
    filter_values: &'static [&'static str],
}

/// Per-language syntactic extraction of raw import strings (§4.2). Each
/// definition is compiled once at construction; a definition whose query
/// fails to compile is logged and excluded, leaving the rest of the table
/// functional.
pub struct TreeSitterDependencyExtractor {
    compiled: HashMap<&'static str, CompiledLanguage>,
}

impl TreeSitterDependencyExtractor {
    pub fn new() -> Self {
        let mut compiled = HashMap::new();
        for def in language_table() {
            let ts_language = (def.ts_language)();
            let query = match Query::new(&ts_language, def.query_source) {
                Ok(q) => q,
                Err(e) => {
                    warn!(language = %def.language, error = %e, "dependency extractor: failed to compile query, excluding language");
                    continue;
                }
            };
            let capture_idx = match query.capture_index_for_name(def.capture_name) {
                Some(i) => i,
                None => {
                    warn!(language = %def.language, "dependency extractor: capture name not found in compiled query");
                    continue;
                }
            };
            let filter_idx = def
                .filter_capture
                .and_then(|name| query.capture_index_for_name(name));
            compiled.insert(
                def.language.as_str(),
                CompiledLanguage {
                    ts_language,
                    query,
                    capture_idx,
                    filter_idx,
                    filter_values: def.filter_values,
                },
            );
        }
        Self { compiled }
    }

    /// Given a file path whose suffix maps to a known language, return the
    /// set of raw import strings textually present in the file (§4.2).
    /// Never fatal: unsupported suffixes, unreadable files, and parse
    /// failures all yield the empty set.
    pub fn extract(&self, path: &Path) -> HashSet<String> {
        let language = match Language::from_path(path) {
            Some(l) => l,
            None => return HashSet::new(),
        };
        let compiled = match self.compiled.get(language.as_str()) {
            Some(c) => c,
            None => return HashSet::new(),
        };

        let content = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "dependency extractor: failed to read file");
                return HashSet::new();
            }
        };

        let mut parser = Parser::new();
        if parser.set_language(&compiled.ts_language).is_err() {
            return HashSet::new();
        }
        let tree = match parser.parse(&content, None) {
            Some(t) => t,
            None => {
                warn!(path = %path.display(), "dependency extractor: parse produced no tree");
                return HashSet::new();
            }
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&compiled.query, tree.root_node(), content.as_slice());

        let mut imports = HashSet::new();
        while let Some(m) = matches.next() {
            // A match only needs to satisfy the filter when the filter capture is
            // actually present in it — several patterns in the same query (e.g.
            // plain `import`/`export from`) never bind `@callee`/`@attr_name` at
            // all, and those matches pass through unfiltered.
            let filter_ok = match compiled.filter_idx.and_then(|filter_idx| {
                m.captures.iter().find(|c| c.index == filter_idx)
            }) {
                None => true,
                Some(capture) => capture
                    .node
                    .utf8_text(&content)
                    .map(|text| compiled.filter_values.contains(&text))
                    .unwrap_or(false),
            };
            if !filter_ok {
                continue;
            }
            for capture in m.captures.iter().filter(|c| c.index == compiled.capture_idx) {
                let Ok(text) = capture.node.utf8_text(&content) else {
                    continue;
                };
                imports.insert(clean_capture(text));
            }
        }
        debug!(path = %path.display(), count = imports.len(), "extracted raw imports");
        imports
    }
}

impl Default for TreeSitterDependencyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip surrounding single/double quotes; angle-bracketed C/C++ system
/// includes are left untouched since the brackets are informative (§4.2).
fn clean_capture(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn python_import_and_from_import() {
        let extractor = TreeSitterDependencyExtractor::new();
        let file = write_temp(".py", "import b\nfrom . import c\nfrom ..pkg import d\n");
        let imports = extractor.extract(file.path());
        assert!(imports.contains("b"));
        assert!(imports.iter().any(|s| s.starts_with('.')));
    }

    #[test]
    fn javascript_import_export_and_require() {
        let extractor = TreeSitterDependencyExtractor::new();
        let file = write_temp(
            ".js",
            "import x from './a';\nexport { y } from './b';\nconst z = require('./c');\n",
        );
        let imports = extractor.extract(file.path());
        assert!(imports.contains("./a"));
        assert!(imports.contains("./b"));
        assert!(imports.contains("./c"));
    }

    #[test]
    fn require_filter_excludes_other_calls() {
        let extractor = TreeSitterDependencyExtractor::new();
        let file = write_temp(".js", "const z = notRequire('./c');\n");
        let imports = extractor.extract(file.path());
        assert!(!imports.contains("./c"));
    }

    #[test]
    fn c_include_preserves_angle_brackets() {
        let extractor = TreeSitterDependencyExtractor::new();
        let file = write_temp(".c", "#include <stdio.h>\n#include \"local.h\"\n");
        let imports = extractor.extract(file.path());
        assert!(imports.contains("<stdio.h>"));
        assert!(imports.contains("local.h"));
    }

    #[test]
    fn unsupported_suffix_yields_empty_set() {
        let extractor = TreeSitterDependencyExtractor::new();
        let file = write_temp(".txt", "import b\n");
        assert!(extractor.extract(file.path()).is_empty());
    }
}
