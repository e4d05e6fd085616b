use std::path::Path;

/// One of the source languages the dependency extractor knows how to parse.
///
/// This is deliberately a closed, small set: semantic resolution and
/// cross-language linking are out of scope, so there is no "Unknown" catch-all
/// variant here the way a general-purpose chunker would have one — a file
/// whose suffix isn't recognised simply never produces a [`Language`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    C,
    Cpp,
    CSharp,
    Html,
    Css,
}

impl Language {
    /// Suffixes (without the leading dot) owned by this language.
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "hpp", "cc", "hh", "cxx", "hxx"],
            Language::CSharp => &["cs"],
            Language::Html => &["html", "htm"],
            Language::Css => &["css"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "c-sharp",
            Language::Html => "html",
            Language::Css => "css",
        }
    }

    /// All languages the extractor table covers.
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::C,
            Language::Cpp,
            Language::CSharp,
            Language::Html,
            Language::Css,
        ]
    }

    /// Resolve the language owning a file's suffix, if any.
    pub fn from_suffix(suffix: &str) -> Option<Language> {
        let suffix = suffix.to_lowercase();
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.suffixes().contains(&suffix.as_str()))
    }

    /// Resolve the language owning a file's path, if any.
    pub fn from_path(path: &Path) -> Option<Language> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_suffix)
    }

    /// Extensions attempted when resolving an extension-less relative
    /// import: `.py`, `.ts`, `.js`, `.jsx`, `.tsx` in that order.
    pub fn relative_import_suffixes() -> &'static [&'static str] {
        &["py", "ts", "js", "jsx", "tsx"]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_suffix_covers_the_language_table() {
        assert_eq!(Language::from_suffix("py"), Some(Language::Python));
        assert_eq!(Language::from_suffix("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_suffix("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_suffix("hpp"), Some(Language::Cpp));
        assert_eq!(Language::from_suffix("h"), Some(Language::C));
        assert_eq!(Language::from_suffix("cs"), Some(Language::CSharp));
        assert_eq!(Language::from_suffix("htm"), Some(Language::Html));
        assert_eq!(Language::from_suffix("css"), Some(Language::Css));
        assert_eq!(Language::from_suffix("rs"), None);
    }

    #[test]
    fn from_path_uses_extension() {
        assert_eq!(
            Language::from_path(Path::new("src/main.py")),
            Some(Language::Python)
        );
        assert_eq!(Language::from_path(Path::new("README")), None);
    }
}
