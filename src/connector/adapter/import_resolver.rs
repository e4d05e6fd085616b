use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::domain::{file_id, FileId, Language};

/// Suffixes stripped for comparison purposes in the exact-id-match strategy
/// (§4.3 strategy 2). Listed explicitly rather than derived from
/// [`Language::all`] because the comparison is deliberately narrow.
const COMPARISON_SUFFIXES: &[&str] = &[".js", ".ts", ".css"];

/// Maps raw import strings (§4.2 output) to in-project file ids, favouring
/// empty resolution over speculative matches. Caches `(raw_import,
/// source_file)` results for the life of one index build (§4.3).
pub struct ImportResolver {
    cache: HashMap<(String, PathBuf), HashSet<FileId>>,
}

impl ImportResolver {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Resolve `raw_import`, found in `source_abs_path` (whose id is
    /// `source_id`), against the known project files. `known` maps every
    /// tracked file id to its absolute path; `project_root` is used to turn
    /// resolved absolute paths back into ids.
    pub fn resolve(
        &mut self,
        raw_import: &str,
        source_abs_path: &Path,
        source_id: &FileId,
        project_root: &Path,
        known: &HashMap<FileId, PathBuf>,
    ) -> HashSet<FileId> {
        let key = (raw_import.to_string(), source_abs_path.to_path_buf());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let mut resolved = HashSet::new();
        let is_relative = raw_import.starts_with('.') || raw_import.starts_with('/');
        if is_relative {
            resolved.extend(resolve_relative(raw_import, source_abs_path, project_root));
        } else {
            resolved.extend(resolve_exact_id(raw_import, known));
            if raw_import.contains('.') {
                resolved.extend(resolve_last_segment(raw_import, known));
            }
        }
        resolved.remove(source_id);

        self.cache.insert(key, resolved.clone());
        resolved
    }
}

impl Default for ImportResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Strategy 1 (§4.3): relative imports, both slash-delimited (JavaScript /
/// TypeScript style) and dot-delimited (Python style) remainders.
fn resolve_relative(raw_import: &str, source_abs_path: &Path, project_root: &Path) -> HashSet<FileId> {
    let mut out = HashSet::new();
    let Some(source_dir) = source_abs_path.parent() else {
        return out;
    };

    let leading_dots = raw_import.chars().take_while(|&c| c == '.').count();
    let ascend = leading_dots.saturating_sub(1);

    let mut base_dir = source_dir.to_path_buf();
    for _ in 0..ascend {
        if let Some(parent) = base_dir.parent() {
            base_dir = parent.to_path_buf();
        } else {
            break;
        }
    }

    let remainder = raw_import
        .trim_start_matches('.')
        .trim_start_matches('/')
        .to_string();

    let has_known_suffix = Language::all()
        .iter()
        .flat_map(|l| l.suffixes())
        .any(|s| remainder.ends_with(&format!(".{s}")));

    if remainder.is_empty() {
        try_candidate(&base_dir.join("__init__.py"), source_abs_path, project_root, &mut out);
        return out;
    }

    let remainder_path: PathBuf = if remainder.contains('/') {
        remainder.split('/').collect()
    } else if remainder.contains('.') && !has_known_suffix {
        remainder.split('.').collect()
    } else {
        PathBuf::from(&remainder)
    };

    let candidate_base = base_dir.join(&remainder_path);

    if has_known_suffix {
        try_candidate(&candidate_base, source_abs_path, project_root, &mut out);
        return out;
    }

    for suffix in Language::relative_import_suffixes() {
        let candidate = with_extension_appended(&candidate_base, suffix);
        try_candidate(&candidate, source_abs_path, project_root, &mut out);
    }
    try_candidate(
        &candidate_base.join("__init__.py"),
        source_abs_path,
        project_root,
        &mut out,
    );

    out
}

fn with_extension_appended(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push('.');
    name.push_str(suffix);
    match base.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

fn try_candidate(candidate: &Path, source_abs_path: &Path, project_root: &Path, out: &mut HashSet<FileId>) {
    if !candidate.exists() {
        return;
    }
    if candidate == source_abs_path {
        return;
    }
    out.insert(file_id(project_root, candidate));
}

/// Strategy 2 (§4.3): exact project-id match, with the bare-single-segment
/// guard against matching files in subdirectories.
fn resolve_exact_id(raw_import: &str, known: &HashMap<FileId, PathBuf>) -> HashSet<FileId> {
    let mut out = HashSet::new();
    let is_bare = !raw_import.contains('.') && !raw_import.contains('/');
    let normalized = strip_comparison_suffix(raw_import).replace('.', "/");

    for id in known.keys() {
        let id_no_ext = strip_extension(id);
        if is_bare && id_no_ext.contains('/') {
            continue;
        }
        if normalized == id_no_ext {
            out.insert(id.clone());
        }
    }
    out
}

/// Strategy 3 (§4.3): last-segment match for dotted absolute imports.
fn resolve_last_segment(raw_import: &str, known: &HashMap<FileId, PathBuf>) -> HashSet<FileId> {
    let mut out = HashSet::new();
    let Some(last_segment) = raw_import.rsplit('.').next() else {
        return out;
    };
    for id in known.keys() {
        let base_name = strip_extension(basename(id));
        if base_name == last_segment {
            out.insert(id.clone());
        }
    }
    out
}

fn strip_comparison_suffix(raw_import: &str) -> String {
    for suffix in COMPARISON_SUFFIXES {
        if let Some(stripped) = raw_import.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    raw_import.to_string()
}

fn strip_extension(id: &str) -> String {
    match id.rfind('.') {
        Some(dot) if !id[dot + 1..].contains('/') => id[..dot].to_string(),
        _ => id.to_string(),
    }
}

fn basename(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}
