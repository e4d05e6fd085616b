use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::{file_id, FileId};

use super::dependency_extractor::TreeSitterDependencyExtractor;
use super::import_resolver::ImportResolver;

/// V and E over project files, with direct and transitive query support
/// (§4.4). Edges point from a file to the files it imports.
pub struct DependencyGraph {
    project_root: PathBuf,
    files: HashMap<FileId, PathBuf>,
    edges: HashMap<FileId, HashSet<FileId>>,
    reverse_edges: HashMap<FileId, HashSet<FileId>>,
    extractor: TreeSitterDependencyExtractor,
    resolver: ImportResolver,
}

impl DependencyGraph {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            files: HashMap::new(),
            edges: HashMap::new(),
            reverse_edges: HashMap::new(),
            extractor: TreeSitterDependencyExtractor::new(),
            resolver: ImportResolver::new(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Infer a project root from the longest common directory prefix of
    /// `paths`, used by [`DependencyGraph::build`] when no root is supplied.
    pub fn infer_root<'a>(paths: impl Iterator<Item = &'a Path>) -> PathBuf {
        let mut common: Option<Vec<std::ffi::OsString>> = None;
        for path in paths {
            let dir = path.parent().unwrap_or(path);
            let components: Vec<_> = dir.components().map(|c| c.as_os_str().to_owned()).collect();
            common = Some(match common {
                None => components,
                Some(existing) => {
                    let len = existing
                        .iter()
                        .zip(components.iter())
                        .take_while(|(a, b)| a == b)
                        .count();
                    existing[..len].to_vec()
                }
            });
        }
        common
            .map(|parts| parts.into_iter().collect::<PathBuf>())
            .unwrap_or_default()
    }

    /// Build a graph over `abs_paths` without a caller-supplied root (§4.4
    /// "Infers a project root from the longest common directory prefix of
    /// the input set when not supplied").
    pub fn build_with_inferred_root(abs_paths: &[PathBuf]) -> Self {
        let root = Self::infer_root(abs_paths.iter().map(PathBuf::as_path));
        let mut graph = Self::new(root);
        graph.build(abs_paths);
        graph
    }

    /// Full rebuild (§4.4): clears V, E, and the file map, then repopulates
    /// from `abs_paths`, adding edges only to resolved ids already in V.
    pub fn build(&mut self, abs_paths: &[PathBuf]) {
        self.files.clear();
        self.edges.clear();
        self.reverse_edges.clear();
        self.resolver = ImportResolver::new();

        for path in abs_paths {
            let id = file_id(&self.project_root, path);
            self.files.insert(id, path.clone());
        }

        for path in abs_paths {
            let id = file_id(&self.project_root, path);
            let deps = self.resolve_file_deps(&id, path);
            self.edges.insert(id.clone(), deps.clone());
            for dep in deps {
                self.reverse_edges.entry(dep).or_default().insert(id.clone());
            }
        }
    }

    /// Ensure `id(path)` is in V, recompute its outgoing edges (§4.4).
    pub fn add_or_update_file(&mut self, abs_path: &Path) {
        let id = file_id(&self.project_root, abs_path);
        self.files.insert(id.clone(), abs_path.to_path_buf());
        self.remove_outgoing_edges(&id);

        let deps = self.resolve_file_deps(&id, abs_path);
        for dep in &deps {
            self.reverse_edges.entry(dep.clone()).or_default().insert(id.clone());
        }
        self.edges.insert(id, deps);
    }

    /// Remove the node, all incident edges, and its file-map entry (§4.4).
    pub fn remove_file(&mut self, abs_path: &Path) {
        let id = file_id(&self.project_root, abs_path);
        self.remove_outgoing_edges(&id);
        if let Some(dependents) = self.reverse_edges.remove(&id) {
            for dependent in dependents {
                if let Some(edges) = self.edges.get_mut(&dependent) {
                    edges.remove(&id);
                }
            }
        }
        self.files.remove(&id);
    }

    /// Move/rename a tracked file (§4.4).
    pub fn move_file(&mut self, old_abs_path: &Path, new_abs_path: &Path) {
        let old_id = file_id(&self.project_root, old_abs_path);
        let new_id = file_id(&self.project_root, new_abs_path);
        if old_id == new_id {
            self.add_or_update_file(new_abs_path);
            return;
        }
        if !self.files.contains_key(&old_id) {
            warn!(old = %old_id, new = %new_id, "move_file: old id unknown, degrading to add_or_update_file");
            self.add_or_update_file(new_abs_path);
            return;
        }
        self.remove_file(old_abs_path);
        self.add_or_update_file(new_abs_path);
    }

    pub fn direct_deps(&self, id: &str) -> HashSet<FileId> {
        self.edges.get(id).cloned().unwrap_or_default()
    }

    pub fn direct_dependents(&self, id: &str) -> HashSet<FileId> {
        self.reverse_edges.get(id).cloned().unwrap_or_default()
    }

    pub fn all_deps(&self, id: &str) -> HashSet<FileId> {
        self.transitive(id, &self.edges)
    }

    pub fn all_dependents(&self, id: &str) -> HashSet<FileId> {
        self.transitive(id, &self.reverse_edges)
    }

    fn transitive(&self, id: &str, adjacency: &HashMap<FileId, HashSet<FileId>>) -> HashSet<FileId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        if let Some(neighbors) = adjacency.get(id) {
            for n in neighbors {
                queue.push_back(n.clone());
            }
        }
        while let Some(next) = queue.pop_front() {
            if next == id {
                continue;
            }
            if visited.insert(next.clone()) {
                if let Some(neighbors) = adjacency.get(&next) {
                    for n in neighbors {
                        if !visited.contains(n) {
                            queue.push_back(n.clone());
                        }
                    }
                }
            }
        }
        visited
    }

    fn remove_outgoing_edges(&mut self, id: &str) {
        if let Some(old_deps) = self.edges.remove(id) {
            for dep in old_deps {
                if let Some(dependents) = self.reverse_edges.get_mut(&dep) {
                    dependents.remove(id);
                }
            }
        }
    }

    fn resolve_file_deps(&mut self, id: &FileId, abs_path: &Path) -> HashSet<FileId> {
        let raw_imports = self.extractor.extract(abs_path);
        let mut deps = HashSet::new();
        for raw in raw_imports {
            let resolved = self.resolver.resolve(&raw, abs_path, id, &self.project_root, &self.files);
            for candidate in resolved {
                if self.files.contains_key(&candidate) && candidate != *id {
                    deps.insert(candidate);
                }
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn build_links_simple_python_chain() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "import b\n").unwrap();
        fs::write(root.join("b.py"), "import c\n").unwrap();
        fs::write(root.join("c.py"), "").unwrap();

        let files = vec![root.join("a.py"), root.join("b.py"), root.join("c.py")];
        let mut graph = DependencyGraph::new(root);
        graph.build(&files);

        assert!(graph.direct_deps("a.py").contains("b.py"));
        assert!(graph.all_deps("a.py").contains("c.py"));
        assert!(graph.direct_dependents("c.py").contains("b.py"));
    }

    #[test]
    fn cycle_terminates_transitive_queries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "import b\n").unwrap();
        fs::write(root.join("b.py"), "import a\n").unwrap();

        let files = vec![root.join("a.py"), root.join("b.py")];
        let mut graph = DependencyGraph::new(root);
        graph.build(&files);

        let deps = graph.all_deps("a.py");
        assert!(deps.contains("b.py"));
        assert!(!deps.contains("a.py"));
    }

    #[test]
    fn remove_file_drops_incident_edges() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "import b\n").unwrap();
        fs::write(root.join("b.py"), "").unwrap();
        let files = vec![root.join("a.py"), root.join("b.py")];
        let mut graph = DependencyGraph::new(root);
        graph.build(&files);

        graph.remove_file(&root.join("b.py"));
        assert!(graph.direct_deps("a.py").is_empty());
        assert!(graph.direct_dependents("b.py").is_empty());
    }

    #[test]
    fn move_file_with_same_id_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.py"), "import b\n").unwrap();
        fs::write(root.join("b.py"), "").unwrap();
        let files = vec![root.join("a.py"), root.join("b.py")];
        let mut graph = DependencyGraph::new(root);
        graph.build(&files);

        graph.move_file(&root.join("a.py"), &root.join("a.py"));
        assert!(graph.direct_deps("a.py").contains("b.py"));
    }

    #[test]
    fn build_with_inferred_root_finds_longest_common_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/a.py"), "import b\n").unwrap();
        fs::write(root.join("pkg/b.py"), "").unwrap();

        let files = vec![root.join("pkg/a.py"), root.join("pkg/b.py")];
        let graph = DependencyGraph::build_with_inferred_root(&files);

        assert_eq!(graph.project_root(), root.join("pkg"));
        assert!(graph.direct_deps("a.py").contains("b.py"));
    }
}
