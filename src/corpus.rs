//! Corpus selection for a crate's rustdoc tree
//!
//! rustdoc re-exports the same API item at every module path it is
//! reachable from, so the HTML tree is full of near-identical pages that
//! share a base filename (e.g. `struct.Value.html` at several depths).
//! Default selection keeps exactly one file per such duplicate group: the
//! largest by byte size, which in practice is the canonical page with the
//! full item documentation. Files whose base name is unique appear in no
//! duplicate group and are not selected at all; the default mode exists to
//! dedupe re-exports, not to index everything. The all-files override
//! selects every candidate instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// A candidate HTML file under the crate's documentation tree
#[derive(Debug, Clone)]
struct Candidate {
    /// Path relative to the crate's documentation root
    rel_path: PathBuf,
    /// File size in bytes
    size: u64,
}

/// Select the set of files to index for the crate rooted at `crate_docs_dir`
///
/// Returns paths relative to `crate_docs_dir`, sorted lexicographically.
/// Pure function of filesystem state; no side effects.
pub fn select_corpus(crate_docs_dir: &Path, all_files: bool) -> Result<Vec<PathBuf>> {
    let candidates = enumerate_candidates(crate_docs_dir)?;

    let mut selected: Vec<PathBuf> = if all_files {
        candidates.into_iter().map(|c| c.rel_path).collect()
    } else {
        select_largest_of_duplicates(candidates)
    };

    selected.sort();

    tracing::debug!(
        count = selected.len(),
        all_files,
        "selected corpus files for {}",
        crate_docs_dir.display()
    );

    Ok(selected)
}

/// Enumerate every HTML file under the tree, excluding `index.html` pages
fn enumerate_candidates(crate_docs_dir: &Path) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(crate_docs_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "html") {
            continue;
        }
        if path.file_name().is_some_and(|name| name == "index.html") {
            continue;
        }

        let rel_path = path
            .strip_prefix(crate_docs_dir)
            .unwrap_or(path)
            .to_path_buf();

        candidates.push(Candidate {
            rel_path,
            size: entry.metadata()?.len(),
        });
    }

    Ok(candidates)
}

/// Keep the largest member of each duplicate group
///
/// Groups are keyed by base filename. Groups with a single member are
/// dropped entirely. Size ties resolve to the lexicographically smallest
/// relative path, making selection independent of traversal order.
fn select_largest_of_duplicates(candidates: Vec<Candidate>) -> Vec<PathBuf> {
    let mut groups: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();

    for candidate in candidates {
        let base = candidate
            .rel_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        groups.entry(base).or_default().push(candidate);
    }

    groups
        .into_values()
        .filter(|members| members.len() > 1)
        .filter_map(|mut members| {
            members.sort_by(|a, b| b.size.cmp(&a.size).then(a.rel_path.cmp(&b.rel_path)));
            members.into_iter().next().map(|c| c.rel_path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build a docs tree from (relative path, content size) pairs
    fn docs_tree(files: &[(&str, usize)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, size) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "x".repeat(*size)).unwrap();
        }
        dir
    }

    fn paths(selected: &[PathBuf]) -> Vec<String> {
        selected
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_keeps_largest_duplicate_only() {
        let dir = docs_tree(&[
            ("foo.html", 500),
            ("sub/foo.html", 900),
            ("bar.html", 300),
            ("index.html", 100),
        ]);

        let selected = select_corpus(dir.path(), false).unwrap();
        assert_eq!(paths(&selected), vec!["sub/foo.html"]);
    }

    #[test]
    fn test_all_files_selects_every_candidate() {
        let dir = docs_tree(&[
            ("foo.html", 500),
            ("sub/foo.html", 900),
            ("bar.html", 300),
            ("index.html", 100),
        ]);

        let selected = select_corpus(dir.path(), true).unwrap();
        assert_eq!(paths(&selected), vec!["bar.html", "foo.html", "sub/foo.html"]);
    }

    #[test]
    fn test_index_html_excluded_at_every_depth() {
        let dir = docs_tree(&[("index.html", 100), ("sub/index.html", 200)]);

        assert!(select_corpus(dir.path(), false).unwrap().is_empty());
        assert!(select_corpus(dir.path(), true).unwrap().is_empty());
    }

    #[test]
    fn test_non_html_files_ignored() {
        let dir = docs_tree(&[
            ("foo.html", 100),
            ("sub/foo.html", 200),
            ("search-index.js", 500),
            ("foo.css", 500),
        ]);

        let selected = select_corpus(dir.path(), true).unwrap();
        assert_eq!(paths(&selected), vec!["foo.html", "sub/foo.html"]);
    }

    #[test]
    fn test_selected_size_is_group_maximum() {
        let dir = docs_tree(&[
            ("a/item.html", 10),
            ("b/item.html", 30),
            ("c/item.html", 20),
        ]);

        let selected = select_corpus(dir.path(), false).unwrap();
        assert_eq!(paths(&selected), vec!["b/item.html"]);
    }

    #[test]
    fn test_size_tie_breaks_to_smallest_path() {
        let dir = docs_tree(&[("z/item.html", 50), ("a/item.html", 50)]);

        let selected = select_corpus(dir.path(), false).unwrap();
        assert_eq!(paths(&selected), vec!["a/item.html"]);
    }

    #[test]
    fn test_unique_names_omitted_in_default_mode() {
        let dir = docs_tree(&[("one.html", 100), ("two.html", 100), ("three.html", 100)]);

        assert!(select_corpus(dir.path(), false).unwrap().is_empty());
    }

    #[test]
    fn test_selection_is_sorted() {
        let dir = docs_tree(&[
            ("z/a.html", 10),
            ("m/a.html", 20),
            ("z/b.html", 10),
            ("m/b.html", 20),
        ]);

        let selected = select_corpus(dir.path(), false).unwrap();
        assert_eq!(paths(&selected), vec!["m/a.html", "m/b.html"]);
    }
}
