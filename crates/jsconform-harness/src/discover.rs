//! Fixture discovery.
//!
//! Walks each root with lexically sorted directory entries, so the fixture
//! sequence is deterministic across invocations; stable regression reports
//! depend on that ordering. A missing root is fatal; a single unreadable
//! file is not, and degrades to one compile-failed fixture entry.

use std::path::{Path, PathBuf};

use jsconform_engine::SourceKind;

use crate::error::HarnessFault;
use crate::fixture::{Fixture, FixtureId};

/// Discover all fixtures under the given roots, ordered by fixture id.
///
/// A root may be a single fixture file or a directory walked recursively.
/// Only `.js` and `.ts` files are fixtures; everything else is skipped.
pub fn discover(roots: &[PathBuf]) -> Result<Vec<Fixture>, HarnessFault> {
    let mut fixtures: Vec<Fixture> = Vec::new();

    for root in roots {
        if !root.exists() {
            return Err(HarnessFault::MissingRoot(root.clone()));
        }
        if root.is_file() {
            if let Some(kind) = source_kind_of(root) {
                let name = root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                fixtures.push(load_fixture(root, FixtureId::new(name), Vec::new(), kind));
            }
            continue;
        }
        walk_dir(root, root, &mut fixtures)?;
    }

    fixtures.sort_by(|a, b| a.id.cmp(&b.id));

    for pair in fixtures.windows(2) {
        if pair[0].id == pair[1].id {
            return Err(HarnessFault::DuplicateFixture(pair[0].id.to_string()));
        }
    }

    Ok(fixtures)
}

fn walk_dir(root: &Path, dir: &Path, fixtures: &mut Vec<Fixture>) -> Result<(), HarnessFault> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(rd) => rd.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        // A directory that vanished or is unreadable mid-walk: skip, the
        // fixtures it held simply don't exist this run.
        Err(_) => return Ok(()),
    };
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk_dir(root, &path, fixtures)?;
        } else if let Some(kind) = source_kind_of(&path) {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            let id = FixtureId::new(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/"),
            );
            let category: Vec<String> = rel
                .parent()
                .map(|p| {
                    p.components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default();
            fixtures.push(load_fixture(&path, id, category, kind));
        }
    }
    Ok(())
}

fn source_kind_of(path: &Path) -> Option<SourceKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => Some(SourceKind::JavaScript),
        Some("ts") => Some(SourceKind::TypeScript),
        _ => None,
    }
}

/// Read one fixture file; read or decode failures become an unreadable entry
/// so the file still yields exactly one verdict line downstream.
fn load_fixture(path: &Path, id: FixtureId, category: Vec<String>, kind: SourceKind) -> Fixture {
    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Fixture::from_source(id, category, text, kind),
            Err(_) => Fixture::unreadable(id, category, "file is not valid UTF-8".to_string()),
        },
        Err(e) => Fixture::unreadable(id, category, format!("failed to read file: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_discovery_is_lexically_ordered() {
        let dir = corpus(&[
            ("es2020/bigint.js", ""),
            ("basic/zeta.js", ""),
            ("basic/alpha.js", ""),
            ("es2020/generators/infinite.ts", ""),
        ]);
        let fixtures = discover(&[dir.path().to_path_buf()]).unwrap();
        let ids: Vec<_> = fixtures.iter().map(|f| f.id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "basic/alpha.js",
                "basic/zeta.js",
                "es2020/bigint.js",
                "es2020/generators/infinite.ts",
            ]
        );
    }

    #[test]
    fn test_category_from_path_segments() {
        let dir = corpus(&[("es2020/generators/basic.js", "")]);
        let fixtures = discover(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(fixtures[0].category, vec!["es2020", "generators"]);
    }

    #[test]
    fn test_extension_selects_source_kind() {
        let dir = corpus(&[("a.js", ""), ("b.ts", "")]);
        let fixtures = discover(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(fixtures[0].source_kind, SourceKind::JavaScript);
        assert_eq!(fixtures[1].source_kind, SourceKind::TypeScript);
    }

    #[test]
    fn test_non_fixture_files_skipped() {
        let dir = corpus(&[("readme.md", "#"), ("run.js", "")]);
        let fixtures = discover(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].id.as_str(), "run.js");
    }

    #[test]
    fn test_missing_root_is_fault() {
        let err = discover(&[PathBuf::from("/nonexistent/corpus")]).unwrap_err();
        assert!(matches!(err, HarnessFault::MissingRoot(_)));
    }

    #[test]
    fn test_invalid_utf8_degrades_to_unreadable_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.js"), "console.log(1);\n").unwrap();
        std::fs::write(dir.path().join("bad.js"), [0xff, 0xfe, 0x00]).unwrap();

        let fixtures = discover(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(fixtures.len(), 2, "unreadable file must not abort discovery");
        let bad = fixtures.iter().find(|f| f.id.as_str() == "bad.js").unwrap();
        assert!(bad.read_error.as_deref().unwrap().contains("UTF-8"));
    }

    #[test]
    fn test_single_file_root() {
        let dir = corpus(&[("solo.js", "console.log(1);\n")]);
        let fixtures = discover(&[dir.path().join("solo.js")]).unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].id.as_str(), "solo.js");
        assert!(fixtures[0].category.is_empty());
    }

    #[test]
    fn test_duplicate_id_across_roots_is_fault() {
        let a = corpus(&[("basic/x.js", "")]);
        let b = corpus(&[("basic/x.js", "")]);
        let err = discover(&[a.path().to_path_buf(), b.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, HarnessFault::DuplicateFixture(_)));
    }

    #[test]
    fn test_parameterized_siblings_are_independent() {
        let dir = corpus(&[
            ("basic/run6.js", "console.log(6);\n"),
            ("basic/run25.js", "console.log(25);\n"),
        ]);
        let fixtures = discover(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_ne!(fixtures[0].id, fixtures[1].id);
    }
}
