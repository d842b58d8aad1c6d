use ignore::WalkBuilder;
use log::warn;
use std::path::{Path, PathBuf};

/// Traversal policy for one search invocation.
#[derive(Debug, Default)]
pub struct WalkOptions<'a> {
    pub recursive: bool,
    pub show_hidden: bool,
    /// Extension allow-list; `None` or empty admits everything.
    pub extensions: Option<&'a [String]>,
    /// Files above this size (MB) are skipped with a warning.
    pub max_size_mb: Option<u64>,
}

/// Collects the regular files under `root` that pass the traversal policy,
/// in walk order.
pub fn searchable_files(root: &Path, opts: &WalkOptions) -> Vec<PathBuf> {
    let max_depth = if opts.recursive { None } else { Some(1) };
    WalkBuilder::new(root)
        .hidden(!opts.show_hidden)
        .git_global(!opts.show_hidden)
        .git_ignore(!opts.show_hidden)
        .git_exclude(!opts.show_hidden)
        .ignore(!opts.show_hidden)
        .max_depth(max_depth)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter(|entry| matches_extensions(entry.path(), opts.extensions))
        .filter(|entry| within_size_cap(entry.path(), opts.max_size_mb))
        .map(|entry| entry.into_path())
        .collect()
}

/// Extension allow-list check; `None` or an empty list admits everything.
pub fn matches_extensions(path: &Path, extensions: Option<&[String]>) -> bool {
    let Some(allowed) = extensions.filter(|e| !e.is_empty()) else {
        return true;
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

fn within_size_cap(path: &Path, max_size_mb: Option<u64>) -> bool {
    let (Some(max), Ok(metadata)) = (max_size_mb, path.metadata()) else {
        return true;
    };
    if metadata.len() > max * 1024 * 1024 {
        let size_mb = metadata.len() / (1024 * 1024);
        warn!("Skipping large file ({size_mb}MB): {}", path.display());
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn empty_allow_list_admits_everything() {
        assert!(matches_extensions(Path::new("a.pdf"), None));
        assert!(matches_extensions(Path::new("a.pdf"), Some(&[])));
        assert!(matches_extensions(Path::new("Makefile"), None));
    }

    #[test]
    fn allow_list_is_case_insensitive_and_excludes_bare_names() {
        let exts = vec!["pdf".to_string(), "docx".to_string()];
        assert!(matches_extensions(Path::new("a.PDF"), Some(&exts)));
        assert!(matches_extensions(Path::new("a.docx"), Some(&exts)));
        assert!(!matches_extensions(Path::new("a.txt"), Some(&exts)));
        assert!(!matches_extensions(Path::new("Makefile"), Some(&exts)));
    }

    #[test]
    fn walk_applies_extension_and_depth_policy() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "x").unwrap();
        fs::write(dir.path().join("drop.log"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/nested.txt"), "x").unwrap();

        let exts = vec!["txt".to_string()];
        let shallow = searchable_files(
            dir.path(),
            &WalkOptions {
                extensions: Some(&exts),
                ..WalkOptions::default()
            },
        );
        assert_eq!(shallow.len(), 1);
        assert!(shallow[0].ends_with("keep.txt"));

        let deep = searchable_files(
            dir.path(),
            &WalkOptions {
                recursive: true,
                extensions: Some(&exts),
                ..WalkOptions::default()
            },
        );
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn size_cap_excludes_nonempty_files_when_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "more than zero megabytes").unwrap();

        let capped = searchable_files(
            dir.path(),
            &WalkOptions {
                max_size_mb: Some(0),
                ..WalkOptions::default()
            },
        );
        assert!(capped.is_empty());

        let uncapped = searchable_files(dir.path(), &WalkOptions::default());
        assert_eq!(uncapped.len(), 1);
    }
}
