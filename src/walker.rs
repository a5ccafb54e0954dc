//! Source file discovery with gitignore support.
//!
//! Uses the `ignore` crate to walk directories while respecting
//! .gitignore, .git/info/exclude, global gitignore, and .sloctallyignore.

use std::path::{Path, PathBuf};

use glob::Pattern;
use ignore::WalkBuilder;
use thiserror::Error;

/// Name of the project specific ignore file.
pub const IGNORE_FILE_NAME: &str = ".sloctallyignore";

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid name pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum depth to recurse (None = unlimited).
    pub max_depth: Option<usize>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Include hidden files and directories.
    pub include_hidden: bool,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
    /// Glob patterns for file and folder names to skip.
    pub names_to_skip: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            follow_symlinks: false,
            include_hidden: false,
            respect_gitignore: true,
            names_to_skip: vec!["*~".to_string()],
        }
    }
}

impl WalkOptions {
    /// Create options that include hidden files.
    pub fn with_hidden() -> Self {
        Self {
            include_hidden: true,
            ..Default::default()
        }
    }

    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Skip files and folders whose name matches one of `patterns`.
    pub fn names_to_skip<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names_to_skip = patterns.into_iter().map(Into::into).collect();
        self
    }
}

/// A file to analyze together with its group label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Name of the folder the file lives in.
    pub group: String,
}

/// Walk a directory tree, yielding file paths.
///
/// A root that is a file yields just that file.
pub fn walk_with_options(
    root: &Path,
    options: &WalkOptions,
) -> Result<impl Iterator<Item = Result<PathBuf, WalkError>>, WalkError> {
    let root = root.to_path_buf();

    if !root.exists() {
        return Err(WalkError::NotFound { path: root });
    }

    let skip = compile_patterns(&options.names_to_skip)?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            // The root is always walked, even if its name would be skipped.
            entry.depth() == 0 || !matches_any(&skip, entry.file_name().to_string_lossy().as_ref())
        });

    if let Some(depth) = options.max_depth {
        builder.max_depth(Some(depth));
    }

    let custom_ignore = root.join(IGNORE_FILE_NAME);
    if custom_ignore.exists() {
        builder.add_ignore(&custom_ignore);
    }

    let walker = builder.build();

    Ok(walker.filter_map(|result| match result {
        Ok(entry) => entry
            .file_type()
            .is_some_and(|ft| ft.is_file())
            .then(|| Ok(entry.into_path())),
        Err(ignore::Error::Io(io_err)) => {
            let path = PathBuf::from("<walk error>");
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                Some(Err(WalkError::PermissionDenied { path }))
            } else {
                Some(Err(WalkError::Io {
                    path,
                    source: io_err,
                }))
            }
        }
        Err(ignore::Error::WithPath { path, err }) => match *err {
            ignore::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::PermissionDenied => {
                Some(Err(WalkError::PermissionDenied { path }))
            }
            ignore::Error::Io(io_err) => Some(Err(WalkError::Io { path, source: io_err })),
            _ => None,
        },
        // Skip non-IO errors (like gitignore parse errors)
        Err(_) => None,
    }))
}

/// Collect the source files below `roots`, each with its group.
///
/// Unreadable entries below a root are skipped; a missing root is an error.
pub fn collect_sources(
    roots: &[PathBuf],
    options: &WalkOptions,
) -> Result<Vec<SourceFile>, WalkError> {
    let mut sources = Vec::new();

    for root in roots {
        let root_group = folder_name(root);
        for path in walk_with_options(root, options)?.flatten() {
            let group = match path.parent() {
                Some(parent) if parent != root.as_path() => folder_name(parent),
                _ => root_group.clone(),
            };
            sources.push(SourceFile { path, group });
        }
    }

    Ok(sources)
}

fn folder_name(path: &Path) -> String {
    let path = if path.as_os_str().is_empty() { Path::new(".") } else { path };
    if let Some(name) = path.file_name() {
        return name.to_string_lossy().into_owned();
    }
    path.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| path.display().to_string())
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, WalkError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| WalkError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        // Create structure
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub fn hello() {}").unwrap();
        fs::write(dir.path().join("setup.py"), "setup()").unwrap();

        dir
    }

    fn walk_paths(root: &Path, options: &WalkOptions) -> Vec<PathBuf> {
        walk_with_options(root, options).unwrap().flatten().collect()
    }

    #[test]
    fn test_walk_basic() {
        let dir = create_test_dir();

        let paths = walk_paths(dir.path(), &WalkOptions::default());

        assert_eq!(paths.len(), 3);
        assert!(paths.iter().any(|p| p.ends_with("main.rs")));
        assert!(paths.iter().any(|p| p.ends_with("lib.rs")));
        assert!(paths.iter().any(|p| p.ends_with("setup.py")));
    }

    #[test]
    fn test_walk_nonexistent() {
        let result = walk_with_options(Path::new("/nonexistent/path"), &WalkOptions::default());
        assert!(matches!(result, Err(WalkError::NotFound { .. })));
    }

    #[test]
    fn test_walk_respects_gitignore() {
        let dir = TempDir::new().unwrap();

        // Initialize git repo (ignore crate needs this to respect .gitignore)
        fs::create_dir(dir.path().join(".git")).unwrap();

        fs::write(dir.path().join("visible.rs"), "// visible").unwrap();
        fs::write(dir.path().join("hidden.log"), "// hidden").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log").unwrap();

        let paths = walk_paths(dir.path(), &WalkOptions::default());

        assert!(paths.iter().any(|p| p.ends_with("visible.rs")));
        assert!(!paths.iter().any(|p| p.ends_with("hidden.log")));
    }

    #[test]
    fn test_walk_respects_ignore_file() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("keep.rs"), "// keep").unwrap();
        fs::write(dir.path().join("skip.rs"), "// skip").unwrap();
        fs::write(dir.path().join(IGNORE_FILE_NAME), "skip.rs").unwrap();

        let paths = walk_paths(dir.path(), &WalkOptions::default());

        assert!(paths.iter().any(|p| p.ends_with("keep.rs")));
        assert!(!paths.iter().any(|p| p.ends_with("skip.rs")));
    }

    #[test]
    fn test_walk_hidden_files() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("visible.rs"), "// visible").unwrap();
        fs::write(dir.path().join(".hidden.rs"), "// hidden").unwrap();

        let paths = walk_paths(dir.path(), &WalkOptions::default());
        assert!(!paths.iter().any(|p| p.ends_with(".hidden.rs")));

        let paths = walk_paths(dir.path(), &WalkOptions::with_hidden());
        assert!(paths.iter().any(|p| p.ends_with(".hidden.rs")));
    }

    #[test]
    fn test_walk_names_to_skip() {
        let dir = create_test_dir();
        fs::write(dir.path().join("backup.py~"), "x").unwrap();
        fs::create_dir(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("vendor/dep.rs"), "fn dep() {}").unwrap();

        let paths = walk_paths(dir.path(), &WalkOptions::default().names_to_skip(["*~", "vendor"]));
        assert!(!paths.iter().any(|p| p.ends_with("backup.py~")));
        assert!(!paths.iter().any(|p| p.ends_with("dep.rs")));
        assert!(paths.iter().any(|p| p.ends_with("setup.py")));
    }

    #[test]
    fn test_walk_invalid_pattern() {
        let dir = create_test_dir();
        let options = WalkOptions::default().names_to_skip(["[unclosed"]);
        let result = walk_with_options(dir.path(), &options);
        assert!(matches!(result, Err(WalkError::InvalidPattern { .. })));
    }

    #[test]
    fn test_walk_max_depth() {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/b/c/deep.rs"), "").unwrap();
        fs::write(dir.path().join("a/shallow.rs"), "").unwrap();

        let paths = walk_paths(dir.path(), &WalkOptions::default().max_depth(2));
        assert!(paths.iter().any(|p| p.ends_with("shallow.rs")));
        assert!(!paths.iter().any(|p| p.ends_with("deep.rs")));
    }

    #[test]
    fn test_collect_sources_groups() {
        let dir = create_test_dir();
        let root = dir.path().to_path_buf();
        let root_name = root.file_name().unwrap().to_string_lossy().into_owned();

        let sources = collect_sources(&[root], &WalkOptions::default()).unwrap();

        let group_of = |name: &str| {
            sources
                .iter()
                .find(|s| s.path.ends_with(name))
                .map(|s| s.group.clone())
                .unwrap()
        };
        assert_eq!(group_of("main.rs"), "src");
        assert_eq!(group_of("setup.py"), root_name);
    }

    #[test]
    fn test_collect_sources_single_file() {
        let dir = create_test_dir();
        let file = dir.path().join("src/main.rs");

        let sources = collect_sources(&[file.clone()], &WalkOptions::default()).unwrap();
        assert_eq!(sources, vec![SourceFile { path: file, group: "src".to_string() }]);
    }
}
