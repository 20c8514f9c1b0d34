//! `.gitignore` matching.
//!
//! Supports literal path segments and `*`/`?` glob wildcards within a single
//! path segment, plus a trailing `/` to mark a directory-only pattern.
//! Negation (`!pattern`) and `**` cross-directory globs are not supported.

use std::path::Path;

use bstr::ByteSlice;

#[derive(Debug, Clone)]
struct Pattern {
    /// Pattern text with any leading `/` stripped; anchored to the directory
    /// the `.pygit_ignore`/`.gitignore` file was read from if the original
    /// text contained a `/`, otherwise matched against the basename anywhere
    /// below that directory.
    text: String,
    anchored: bool,
    dir_only: bool,
}

impl Pattern {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let dir_only = line.ends_with('/');
        let line = if dir_only { &line[..line.len() - 1] } else { line };
        let anchored = line.contains('/');
        let text = line.strip_prefix('/').unwrap_or(line).to_string();
        Some(Self { text, anchored, dir_only })
    }

    fn matches(&self, rel_path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            glob_match(&self.text, rel_path)
        } else {
            rel_path.split('/').any(|segment| glob_match(&self.text, segment))
        }
    }
}

/// Match a single-segment glob pattern (`*`, `?`, literal characters) against
/// `text`, without backtracking across `/`.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn helper(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => helper(&p[1..], t) || (!t.is_empty() && helper(p, &t[1..])),
            (Some(b'?'), Some(_)) => helper(&p[1..], &t[1..]),
            (Some(pc), Some(tc)) if pc == tc => helper(&p[1..], &t[1..]),
            _ => false,
        }
    }
    helper(pattern.as_bytes(), text.as_bytes())
}

/// A stack of ignore rule sets, one per directory level from the repository
/// root down to the directory currently being scanned, mirroring how nested
/// `.gitignore` files layer in practice.
#[derive(Debug, Default, Clone)]
pub struct IgnoreStack {
    levels: Vec<Vec<Pattern>>,
}

impl IgnoreStack {
    pub fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// Build a stack from the repository root down to `dir` (inclusive),
    /// reading `.gitignore` at each level that has one. `root` and `dir` must
    /// both be absolute, canonicalized paths with `dir` under `root`.
    pub fn for_directory(root: &Path, dir: &Path) -> Self {
        let mut components = Vec::new();
        let mut current = dir;
        while current != root {
            components.push(current);
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        components.push(root);
        components.reverse();

        let mut stack = Self::new();
        for level_dir in components {
            stack.push_level(level_dir);
        }
        stack
    }

    pub(crate) fn push_level(&mut self, dir: &Path) {
        let patterns = match std::fs::read(dir.join(".gitignore")) {
            Ok(content) => content.lines().filter_map(|l| Pattern::parse(&l.to_str_lossy())).collect(),
            Err(_) => Vec::new(),
        };
        self.levels.push(patterns);
    }

    /// Whether `rel_path` (relative to the repository root, `/`-separated)
    /// is ignored, checking the most specific (last-pushed) directory's
    /// patterns first since later entries override earlier ones.
    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        for patterns in self.levels.iter().rev() {
            for pattern in patterns {
                if pattern.matches(rel_path, is_dir) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn literal_pattern_matches_basename() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "target\n*.log\n").unwrap();

        let stack = IgnoreStack::for_directory(dir.path(), dir.path());
        assert!(stack.is_ignored("target", true));
        assert!(stack.is_ignored("debug.log", false));
        assert!(stack.is_ignored("src/debug.log", false));
        assert!(!stack.is_ignored("main.rs", false));
    }

    #[test]
    fn anchored_pattern_only_matches_from_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "/build\n").unwrap();

        let stack = IgnoreStack::for_directory(dir.path(), dir.path());
        assert!(stack.is_ignored("build", true));
        assert!(!stack.is_ignored("sub/build", true));
    }

    #[test]
    fn dir_only_pattern_skips_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "out/\n").unwrap();

        let stack = IgnoreStack::for_directory(dir.path(), dir.path());
        assert!(stack.is_ignored("out", true));
        assert!(!stack.is_ignored("out", false));
    }

    #[test]
    fn nested_gitignore_adds_to_the_stack() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/.gitignore"), "local.txt\n").unwrap();

        let stack = IgnoreStack::for_directory(dir.path(), &dir.path().join("sub"));
        assert!(stack.is_ignored("anything.log", false));
        assert!(stack.is_ignored("local.txt", false));
    }

    #[test]
    fn no_gitignore_ignores_nothing() {
        let dir = TempDir::new().unwrap();
        let stack = IgnoreStack::for_directory(dir.path(), dir.path());
        assert!(!stack.is_ignored("anything", false));
    }
}
