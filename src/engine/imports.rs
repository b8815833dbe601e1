//! Static `@import` scanning for Sass, SCSS and LESS.
//!
//! Finds the files a stylesheet pulls in so the modification cache can
//! recompile it when a partial changes. The scan is textual and follows
//! the resolution rules of each language closely enough for freshness
//! tracking; the real compiler remains the authority on output.

use regex::Regex;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use super::extension_of;

/// `@import`, `@use` and `@forward` up to the end of the statement.
static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(?:import|use|forward)(?-u:\b)([^;\n]*)").unwrap());

/// Quoted string inside an import statement.
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap());

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Stylesheet syntax, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Scss,
    /// Indented syntax; allows unquoted imports.
    Sass,
    Less,
}

impl Syntax {
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension_of(path)?.as_str() {
            "scss" => Some(Self::Scss),
            "sass" => Some(Self::Sass),
            "less" => Some(Self::Less),
            _ => None,
        }
    }
}

/// Every file `source` imports, transitively, in discovery order.
///
/// `source` itself is never part of the result, and import cycles are
/// followed only once. Imports that cannot be resolved are ignored.
pub fn dependencies(source: &Path, load_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = FxHashSet::default();
    seen.insert(source.to_path_buf());

    let mut found = Vec::new();
    let mut stack = vec![source.to_path_buf()];

    while let Some(file) = stack.pop() {
        let Some(syntax) = Syntax::from_path(&file) else {
            continue;
        };
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        let dir = file.parent().unwrap_or(Path::new(""));

        // Reverse so that the first import is scanned first.
        let mut resolved: Vec<_> = imported_names(&content, syntax)
            .iter()
            .filter_map(|name| resolve(name, dir, load_paths, syntax))
            .filter(|path| seen.insert(path.clone()))
            .collect();
        found.extend(resolved.iter().cloned());
        resolved.reverse();
        stack.extend(resolved);
    }

    found
}

/// Names referenced by import statements in `content`.
fn imported_names(content: &str, syntax: Syntax) -> Vec<String> {
    let content = BLOCK_COMMENT_RE.replace_all(content, "");
    let mut names = Vec::new();

    for line in content.lines() {
        let line = line.trim_start();
        if line.starts_with("//") {
            continue;
        }
        for caps in IMPORT_RE.captures_iter(line) {
            let args = &caps[1];
            let before = names.len();
            names.extend(
                QUOTED_RE
                    .captures_iter(args)
                    .filter_map(|q| q.get(1).or_else(|| q.get(2)))
                    .map(|m| m.as_str().to_owned()),
            );
            if names.len() == before && syntax == Syntax::Sass {
                names.extend(
                    args.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned),
                );
            }
        }
    }

    names.retain(|name| !is_external(name));
    names
}

/// Imports left to the browser or provided by the compiler itself.
fn is_external(name: &str) -> bool {
    name.starts_with("sass:")
        || name.starts_with("http://")
        || name.starts_with("https://")
        || name.starts_with("//")
        || name.starts_with("url(")
        || name.ends_with(".css")
}

/// Resolve `name` relative to `dir`, then against each load path.
fn resolve(name: &str, dir: &Path, load_paths: &[PathBuf], syntax: Syntax) -> Option<PathBuf> {
    std::iter::once(dir)
        .chain(load_paths.iter().map(PathBuf::as_path))
        .flat_map(|base| candidates(&lexical_clean(&base.join(name)), syntax))
        .find(|candidate| candidate.is_file())
}

/// Fold `.` and `..` without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn candidates(base: &Path, syntax: Syntax) -> Vec<PathBuf> {
    match syntax {
        Syntax::Less => {
            if base.extension().is_some() {
                vec![base.to_path_buf()]
            } else {
                vec![base.with_extension("less"), base.to_path_buf()]
            }
        }
        Syntax::Scss | Syntax::Sass => {
            if matches!(extension_of(base).as_deref(), Some("scss" | "sass")) {
                return vec![base.to_path_buf(), partial(base)];
            }
            let mut out = Vec::with_capacity(8);
            for ext in ["scss", "sass"] {
                let file = with_appended_extension(base, ext);
                out.push(partial(&file));
                out.push(file);
            }
            for ext in ["scss", "sass"] {
                out.push(base.join(format!("_index.{ext}")));
                out.push(base.join(format!("index.{ext}")));
            }
            out
        }
    }
}

/// `dir/name` -> `dir/_name`.
fn partial(path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            let mut partial = std::ffi::OsString::from("_");
            partial.push(name);
            path.with_file_name(partial)
        }
        None => path.to_path_buf(),
    }
}

/// `foo.bar` + `scss` -> `foo.bar.scss` (unlike `with_extension`).
fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_imported_names() {
        let scss = r#"
            @use "sass:math";
            @import "colors", 'layout/grid';
            // @import "commented";
            /* @import "blocked"; */
            @forward "mixins" show button;
            @import "vendor.css";
            @import url(https://fonts.example.com/x);
        "#;
        assert_eq!(
            imported_names(scss, Syntax::Scss),
            vec!["colors", "layout/grid", "mixins"]
        );

        let sass = "@import colors, base\n.a\n  color: red\n";
        assert_eq!(imported_names(sass, Syntax::Sass), vec!["colors", "base"]);

        let less = "@import (reference) \"theme\";\n";
        assert_eq!(imported_names(less, Syntax::Less), vec!["theme"]);
    }

    #[test]
    fn test_scss_resolution_and_transitive() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let main = write(root, "main.scss", "@import \"colors\";\n@use \"widgets\";");
        let colors = write(root, "_colors.scss", "$red: #f00;");
        let index = write(root, "widgets/_index.scss", "@forward \"button\";");
        let button = write(root, "widgets/_button.scss", "@use \"../colors\";");

        let deps = dependencies(&main, &[]);
        assert_eq!(deps, vec![colors, index, button]);
    }

    #[test]
    fn test_load_paths_are_searched() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "app/main.scss", "@import 'shared/vars';");
        let vars = write(dir.path(), "lib/shared/_vars.scss", "");

        assert!(dependencies(&main, &[]).is_empty());
        assert_eq!(dependencies(&main, &[dir.path().join("lib")]), vec![vars]);
    }

    #[test]
    fn test_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.less", "@import \"b\";");
        let b = write(dir.path(), "b.less", "@import \"a\";");

        assert_eq!(dependencies(&a, &[]), vec![b]);
    }

    #[test]
    fn test_unresolved_imports_ignored() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.scss", "@import \"nowhere\";");
        assert!(dependencies(&main, &[]).is_empty());
    }
}
