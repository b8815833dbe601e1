//! Source lookup across ordered source roots.

use jwalk::WalkDir;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Compiled forms an engine source can stand in for.
const JS_SOURCES: &[&str] = &["coffee", "es6", "babel", "jsx"];
const CSS_SOURCES: &[&str] = &["scss", "sass", "less"];

/// A physical file found under one of the source roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    root: PathBuf,
    path: PathBuf,
}

impl SourceFile {
    pub fn new(root: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            path: path.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path below the root, e.g. `javascripts/app.js.coffee`.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.root).unwrap_or(&self.path)
    }
}

/// Ordered source roots; earlier roots shadow later ones.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    roots: &'a [PathBuf],
}

impl<'a> Sources<'a> {
    pub fn new(roots: &'a [PathBuf]) -> Self {
        Self { roots }
    }

    /// Locate the file answering the logical `name`.
    ///
    /// Each root is tried in order. Within a root an exact match wins; with
    /// `compile` on, `name.<ext>` (`hello.js` -> `hello.js.coffee`) and then
    /// a sibling engine source (`app.js` -> `app.coffee`) are accepted too.
    /// Names escaping the root with `..` never match.
    pub fn find(&self, name: &str, compile: bool) -> Option<SourceFile> {
        let relative = logical_path(name)?;

        self.roots.iter().find_map(|root| {
            let exact = root.join(&relative);
            if exact.is_file() {
                return Some(SourceFile::new(root, exact));
            }
            if !compile {
                return None;
            }
            template_candidate(&exact).map(|path| SourceFile::new(root, path))
        })
    }

    /// Every compilable file under every root, sorted per root.
    ///
    /// Files whose name starts with `_` or `.`, and anything inside a
    /// dot-directory, are skipped. A relative path present in several
    /// roots is reported once, from the first root.
    pub fn files(&self) -> Vec<SourceFile> {
        let mut seen = FxHashSet::default();
        let mut files = Vec::new();

        for root in self.roots.iter().filter(|r| r.is_dir()) {
            let entries = WalkDir::new(root)
                .sort(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file());

            for entry in entries {
                let file = SourceFile::new(root, entry.path());
                if is_hidden(file.relative()) {
                    continue;
                }
                if seen.insert(file.relative().to_path_buf()) {
                    files.push(file);
                }
            }
        }

        files
    }
}

/// `/javascripts/app.js` -> `javascripts/app.js`, rejecting `..`.
fn logical_path(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(name.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

fn is_hidden(relative: &Path) -> bool {
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        let name = component.as_os_str().to_string_lossy();
        let is_file = components.peek().is_none();
        if name.starts_with('.') || (is_file && name.starts_with('_')) {
            return true;
        }
    }
    false
}

/// An engine source that compiles to `exact`.
fn template_candidate(exact: &Path) -> Option<PathBuf> {
    let dir = exact.parent()?;
    let file_name = exact.file_name()?.to_str()?;

    // `hello.js` -> `hello.js.<ext>`
    let prefix = format!("{file_name}.");
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter(|e| {
            e.file_name().to_str().is_some_and(|name| {
                name.strip_prefix(&prefix)
                    .is_some_and(|ext| !ext.is_empty() && !ext.contains('.'))
            })
        })
        .map(|e| e.path())
        .collect();
    matches.sort();
    if let Some(found) = matches.into_iter().next() {
        return Some(found);
    }

    // `app.js` -> `app.coffee`
    let alternates = match exact.extension()?.to_str()? {
        "js" => JS_SOURCES,
        "css" => CSS_SOURCES,
        _ => return None,
    };
    alternates
        .iter()
        .map(|ext| exact.with_extension(ext))
        .find(|path| path.is_file())
}
