//! Stylesheet engines with import tracking.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::imports::{self, Syntax};
use super::{Engine, RenderOptions, extension_of};
use crate::utils::exec::Cmd;

/// Dart Sass, for both `.scss` and indented `.sass` syntax.
#[derive(Debug, Clone)]
pub struct SassEngine {
    command: Vec<String>,
}

impl SassEngine {
    pub fn new() -> Self {
        Self::with_command(vec!["sass".to_owned()])
    }

    pub fn with_command(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for SassEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for SassEngine {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn eligible(&self, path: &Path) -> bool {
        matches!(extension_of(path).as_deref(), Some("scss" | "sass"))
    }

    fn output_extension(&self) -> &'static str {
        "css"
    }

    fn render(&self, source: &Path, options: &RenderOptions) -> anyhow::Result<String> {
        let load_paths = options.load_paths.iter().map(|dir| {
            let mut arg = OsString::from("--load-path=");
            arg.push(dir);
            arg
        });

        Cmd::from_slice(&self.command)
            .arg("--no-source-map")
            .args(load_paths)
            .arg(source)
            .run_to_string()
    }

    fn dependencies(&self, source: &Path, options: &RenderOptions) -> Vec<PathBuf> {
        imports::dependencies(source, &options.load_paths)
    }
}

/// LESS via `lessc`.
#[derive(Debug, Clone)]
pub struct LessEngine {
    command: Vec<String>,
}

impl LessEngine {
    pub fn new() -> Self {
        Self::with_command(vec!["lessc".to_owned()])
    }

    pub fn with_command(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for LessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for LessEngine {
    fn name(&self) -> &'static str {
        "less"
    }

    fn eligible(&self, path: &Path) -> bool {
        Syntax::from_path(path) == Some(Syntax::Less)
    }

    fn output_extension(&self) -> &'static str {
        "css"
    }

    fn render(&self, source: &Path, options: &RenderOptions) -> anyhow::Result<String> {
        let mut cmd = Cmd::from_slice(&self.command);
        if !options.load_paths.is_empty() {
            let joined = std::env::join_paths(&options.load_paths)?;
            let mut arg = OsString::from("--include-path=");
            arg.push(joined);
            cmd = cmd.arg(arg);
        }
        cmd.arg(source).run_to_string()
    }

    fn dependencies(&self, source: &Path, options: &RenderOptions) -> Vec<PathBuf> {
        imports::dependencies(source, &options.load_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sass_eligibility() {
        let engine = SassEngine::new();
        assert!(engine.eligible(Path::new("style.css.scss")));
        assert!(engine.eligible(Path::new("style.sass")));
        assert!(!engine.eligible(Path::new("style.less")));
        assert!(!engine.eligible(Path::new("style.css")));
    }

    #[test]
    fn test_less_reports_dependencies() {
        let dir = TempDir::new().unwrap();
        let main = dir.path().join("main.less");
        fs::write(&main, "@import \"vars\";\nbody { color: @red; }").unwrap();
        fs::write(dir.path().join("vars.less"), "@red: #f00;").unwrap();

        let options = RenderOptions {
            load_paths: vec![dir.path().to_path_buf()],
        };
        let deps = LessEngine::new().dependencies(&main, &options);
        assert_eq!(deps, vec![dir.path().join("vars.less")]);
    }
}
