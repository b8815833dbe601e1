//! JavaScript dialect engines.

use std::path::Path;

use super::{Engine, RenderOptions, extension_of};
use crate::utils::exec::Cmd;

/// CoffeeScript via the `coffee` CLI, compiled without the top-level
/// function wrapper.
#[derive(Debug, Clone)]
pub struct CoffeeEngine {
    command: Vec<String>,
}

impl CoffeeEngine {
    pub fn new() -> Self {
        Self::with_command(vec!["coffee".to_owned()])
    }

    /// Use a different launcher, e.g. `["npx", "coffee"]`.
    pub fn with_command(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for CoffeeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for CoffeeEngine {
    fn name(&self) -> &'static str {
        "coffee"
    }

    fn eligible(&self, path: &Path) -> bool {
        extension_of(path).as_deref() == Some("coffee")
    }

    fn output_extension(&self) -> &'static str {
        "js"
    }

    fn render(&self, source: &Path, _options: &RenderOptions) -> anyhow::Result<String> {
        Cmd::from_slice(&self.command)
            .args(["--bare", "--print", "--compile"])
            .arg(source)
            .run_to_string()
    }
}

/// ES6, JSX and `.babel` sources via the `babel` CLI.
///
/// Babel picks up the project's own configuration, so it runs from the
/// source file's directory.
#[derive(Debug, Clone)]
pub struct BabelEngine {
    command: Vec<String>,
}

impl BabelEngine {
    const EXTENSIONS: [&'static str; 3] = ["es6", "babel", "jsx"];

    pub fn new() -> Self {
        Self::with_command(vec!["babel".to_owned()])
    }

    pub fn with_command(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for BabelEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for BabelEngine {
    fn name(&self) -> &'static str {
        "babel"
    }

    fn eligible(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| Self::EXTENSIONS.contains(&ext.as_str()))
    }

    fn output_extension(&self) -> &'static str {
        "js"
    }

    fn render(&self, source: &Path, _options: &RenderOptions) -> anyhow::Result<String> {
        let mut cmd = Cmd::from_slice(&self.command).arg(source);
        if let Some(dir) = source.parent() {
            cmd = cmd.cwd(dir);
        }
        cmd.run_to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coffee_eligibility() {
        let engine = CoffeeEngine::new();
        assert!(engine.eligible(Path::new("hello.js.coffee")));
        assert!(engine.eligible(Path::new("hello.coffee")));
        assert!(!engine.eligible(Path::new("hello.js")));
    }

    #[test]
    fn test_missing_compiler_is_error() {
        let engine = CoffeeEngine::with_command(vec!["assetline-no-such-coffee".to_owned()]);
        let err = engine
            .render(Path::new("hello.js.coffee"), &RenderOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
