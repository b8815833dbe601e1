//! Template engines that turn Sass, LESS, CoffeeScript and Babel sources
//! into plain CSS or JavaScript.
//!
//! Engines are probed in order; the first whose [`Engine::eligible`] accepts
//! a source wins. The default chain is Sass/SCSS, LESS, CoffeeScript, Babel.
//! Engines added with [`EngineChain::register`] are probed before those.

pub mod imports;
mod script;
mod stylesheet;

pub use script::{BabelEngine, CoffeeEngine};
pub use stylesheet::{LessEngine, SassEngine};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options handed to an engine for one render.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Directories searched for imports: the source's own directory first,
    /// then the configured source roots.
    pub load_paths: Vec<PathBuf>,
}

/// A template engine, usually an external compiler.
pub trait Engine: Send + Sync {
    /// Short name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether this engine compiles `path`.
    fn eligible(&self, path: &Path) -> bool;

    /// Extension of the compiled output (`js` or `css`).
    fn output_extension(&self) -> &'static str;

    /// Compile `source` to its final content.
    fn render(&self, source: &Path, options: &RenderOptions) -> anyhow::Result<String>;

    /// Files `source` imports, directly or transitively.
    ///
    /// Engines without import support report none.
    fn dependencies(&self, _source: &Path, _options: &RenderOptions) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Ordered engine list, resolved once per configuration.
#[derive(Clone, Default)]
pub struct EngineChain {
    engines: Vec<Arc<dyn Engine>>,
}

impl EngineChain {
    /// Chain with no engines at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sass/SCSS, LESS, CoffeeScript, Babel (ES6/JSX).
    pub fn with_defaults() -> Self {
        let mut chain = Self::empty();
        chain.push(SassEngine::new());
        chain.push(LessEngine::new());
        chain.push(CoffeeEngine::new());
        chain.push(BabelEngine::new());
        chain
    }

    /// Add an engine that takes priority over everything already present.
    pub fn register(&mut self, engine: impl Engine + 'static) -> &mut Self {
        self.engines.insert(0, Arc::new(engine));
        self
    }

    /// Append an engine at the lowest priority.
    pub fn push(&mut self, engine: impl Engine + 'static) -> &mut Self {
        self.engines.push(Arc::new(engine));
        self
    }

    /// First engine that accepts `path`.
    pub fn find(&self, path: &Path) -> Option<&Arc<dyn Engine>> {
        self.engines.iter().find(|engine| engine.eligible(path))
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl fmt::Debug for EngineChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.engines.iter().map(|e| e.name()))
            .finish()
    }
}

/// Last extension of `path`, lowercased.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake;

    impl Engine for Fake {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn eligible(&self, path: &Path) -> bool {
            extension_of(path).as_deref() == Some("scss")
        }

        fn output_extension(&self) -> &'static str {
            "css"
        }

        fn render(&self, _source: &Path, _options: &RenderOptions) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_default_dispatch() {
        let chain = EngineChain::with_defaults();
        let name = |p: &str| chain.find(Path::new(p)).map(|e| e.name());

        assert_eq!(name("a/style.css.scss"), Some("sass"));
        assert_eq!(name("layout.sass"), Some("sass"));
        assert_eq!(name("theme.less"), Some("less"));
        assert_eq!(name("hello.js.coffee"), Some("coffee"));
        assert_eq!(name("app.es6"), Some("babel"));
        assert_eq!(name("widget.JSX"), Some("babel"));
        assert_eq!(name("app.babel"), Some("babel"));
        assert_eq!(name("app.js"), None);
        assert_eq!(name("logo.png"), None);
    }

    #[test]
    fn test_registered_engine_takes_priority() {
        let mut chain = EngineChain::with_defaults();
        chain.register(Fake);

        assert_eq!(chain.find(Path::new("a.scss")).unwrap().name(), "fake");
        assert_eq!(chain.find(Path::new("a.sass")).unwrap().name(), "sass");
    }

    #[test]
    fn test_empty_chain() {
        let chain = EngineChain::empty();
        assert!(chain.is_empty());
        assert!(chain.find(Path::new("a.scss")).is_none());
    }
}
