//! Compressor registry for JavaScript and stylesheet artifacts.
//!
//! Every adapter exposes one operation, [`Compressor::compress`]. The
//! registry turns a [`CompressorSelector`] from configuration into a concrete
//! adapter:
//!
//! | Selector                 | Adapter                                     |
//! |--------------------------|---------------------------------------------|
//! | `None`                   | [`NullCompressor`] (content unchanged)      |
//! | `"builtin"`              | in-process oxc / lightningcss               |
//! | `"yui"`                  | `yuicompressor` CLI                         |
//! | `"uglifier"`             | `uglifyjs` CLI (javascript only)            |
//! | `"closure"`              | `google-closure-compiler` CLI (javascript)  |
//! | `"sass"`                 | `sass` CLI (stylesheet only)                |
//! | any other name           | third-party adapter registered by name      |
//! | `Custom(adapter)`        | the adapter itself                          |

mod builtin;
mod external;

pub use builtin::{BuiltinCompressor, minify_css, minify_js};
pub use external::ExternalCompressor;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::error::{AssetError, Result};

// ============================================================================
// Asset Kind
// ============================================================================

/// Which family of compressor applies to an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Javascript,
    Stylesheet,
}

impl AssetKind {
    /// Kind of a compiled artifact, by its final extension.
    ///
    /// Only `.js` and `.css` artifacts are ever compressed.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "js" => Some(Self::Javascript),
            "css" => Some(Self::Stylesheet),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Javascript => "javascript",
            Self::Stylesheet => "stylesheet",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Compressor capability
// ============================================================================

/// Raised by an adapter when the underlying engine rejects the input.
///
/// The bundler recovers from it per file.
#[derive(Debug, Error)]
#[error("{compressor} compressor failed")]
pub struct CompressError {
    pub compressor: String,
    #[source]
    pub source: anyhow::Error,
}

impl CompressError {
    pub fn new(compressor: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            compressor: compressor.into(),
            source,
        }
    }
}

/// A JavaScript or stylesheet compressor.
///
/// Implementations must not mutate shared state per call; the bundler runs
/// them from several threads at once.
pub trait Compressor: Send + Sync {
    /// Short name, used in logs and errors.
    fn name(&self) -> &str;

    /// Compress `content`, returning the new content.
    fn compress(&self, content: &str) -> Result<String, CompressError>;
}

/// No-op compressor, used when no selector is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCompressor;

impl Compressor for NullCompressor {
    fn name(&self) -> &str {
        "null"
    }

    fn compress(&self, content: &str) -> Result<String, CompressError> {
        Ok(content.to_owned())
    }
}

// ============================================================================
// Selector
// ============================================================================

/// Compressor choice as expressed in configuration.
#[derive(Clone, Default)]
pub enum CompressorSelector {
    /// No compression.
    #[default]
    None,
    /// A well-known or third-party adapter, looked up by name.
    Named(String),
    /// An adapter supplied by the embedding application.
    Custom(Arc<dyn Compressor>),
}

impl CompressorSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn custom(compressor: impl Compressor + 'static) -> Self {
        Self::Custom(Arc::new(compressor))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for CompressorSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(c) => f.debug_tuple("Custom").field(&c.name()).finish(),
        }
    }
}

impl From<Option<String>> for CompressorSelector {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.trim().is_empty() => Self::Named(name.trim().to_owned()),
            _ => Self::None,
        }
    }
}

impl From<&str> for CompressorSelector {
    fn from(value: &str) -> Self {
        Self::from(Some(value.to_owned()))
    }
}

impl<'de> Deserialize<'de> for CompressorSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Resolves selectors into adapters.
///
/// Third-party adapters are registered per `(kind, name)`, the counterpart of
/// a `<Name><Kind>` naming convention.
#[derive(Clone, Default)]
pub struct CompressorRegistry {
    third_party: FxHashMap<(AssetKind, String), Arc<dyn Compressor>>,
}

impl CompressorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a third-party adapter under `name` for `kind`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: AssetKind,
        compressor: impl Compressor + 'static,
    ) -> &mut Self {
        self.third_party.insert((kind, name.into()), Arc::new(compressor));
        self
    }

    /// Resolve `selector` for `kind`.
    ///
    /// Fails with [`AssetError::UnknownCompressor`] when a name matches
    /// neither a well-known adapter valid for `kind` nor a registered one.
    pub fn resolve(
        &self,
        kind: AssetKind,
        selector: &CompressorSelector,
    ) -> Result<Arc<dyn Compressor>> {
        match selector {
            CompressorSelector::None => Ok(Arc::new(NullCompressor)),
            CompressorSelector::Custom(compressor) => Ok(Arc::clone(compressor)),
            CompressorSelector::Named(name) => self.resolve_named(kind, name),
        }
    }

    fn resolve_named(&self, kind: AssetKind, name: &str) -> Result<Arc<dyn Compressor>> {
        use AssetKind::{Javascript, Stylesheet};

        let builtin: Option<Arc<dyn Compressor>> = match (name, kind) {
            ("builtin", _) => Some(Arc::new(BuiltinCompressor::new(kind))),
            ("yui", _) => Some(Arc::new(ExternalCompressor::yui(kind))),
            ("uglifier", Javascript) => Some(Arc::new(ExternalCompressor::uglifier())),
            ("closure", Javascript) => Some(Arc::new(ExternalCompressor::closure())),
            ("sass", Stylesheet) => Some(Arc::new(ExternalCompressor::sass())),
            _ => None,
        };

        builtin
            .or_else(|| {
                self.third_party
                    .get(&(kind, name.to_owned()))
                    .map(Arc::clone)
            })
            .ok_or_else(|| AssetError::UnknownCompressor {
                kind,
                name: name.to_owned(),
            })
    }
}

impl fmt::Debug for CompressorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .third_party
            .keys()
            .map(|(kind, name)| format!("{name}:{kind}"))
            .collect();
        names.sort();
        f.debug_struct("CompressorRegistry")
            .field("third_party", &names)
            .finish()
    }
}
