//! assetline - an asset pipeline for web frameworks.
//!
//! Compiles Sass, LESS, CoffeeScript and Babel sources into plain CSS and
//! JavaScript, compresses and fingerprints them for production, and
//! resolves logical asset names to URLs at render time.
//!
//! # Module Structure
//!
//! ```text
//! src/
//! ├── freshness/   # ModificationCache: mtime tracking with dependencies
//! ├── compress/    # CompressorRegistry, builtin and external compressors
//! ├── engine/      # EngineChain: sass, less, coffee, babel; @import scanner
//! ├── compiler/    # Compiler: resolve, skip, copy or render, write
//! ├── bundle/      # Precompiler, Bundler, digests, manifest
//! ├── resolve/     # ManifestResolver, PushPromises
//! ├── config/      # Project, AssetsConfig (assets.toml)
//! ├── error.rs     # AssetError
//! ├── logger.rs    # log!/debug! macros, ProgressLine
//! └── utils/       # external commands, artifact writes
//! ```
//!
//! # Example
//!
//! ```ignore
//! use assetline::{config::Project, resolve::ManifestResolver};
//!
//! let project = Project::load(Path::new("assets.toml"))?;
//! let resolver = ManifestResolver::new(project.default_app().clone())?;
//! let src = resolver.asset_path("application.js")?;
//! ```

pub mod bundle;
pub mod compiler;
pub mod compress;
pub mod config;
pub mod engine;
pub mod error;
pub mod freshness;
pub mod logger;
pub mod resolve;
pub mod utils;

pub use error::{AssetError, Result};
