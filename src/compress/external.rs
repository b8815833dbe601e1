//! Compressors backed by third-party command line tools.
//!
//! Content is piped on stdin and the compressed result read from stdout.

use super::{AssetKind, CompressError, Compressor};
use crate::utils::exec::Cmd;

/// A compressor that shells out to an installed CLI.
#[derive(Debug, Clone)]
pub struct ExternalCompressor {
    name: &'static str,
    command: Vec<String>,
}

impl ExternalCompressor {
    /// Adapter around an arbitrary command (program followed by arguments).
    pub fn new(name: &'static str, command: Vec<String>) -> Self {
        Self { name, command }
    }

    /// YUI Compressor, for either kind.
    pub fn yui(kind: AssetKind) -> Self {
        let ty = match kind {
            AssetKind::Javascript => "js",
            AssetKind::Stylesheet => "css",
        };
        Self::new("yui", args(&["yuicompressor", "--type", ty]))
    }

    /// UglifyJS, javascript only.
    pub fn uglifier() -> Self {
        Self::new("uglifier", args(&["uglifyjs", "--compress", "--mangle"]))
    }

    /// Google Closure Compiler, javascript only.
    pub fn closure() -> Self {
        Self::new(
            "closure",
            args(&["google-closure-compiler", "--warning_level", "QUIET"]),
        )
    }

    /// Dart Sass in compressed output mode, stylesheet only.
    pub fn sass() -> Self {
        Self::new(
            "sass",
            args(&["sass", "--stdin", "--style=compressed", "--no-source-map"]),
        )
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl Compressor for ExternalCompressor {
    fn name(&self) -> &str {
        self.name
    }

    fn compress(&self, content: &str) -> Result<String, CompressError> {
        Cmd::from_slice(&self.command)
            .stdin(content)
            .run_to_string()
            .map_err(|e| CompressError::new(self.name, e))
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yui_type_flag() {
        assert_eq!(
            ExternalCompressor::yui(AssetKind::Stylesheet).command(),
            ["yuicompressor", "--type", "css"]
        );
        assert_eq!(
            ExternalCompressor::yui(AssetKind::Javascript).command()[2],
            "js"
        );
    }

    #[test]
    fn test_missing_tool_is_compress_error() {
        let compressor = ExternalCompressor::new(
            "missing",
            vec!["assetline-no-such-compressor".to_owned()],
        );
        let err = compressor.compress("var a = 1;").unwrap_err();
        assert_eq!(err.compressor, "missing");
        assert!(format!("{:#}", anyhow::Error::new(err)).contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipes_through_command() {
        let compressor = ExternalCompressor::new("cat", vec!["cat".to_owned()]);
        assert_eq!(compressor.compress("body{}").unwrap(), "body{}");
    }

    #[cfg(unix)]
    #[test]
    fn test_large_asset_does_not_stall() {
        let compressor = ExternalCompressor::new("cat", vec!["cat".to_owned()]);
        let content = "a".repeat(1 << 20);
        assert_eq!(compressor.compress(&content).unwrap().len(), content.len());
    }
}
