//! Built-in compressor: oxc for JavaScript and lightningcss for CSS.

use anyhow::anyhow;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, CompressOptionsUnused, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{AssetKind, CompressError, Compressor};

/// Minify JavaScript source code.
///
/// Parsed as a classic script. Top-level bindings are browser globals shared
/// with other scripts, so they are neither renamed nor dropped when unused.
pub fn minify_js(source: &str) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::script();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(anyhow!("parse errors: {:?}", ret.errors));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(false),
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions {
            unused: CompressOptionsUnused::Keep,
            ..CompressOptions::smallest()
        }),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> anyhow::Result<String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| anyhow!("{e}"))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;
    Ok(result.code)
}

/// In-process compressor for one asset kind.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinCompressor {
    kind: AssetKind,
}

impl BuiltinCompressor {
    pub const fn new(kind: AssetKind) -> Self {
        Self { kind }
    }
}

impl Compressor for BuiltinCompressor {
    fn name(&self) -> &str {
        "builtin"
    }

    fn compress(&self, content: &str) -> Result<String, CompressError> {
        let result = match self.kind {
            AssetKind::Javascript => minify_js(content),
            AssetKind::Stylesheet => minify_css(content),
        };
        result.map_err(|e| CompressError::new(self.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_js() {
        let source = "function add(first, second) {\n  return first + second;\n}\n";
        let out = minify_js(source).unwrap();
        assert!(out.len() < 40);
        assert!(out.contains("function add"));
    }

    #[test]
    fn test_minify_js_keeps_globals() {
        let out = minify_js("var x = 1;\nfunction f(a) {\n  return a + x;\n}\n").unwrap();
        assert!(out.contains("x=1"), "{out}");
        assert!(out.contains("function f("), "{out}");
        assert!(out.contains("+x"), "{out}");
    }

    #[test]
    fn test_minify_js_syntax_error() {
        assert!(minify_js("function (").is_err());
    }

    #[test]
    fn test_minify_css() {
        let out = minify_css("body {\n  color: #ff0000;\n}\n").unwrap();
        assert_eq!(out, "body{color:red}");
    }

    #[test]
    fn test_builtin_compressor_reports_name() {
        let err = BuiltinCompressor::new(AssetKind::Javascript)
            .compress("var = ;")
            .unwrap_err();
        assert_eq!(err.compressor, "builtin");
        assert_eq!(err.to_string(), "builtin compressor failed");
    }
}
