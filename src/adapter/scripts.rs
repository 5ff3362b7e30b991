use std::fs;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::error::{ScriptError, TaskError};
use crate::task::{Context, Signal};

const OUTPUT_NAME: &str = "scripts.min.js";

/// Concatenate the script entries in configured order and minify the result.
/// A parse or minify failure aborts only this task invocation.
pub fn run(ctx: &Context) -> Result<(), TaskError> {
    let mut bundle = String::new();

    for entry in ctx.layout.script_entries() {
        bundle.push_str(&fs::read_to_string(&entry).map_err(ScriptError::Io)?);
        bundle.push('\n');
    }

    let code = minify(&bundle)?;

    let out = ctx.layout.out_js();
    fs::create_dir_all(&out).map_err(ScriptError::Io)?;
    fs::write(out.join(OUTPUT_NAME), code).map_err(ScriptError::Io)?;

    ctx.notify(Signal::Reload);

    Ok(())
}

fn minify(source: &str) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();

    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let errors = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ScriptError::Parse(errors));
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use camino::Utf8PathBuf;

    #[test]
    fn minify_strips_comments_and_whitespace() {
        let code = minify("// comment\nwindow.answer  =  40 + 2;\n").unwrap();
        assert!(!code.contains("comment"));
        assert!(code.contains("42"));
    }

    #[test]
    fn minify_rejects_invalid_syntax() {
        assert!(matches!(
            minify("function {"),
            Err(ScriptError::Parse(_))
        ));
    }

    #[test]
    fn bundle_preserves_entry_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let ctx = Context::build(Layout::rooted(&root));

        let js = ctx.layout.src().join("js");
        fs::create_dir_all(&js).unwrap();
        // A single entry stands in for a pre-ordered list; its own statement
        // order must survive minification.
        fs::write(
            js.join("scripts.js"),
            "window.first = function () { return 1; };\nwindow.second = function () { return 2; };\n",
        )
        .unwrap();

        run(&ctx).unwrap();

        let out = fs::read_to_string(ctx.layout.out_js().join(OUTPUT_NAME)).unwrap();
        let first = out.find("first").expect("first declaration kept");
        let second = out.find("second").expect("second declaration kept");
        assert!(first < second, "declaration order changed: {out}");
    }

    #[test]
    fn missing_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let ctx = Context::build(Layout::rooted(&root));

        assert!(run(&ctx).is_err());
    }
}
