use std::fs;

use camino::Utf8PathBuf;

use crate::error::TaskError;
use crate::task::Context;

/// Minify the already-built top-level HTML into the nested `htmlmin`
/// subtree. Production post-process; not part of the watch-triggered set.
pub fn run(ctx: &Context) -> Result<(), TaskError> {
    let pattern = format!("{}/*.html", ctx.layout.out());
    let out = ctx.layout.out_htmlmin();

    let cfg = minify_html::Cfg::new();

    for entry in glob::glob(&pattern)? {
        let path = Utf8PathBuf::try_from(entry?)?;
        let data = fs::read(&path)?;
        let minified = minify_html::minify(&data, &cfg);

        let name = path.file_name().unwrap_or("index.html");
        crate::io::write_output(&out.join(name), &minified)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    #[test]
    fn collapses_whitespace_into_nested_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let ctx = Context::build(Layout::rooted(&root));

        fs::create_dir_all(ctx.layout.out()).unwrap();
        fs::write(
            ctx.layout.out().join("index.html"),
            "<p>\n    hello     world\n</p>\n",
        )
        .unwrap();

        run(&ctx).unwrap();

        let minified =
            fs::read_to_string(ctx.layout.out_htmlmin().join("index.html")).unwrap();
        assert!(minified.len() < "<p>\n    hello     world\n</p>\n".len());
        assert!(minified.contains("hello"));
        assert!(!minified.contains("\n    "));
    }

    #[test]
    fn only_top_level_html_is_minified() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let ctx = Context::build(Layout::rooted(&root));

        crate::io::write_output(&ctx.layout.out().join("sub/deep.html"), b"<p>x</p>").unwrap();

        run(&ctx).unwrap();

        assert!(!ctx.layout.out_htmlmin().join("deep.html").exists());
    }
}
