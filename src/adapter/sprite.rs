use std::fs;

use camino::Utf8PathBuf;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::error::{SpriteError, TaskError};
use crate::task::Context;

/// Pack every SVG in the sprite directory into a single stack-mode sprite:
/// nested `<svg id="…">` fragments, hidden unless targeted, referenced as
/// `sprite.svg#name`.
pub fn run(ctx: &Context) -> Result<(), TaskError> {
    let pattern = format!("{}/*.svg", ctx.layout.svg_dir());

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        files.push(Utf8PathBuf::try_from(entry?)?);
    }
    files.sort();

    if files.is_empty() {
        return Ok(());
    }

    let mut sprite = String::new();
    sprite.push_str(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">\n",
    );
    sprite.push_str("<style>:root>svg{display:none}:root>svg:target{display:block}</style>\n");

    for path in &files {
        let source = fs::read_to_string(path).map_err(SpriteError::Io)?;
        let (view_box, inner) = extract(&source, path)?;

        let id = path.file_stem().unwrap_or("icon");
        sprite.push_str(&format!("<svg id=\"{}\"", escape(id)));
        if let Some(vb) = view_box {
            sprite.push_str(&format!(" viewBox=\"{}\"", escape(&vb)));
        }
        sprite.push('>');
        sprite.push_str(inner);
        sprite.push_str("</svg>\n");
    }

    sprite.push_str("</svg>\n");

    crate::io::write_output(&ctx.layout.sprite_file(), sprite.as_bytes())?;

    Ok(())
}

/// Pull the `viewBox` and the inner markup out of a file's root `<svg>`
/// element. Anything before the root (declaration, comments, doctype) is
/// skipped; a missing root or malformed XML fails the task.
fn extract<'a>(
    source: &'a str,
    path: &Utf8PathBuf,
) -> Result<(Option<String>, &'a str), SpriteError> {
    let mut reader = Reader::from_str(source);

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"svg" => {
                let view_box = view_box(&e)?;
                let span = reader.read_to_end(e.name())?;
                return Ok((view_box, &source[span.start as usize..span.end as usize]));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"svg" => {
                return Ok((view_box(&e)?, ""));
            }
            Event::Eof => return Err(SpriteError::MissingRoot(path.clone())),
            _ => {}
        }
    }
}

fn view_box(e: &quick_xml::events::BytesStart) -> Result<Option<String>, SpriteError> {
    let Some(attr) = e.try_get_attribute("viewBox")? else {
        return Ok(None);
    };

    let value = attr
        .unescape_value()
        .map_err(|e| SpriteError::Xml(e.into()))?;

    Ok(Some(value.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    fn site() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, Context::build(Layout::rooted(root)))
    }

    #[test]
    fn packs_icons_into_stack_sprite() {
        let (_guard, ctx) = site();
        let svg = ctx.layout.svg_dir();
        fs::create_dir_all(&svg).unwrap();
        fs::write(
            svg.join("burger.svg"),
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0h24"/></svg>"#,
        )
        .unwrap();
        fs::write(
            svg.join("close.svg"),
            r#"<?xml version="1.0"?><svg viewBox="0 0 16 16"><circle r="8"/></svg>"#,
        )
        .unwrap();

        run(&ctx).unwrap();

        let sprite = fs::read_to_string(ctx.layout.sprite_file()).unwrap();
        assert!(sprite.contains(r#"id="burger""#));
        assert!(sprite.contains(r#"id="close""#));
        assert!(sprite.contains(r#"viewBox="0 0 24 24""#));
        assert!(sprite.contains(r#"<path d="M0 0h24"/>"#));
        assert!(sprite.contains(":target"));
    }

    #[test]
    fn no_sources_no_sprite() {
        let (_guard, ctx) = site();
        run(&ctx).unwrap();
        assert!(!ctx.layout.sprite_file().exists());
    }

    #[test]
    fn malformed_svg_fails_the_task() {
        let (_guard, ctx) = site();
        let svg = ctx.layout.svg_dir();
        fs::create_dir_all(&svg).unwrap();
        fs::write(svg.join("broken.svg"), "<svg><path></svg>").unwrap();

        assert!(run(&ctx).is_err());
    }

    #[test]
    fn non_svg_root_is_rejected() {
        let path = Utf8PathBuf::from("x.svg");
        let result = extract("<div>nope</div>", &path);
        assert!(matches!(result, Err(SpriteError::MissingRoot(_))));
    }
}
