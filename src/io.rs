use std::fmt::Display;
use std::fs;
use std::io;
use std::time::Instant;

use camino::Utf8Path;
use console::Style;

use crate::error::{CleanError, TaskError};
use crate::layout::Layout;
use crate::task::Context;

const ANSI_BLUE: Style = Style::new().blue();

pub fn as_overhead(s: Instant) -> impl Display {
    let e = Instant::now();
    let f = format!("(+{}ms)", e.duration_since(s).as_millis());
    ANSI_BLUE.apply_to(f)
}

/// Delete the entire output directory if it exists, then recreate it empty.
/// A missing directory is not an error.
pub fn clean_output(layout: &Layout) -> Result<(), CleanError> {
    let out = layout.out();

    if fs::metadata(&out).is_ok() {
        fs::remove_dir_all(&out) //
            .map_err(CleanError::Remove)?;
    }

    fs::create_dir_all(&out) //
        .map_err(CleanError::Create)?;

    Ok(())
}

pub(crate) fn clean_task(ctx: &Context) -> Result<(), TaskError> {
    Ok(clean_output(&ctx.layout)?)
}

/// Write `data` to `path`, creating parent directories as needed.
pub(crate) fn write_output(path: &Utf8Path, data: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    fs::write(path, data)
}

/// The incremental-copy policy: true when the destination exists and its
/// modification time is at least the source's.
pub(crate) fn up_to_date(src: &Utf8Path, dst: &Utf8Path) -> io::Result<bool> {
    let dst_meta = match fs::metadata(dst) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    Ok(dst_meta.modified()? >= fs::metadata(src)?.modified()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn utf8_temp() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn clean_tolerates_missing_output() {
        let (_guard, root) = utf8_temp();
        let layout = Layout::rooted(&root);

        clean_output(&layout).unwrap();
        assert!(layout.out().exists());
    }

    #[test]
    fn clean_removes_previous_artifacts() {
        let (_guard, root) = utf8_temp();
        let layout = Layout::rooted(&root);

        write_output(&layout.out().join("css/old.css"), b"stale").unwrap();
        clean_output(&layout).unwrap();

        assert!(layout.out().exists());
        assert!(!layout.out().join("css").exists());
    }

    #[test]
    fn up_to_date_policy() {
        let (_guard, root) = utf8_temp();
        let src = root.join("a.png");
        let dst = root.join("b.png");

        fs::write(&src, b"src").unwrap();
        assert!(!up_to_date(&src, &dst).unwrap());

        // Written after the source, so at least as new.
        fs::write(&dst, b"dst").unwrap();
        assert!(up_to_date(&src, &dst).unwrap());
    }
}
