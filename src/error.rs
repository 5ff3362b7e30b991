use thiserror::Error;

use camino::Utf8PathBuf;

#[derive(Debug, Error)]
pub enum AtelierError {
    #[error("Error while cleaning the output directory:\n{0}")]
    Clean(#[from] CleanError),

    #[error("Error while building:\n{0}")]
    Build(#[from] BuildError),

    #[cfg(feature = "live")]
    #[error("Error while watching for file changes:\n{0}")]
    Watch(#[from] WatchError),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Task '{0}':\n{1}")]
    Task(&'static str, TaskError),

    #[error("No task named '{0}' is registered")]
    UnknownTask(String),
}

/// Failure of a single task invocation. In watch mode this aborts only the
/// current run; the watch loop stays alive.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Couldn't compile glob pattern.\n{0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Couldn't run glob.\n{0}")]
    Glob(#[from] glob::GlobError),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Sprite(#[from] SpriteError),

    #[error(transparent)]
    Pages(#[from] PagesError),

    #[error(transparent)]
    Clean(#[from] CleanError),
}

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't compile the stylesheet.\n{0}")]
    Compile(String),

    #[error("Couldn't transform the compiled CSS.\n{0}")]
    Transform(String),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't parse the script bundle.\n{0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed font file: {0}")]
    Malformed(ttf_parser::FaceParsingError),

    #[error("Table data out of bounds in '{0}'")]
    Truncated(Utf8PathBuf),

    #[error("woff2_compress execution failed: {0}")]
    Woff2(String),
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't parse SVG.\n{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed SVG attribute.\n{0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("No <svg> root element in '{0}'")]
    MissingRoot(Utf8PathBuf),
}

#[derive(Debug, Error)]
pub enum PagesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Include target '{0}' not found")]
    MissingInclude(Utf8PathBuf),

    #[error("Include cycle through '{0}'")]
    IncludeCycle(Utf8PathBuf),
}

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("Couldn't remove the output directory.\n{0}")]
    Remove(std::io::Error),

    #[error("Couldn't recreate the output directory.\n{0}")]
    Create(std::io::Error),
}

#[cfg(feature = "live")]
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Notify(#[from] notify::Error),
}
