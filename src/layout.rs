use camino::{Utf8Path, Utf8PathBuf};

/// The source and output tree contract. Other tooling depends on these
/// locations, so they are fixed relative to the project root; only the root
/// itself moves (tests run against temporary directories).
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: Utf8PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::rooted(".")
    }
}

impl Layout {
    pub fn rooted(root: impl AsRef<Utf8Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn src(&self) -> Utf8PathBuf {
        self.root.join("src")
    }

    pub fn out(&self) -> Utf8PathBuf {
        self.root.join("app")
    }

    pub fn scss_dir(&self) -> Utf8PathBuf {
        self.src().join("scss")
    }

    pub fn style_entry(&self) -> Utf8PathBuf {
        self.scss_dir().join("styles.scss")
    }

    /// Script entries in concatenation order. Library code must precede the
    /// scripts using it, so the order here is meaningful.
    pub fn script_entries(&self) -> Vec<Utf8PathBuf> {
        vec![self.src().join("js/scripts.js")]
    }

    pub fn fonts_dir(&self) -> Utf8PathBuf {
        self.src().join("fonts")
    }

    pub fn img_dir(&self) -> Utf8PathBuf {
        self.src().join("img")
    }

    pub fn svg_dir(&self) -> Utf8PathBuf {
        self.img_dir().join("svg")
    }

    pub fn pages_dir(&self) -> Utf8PathBuf {
        self.src().join("html/pages")
    }

    pub fn components_dir(&self) -> Utf8PathBuf {
        self.src().join("html/components")
    }

    pub fn out_css(&self) -> Utf8PathBuf {
        self.out().join("css")
    }

    pub fn out_js(&self) -> Utf8PathBuf {
        self.out().join("js")
    }

    pub fn out_fonts(&self) -> Utf8PathBuf {
        self.out().join("fonts")
    }

    pub fn out_imgmin(&self) -> Utf8PathBuf {
        self.out().join("imgmin")
    }

    pub fn out_htmlmin(&self) -> Utf8PathBuf {
        self.out().join("htmlmin")
    }

    pub fn sprite_file(&self) -> Utf8PathBuf {
        self.out_imgmin().join("sprite.svg")
    }

    /// Live-reload client script, written into the output tree in watch mode.
    pub fn reload_client(&self) -> Utf8PathBuf {
        self.out().join("__reload.js")
    }
}
