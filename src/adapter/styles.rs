use std::fs;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::error::{StyleError, TaskError};
use crate::task::{Context, Signal};

const OUTPUT_NAME: &str = "styles.min.css";

/// Compile the SCSS entry to compressed CSS, vendor-prefix and minify it,
/// and write the bundle. Compilation errors are logged, not fatal: the
/// previous output stays in place and the watch loop keeps running.
pub fn run(ctx: &Context) -> Result<(), TaskError> {
    match compile(ctx) {
        Ok(()) => {
            ctx.notify(Signal::Styles(format!("css/{OUTPUT_NAME}")));
            Ok(())
        }
        Err(e) => {
            tracing::error!("stylesheet compilation failed, keeping previous output:\n{e}");
            Ok(())
        }
    }
}

fn compile(ctx: &Context) -> Result<(), StyleError> {
    let entry = ctx.layout.style_entry();

    let opts = grass::Options::default()
        .style(grass::OutputStyle::Compressed)
        .load_path(ctx.layout.scss_dir());
    let css = grass::from_path(&entry, &opts).map_err(|e| StyleError::Compile(e.to_string()))?;

    let css = transform(&css)?;

    let out = ctx.layout.out_css();
    fs::create_dir_all(&out)?;
    fs::write(out.join(OUTPUT_NAME), css)?;

    Ok(())
}

/// Vendor-prefix for the configured browser targets and minify. Grass does
/// no prefixing of its own.
fn transform(source: &str) -> Result<String, StyleError> {
    let mut sheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| StyleError::Transform(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets: targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| StyleError::Transform(e.to_string()))?;

    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets: targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleError::Transform(e.to_string()))?;

    Ok(result.code)
}

/// Roughly "last 10 versions" of the majors. Versions are encoded as
/// `major << 16 | minor << 8 | patch`.
fn targets() -> Targets {
    Targets {
        browsers: Some(Browsers {
            chrome: Some(109 << 16),
            edge: Some(109 << 16),
            firefox: Some(109 << 16),
            safari: Some((15 << 16) | (4 << 8)),
            ios_saf: Some((15 << 16) | (4 << 8)),
            ..Browsers::default()
        }),
        ..Targets::default()
    }
}
