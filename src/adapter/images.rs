use std::fs::{self, File};
use std::io::{BufReader, BufWriter};

use camino::{Utf8Path, Utf8PathBuf};
use image::{ExtendedColorType, ImageReader};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::{ImageError, TaskError};
use crate::task::Context;

/// Optimize every raster image, mirroring the source tree under the output
/// directory. The only incremental task: a file whose destination
/// counterpart is at least as new is skipped without any write.
pub fn run(ctx: &Context) -> Result<(), TaskError> {
    let img_dir = ctx.layout.img_dir();
    let pattern = format!("{img_dir}/**/*.*");
    let out = ctx.layout.out_imgmin();

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = Utf8PathBuf::try_from(entry?)?;
        if path.extension() == Some("svg") || !path.is_file() {
            continue;
        }
        files.push(path);
    }

    let bar = ProgressBar::new(files.len() as u64).with_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("Error setting progress bar template")
            .progress_chars("#>-"),
    );

    files.par_iter().try_for_each(|src| -> Result<(), TaskError> {
        let rel = src
            .strip_prefix(&img_dir)
            .unwrap_or_else(|_| Utf8Path::new(src.file_name().unwrap_or_default()));
        let dst = out.join(rel);

        if crate::io::up_to_date(src, &dst)? {
            bar.inc(1);
            return Ok(());
        }

        if let Some(dir) = dst.parent() {
            fs::create_dir_all(dir)?;
        }

        optimize(src, &dst)?;
        bar.inc(1);

        Ok(())
    })?;

    bar.finish_with_message(format!("{} image(s)", files.len()));

    Ok(())
}

fn optimize(src: &Utf8Path, dst: &Utf8Path) -> Result<(), ImageError> {
    let ext = src.extension().unwrap_or_default().to_ascii_lowercase();

    match ext.as_str() {
        "png" => reencode_png(src, dst),
        "jpg" | "jpeg" => reencode_jpeg(src, dst),
        "webp" => reencode_webp(src, dst),
        // Formats without a safe re-encode (animated gifs, icons) pass
        // through unchanged.
        _ => {
            fs::copy(src, dst)?;
            Ok(())
        }
    }
}

fn decode(src: &Utf8Path) -> Result<image::DynamicImage, ImageError> {
    let reader = BufReader::new(File::open(src)?);
    Ok(ImageReader::new(reader).with_guessed_format()?.decode()?)
}

fn reencode_png(src: &Utf8Path, dst: &Utf8Path) -> Result<(), ImageError> {
    use image::ImageEncoder;
    use image::codecs::png::PngEncoder;

    let img = decode(src)?;
    let (width, height) = (img.width(), img.height());
    let rgba = img.to_rgba8();

    let mut writer = BufWriter::new(File::create(dst)?);
    PngEncoder::new(&mut writer).write_image(&rgba, width, height, ExtendedColorType::Rgba8)?;

    Ok(())
}

fn reencode_jpeg(src: &Utf8Path, dst: &Utf8Path) -> Result<(), ImageError> {
    use image::ImageEncoder;
    use image::codecs::jpeg::JpegEncoder;

    let img = decode(src)?;
    let (width, height) = (img.width(), img.height());
    // JPEG carries no alpha channel.
    let rgb = img.to_rgb8();

    let mut writer = BufWriter::new(File::create(dst)?);
    JpegEncoder::new_with_quality(&mut writer, 80).write_image(
        &rgb,
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;

    Ok(())
}

fn reencode_webp(src: &Utf8Path, dst: &Utf8Path) -> Result<(), ImageError> {
    use image::codecs::webp::WebPEncoder;

    let img = decode(src)?;
    let (width, height) = (img.width(), img.height());
    let rgba = img.to_rgba8();

    let mut writer = BufWriter::new(File::create(dst)?);
    WebPEncoder::new_lossless(&mut writer).encode(&rgba, width, height, ExtendedColorType::Rgba8)?;

    Ok(())
}
