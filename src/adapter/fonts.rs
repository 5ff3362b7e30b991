//! Font conversion: every `.ttf`/`.otf` source is copied into the output
//! tree, wrapped into a WOFF container, and (for TrueType) compressed to
//! WOFF2 by the external `woff2_compress` tool.
//!
//! **Note:** WOFF2 conversion requires the `woff2_compress` binary to be
//! available in the system PATH.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::ZlibEncoder;

use crate::error::{FontError, TaskError};
use crate::task::Context;

pub fn run(ctx: &Context) -> Result<(), TaskError> {
    let pattern = format!("{}/**/*.*", ctx.layout.fonts_dir());
    let out = ctx.layout.out_fonts();

    for entry in glob::glob(&pattern)? {
        let path = Utf8PathBuf::try_from(entry?)?;
        if !path.is_file() {
            continue;
        }

        match path.extension() {
            Some("ttf") | Some("otf") => convert(&path, &out)?,
            _ => tracing::debug!("fonts: skipping {path}"),
        }
    }

    Ok(())
}

/// Both conversion legs are independent and merge into the same directory;
/// repeated runs overwrite.
fn convert(path: &Utf8Path, out_dir: &Utf8Path) -> Result<(), FontError> {
    let data = fs::read(path)?;
    let woff = encode_woff(path, &data)?;

    let name = path.file_name().unwrap_or("font");
    fs::create_dir_all(out_dir)?;

    let copied = out_dir.join(name);
    fs::write(&copied, &data)?;
    fs::write(copied.with_extension("woff"), woff)?;

    if path.extension() == Some("ttf") {
        compress_woff2(&copied)?;
    }

    Ok(())
}

/// Wrap an sfnt font into a WOFF container: the table directory is carried
/// over, each table deflated with zlib.
pub(crate) fn encode_woff(path: &Utf8Path, data: &[u8]) -> Result<Vec<u8>, FontError> {
    let face = ttf_parser::RawFace::parse(data, 0).map_err(FontError::Malformed)?;

    // WOFF requires the directory sorted by tag.
    let mut records: Vec<_> = face.table_records.into_iter().collect();
    records.sort_by_key(|r| r.tag.to_bytes());

    let mut tables = Vec::with_capacity(records.len());
    for record in &records {
        let start = record.offset as usize;
        let end = start + record.length as usize;
        let table = data
            .get(start..end)
            .ok_or_else(|| FontError::Truncated(path.to_path_buf()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(table)?;
        let compressed = encoder.finish()?;

        // A table is stored raw when deflate gains nothing.
        let payload = if compressed.len() < table.len() {
            compressed
        } else {
            table.to_vec()
        };
        tables.push(payload);
    }

    let num = records.len() as u32;
    let total_sfnt = 12 + 16 * num + records.iter().map(|r| align4(r.length)).sum::<u32>();

    let mut offsets = Vec::with_capacity(tables.len());
    let mut cursor = 44 + 20 * num;
    for payload in &tables {
        offsets.push(cursor);
        cursor += align4(payload.len() as u32);
    }
    let total_len = cursor;

    let mut out = Vec::with_capacity(total_len as usize);
    out.extend_from_slice(&0x774F_4646_u32.to_be_bytes()); // 'wOFF'
    out.extend_from_slice(&data[0..4]); // flavor: the original sfnt version
    out.extend_from_slice(&total_len.to_be_bytes());
    out.extend_from_slice(&(num as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&total_sfnt.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
    out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
    out.extend_from_slice(&[0u8; 20]); // no metadata or private blocks

    for ((record, payload), offset) in records.iter().zip(&tables).zip(&offsets) {
        out.extend_from_slice(&record.tag.to_bytes());
        out.extend_from_slice(&offset.to_be_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&record.length.to_be_bytes());
        out.extend_from_slice(&record.check_sum.to_be_bytes());
    }

    for payload in &tables {
        out.extend_from_slice(payload);
        out.resize(align4(out.len() as u32) as usize, 0);
    }

    Ok(out)
}

fn align4(n: u32) -> u32 {
    (n + 3) & !3
}

fn compress_woff2(path: &Utf8Path) -> Result<(), FontError> {
    let output = Command::new("woff2_compress")
        .arg(path.as_str())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        return Err(FontError::Woff2(
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    Ok(())
}
