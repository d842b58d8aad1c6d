//! Recursive archive extractor (`.zip`, `.tar`, `.rar`, `.7z`, `.gz`).
//!
//! An archive is a virtual filesystem: every regular-file member is
//! materialized into a uniquely named scratch directory, the dispatcher is
//! re-entered for each extracted path, and the merged records have their
//! `file_name` rewritten from the scratch location back to the logical
//! `<archive>/<member>` path. The scratch directory is removed when the
//! search returns on any path, success or failure.
//!
//! A bare `.gz` that is not a tarball has no member table; it is
//! decompressed as a raw stream to a file named after its stem and that
//! file is dispatched directly.

use crate::dispatch;
use crate::error::{DocgrepError, Result};
use crate::matcher::MatchedLine;
use crate::options::SearchOptions;
use flate2::read::GzDecoder;
use log::warn;
use std::fs::File;
use std::io;
use std::path::Path;
use std::process::Command;
use walkdir::WalkDir;
use zip::ZipArchive;

pub const EXTENSIONS: &[&str] = &[".ZIP", ".TAR", ".RAR", ".7Z", ".GZ", ".TGZ"];

/// Marker between the archive's name and the random scratch suffix; must be
/// stripped back out of every reported path.
const SCRATCH_MARKER: &str = "$extracted$";

/// Members larger than this are skipped rather than materialized.
const MAX_MEMBER_BYTES: u64 = 100 * 1024 * 1024;

pub fn search(path: &Path, terms: &[String], opts: &SearchOptions) -> Result<Vec<MatchedLine>> {
    let archive_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let scratch = tempfile::Builder::new()
        .prefix(&format!("{archive_name}{SCRATCH_MARKER}"))
        .tempdir()?;

    extract(path, scratch.path())?;

    let mut merged = Vec::new();
    for entry in WalkDir::new(scratch.path())
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if opts.cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let member = entry.path();
        let mut records = dispatch::search(member, terms, opts).map_err(|source| {
            DocgrepError::ArchiveEntry {
                entry: relative_name(scratch.path(), member),
                archive: path.to_path_buf(),
                source: source.to_string().into(),
            }
        })?;
        for record in &mut records {
            if !record.file_name.is_empty() {
                record.file_name = rewrite_scratch_path(scratch.path(), path, &record.file_name);
            }
        }
        merged.append(&mut records);
    }

    if opts.cancel.is_cancelled() {
        return Ok(Vec::new());
    }
    Ok(merged)
}

fn extract(path: &Path, scratch: &Path) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "zip" => extract_zip(path, scratch),
        "tar" => extract_tar(File::open(path)?, path, scratch),
        "tgz" => extract_tar(GzDecoder::new(File::open(path)?), path, scratch),
        "gz" if name.ends_with(".tar.gz") => {
            extract_tar(GzDecoder::new(File::open(path)?), path, scratch)
        }
        "gz" => extract_raw_gz(path, scratch),
        "7z" => extract_7z(path, scratch),
        "rar" => extract_rar(path, scratch),
        other => Err(DocgrepError::Other(format!(
            "unsupported archive extension '.{other}'"
        ))),
    }
}

fn extract_zip(path: &Path, scratch: &Path) -> Result<()> {
    let mut archive =
        ZipArchive::new(File::open(path)?).map_err(|e| classify_zip_error(path, e))?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| classify_zip_error(path, e))?;
        if entry.is_dir() || is_symlink_mode(entry.unix_mode()) {
            continue;
        }
        if entry.size() > MAX_MEMBER_BYTES {
            warn!(
                "skipping oversized archive member {} ({} bytes)",
                entry.name(),
                entry.size()
            );
            continue;
        }
        // Rejects absolute paths and `..` traversal.
        let Some(rel) = entry.enclosed_name() else {
            warn!("skipping archive member with unsafe path: {}", entry.name());
            continue;
        };
        let dest = scratch.join(rel);
        materialize(&mut entry, &dest).map_err(|source| DocgrepError::ArchiveEntry {
            entry: entry.name().to_string(),
            archive: path.to_path_buf(),
            source: Box::new(source),
        })?;
    }
    Ok(())
}

fn classify_zip_error(path: &Path, e: zip::result::ZipError) -> DocgrepError {
    if e.to_string().to_lowercase().contains("password") {
        DocgrepError::EncryptedArchive(path.to_path_buf())
    } else {
        DocgrepError::Zip(e)
    }
}

fn is_symlink_mode(unix_mode: Option<u32>) -> bool {
    unix_mode.map(|m| m & 0o170000 == 0o120000).unwrap_or(false)
}

fn extract_tar<R: io::Read>(reader: R, path: &Path, scratch: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        if entry.size() > MAX_MEMBER_BYTES {
            warn!(
                "skipping oversized archive member {} ({} bytes)",
                entry.path()?.display(),
                entry.size()
            );
            continue;
        }
        let entry_name = entry.path()?.display().to_string();
        // unpack_in refuses paths escaping the destination.
        entry
            .unpack_in(scratch)
            .map_err(|source| DocgrepError::ArchiveEntry {
                entry: entry_name,
                archive: path.to_path_buf(),
                source: Box::new(source),
            })?;
    }
    Ok(())
}

fn extract_raw_gz(path: &Path, scratch: &Path) -> Result<()> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "decompressed".to_string());
    let dest = scratch.join(stem);
    let mut decoder = GzDecoder::new(File::open(path)?);
    let mut out = File::create(&dest)?;
    io::copy(&mut decoder, &mut out).map_err(|source| DocgrepError::ArchiveEntry {
        entry: dest.file_name().unwrap_or_default().to_string_lossy().into_owned(),
        archive: path.to_path_buf(),
        source: Box::new(source),
    })?;
    Ok(())
}

fn extract_7z(path: &Path, scratch: &Path) -> Result<()> {
    sevenz_rust::decompress_file(path, scratch).map_err(|e| {
        if e.to_string().to_lowercase().contains("password") {
            DocgrepError::EncryptedArchive(path.to_path_buf())
        } else {
            DocgrepError::FileProcessing {
                path: path.to_path_buf(),
                source: e.to_string().into(),
            }
        }
    })
}

/// RAR has no mature pure-Rust reader; shell out to `unar`.
fn extract_rar(path: &Path, scratch: &Path) -> Result<()> {
    let status = Command::new("unar")
        .arg("-quiet")
        .arg("-o")
        .arg(scratch)
        .arg(path)
        .status()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DocgrepError::ArchiveTool(
                    "'unar' is required for .rar archives and was not found on PATH".to_string(),
                )
            } else {
                DocgrepError::Io(e)
            }
        })?;
    if !status.success() {
        return Err(DocgrepError::FileProcessing {
            path: path.to_path_buf(),
            source: format!("unar exited with {status}").into(),
        });
    }
    Ok(())
}

fn materialize(entry: &mut impl io::Read, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = File::create(dest)?;
    io::copy(entry, &mut out)?;
    Ok(())
}

fn relative_name(scratch: &Path, member: &Path) -> String {
    member
        .strip_prefix(scratch)
        .unwrap_or(member)
        .display()
        .to_string()
}

/// `<scratch>/<member>` -> `<archive>/<member>`, so reported paths trace
/// through the nesting instead of leaking temp locations.
fn rewrite_scratch_path(scratch: &Path, archive: &Path, reported: &str) -> String {
    match Path::new(reported).strip_prefix(scratch) {
        Ok(rel) => format!("{}/{}", archive.display(), rel.display()),
        Err(_) => reported.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_fixture(entries: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new()
            .suffix(".zip")
            .tempfile()
            .expect("temp file");
        let mut writer = zip::ZipWriter::new(file.reopen().expect("reopen"));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(content.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish zip");
        file
    }

    #[test]
    fn zip_members_report_logical_paths() {
        let f = zip_fixture(&[("notes.txt", "the first\nand the second\n")]);
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["the".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 2);
        let logical = format!("{}/notes.txt", f.path().display());
        assert_eq!(out[0].file_name, logical);
        // Sentinel: later records in the same member carry no path.
        assert!(out[1].file_name.is_empty());
        assert!(!out[0].file_name.contains(SCRATCH_MARKER));
    }

    #[test]
    fn nested_zip_paths_trace_through_both_levels() {
        let inner = zip_fixture(&[("deep.txt", "buried treasure\n")]);
        let inner_bytes = std::fs::read(inner.path()).unwrap();

        let file = tempfile::Builder::new().suffix(".zip").tempfile().unwrap();
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        writer
            .start_file("inner.zip", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&inner_bytes).unwrap();
        writer.finish().unwrap();

        let opts = SearchOptions::case_insensitive();
        let out = search(file.path(), &["treasure".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].file_name,
            format!("{}/inner.zip/deep.txt", file.path().display())
        );
    }

    #[test]
    fn raw_gzip_stream_is_searched_under_its_stem() {
        let file = tempfile::Builder::new()
            .suffix(".gz")
            .tempfile()
            .unwrap();
        let mut encoder =
            flate2::write::GzEncoder::new(file.reopen().unwrap(), flate2::Compression::default());
        encoder.write_all(b"compressed needle inside\n").unwrap();
        encoder.finish().unwrap();

        let opts = SearchOptions::case_insensitive();
        let out = search(file.path(), &["needle".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        let stem = file
            .path()
            .file_stem()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert_eq!(
            out[0].file_name,
            format!("{}/{}", file.path().display(), stem)
        );
    }

    #[test]
    fn tarball_members_are_searched() {
        let file = tempfile::Builder::new().suffix(".tar").tempfile().unwrap();
        let mut builder = tar::Builder::new(file.reopen().unwrap());
        let data = b"a needle in the tarball\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "member.txt", &data[..]).unwrap();
        builder.finish().unwrap();

        let opts = SearchOptions::case_insensitive();
        let out = search(file.path(), &["needle".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].file_name.ends_with("member.txt"));
    }

    #[test]
    fn unsafe_member_paths_are_skipped() {
        let f = zip_fixture(&[
            ("ok.txt", "findable content\n"),
            ("../escape.txt", "findable content\n"),
        ]);
        let opts = SearchOptions::case_insensitive();
        let out = search(f.path(), &["findable".to_string()], &opts).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].file_name.ends_with("ok.txt"));
    }

    #[test]
    fn pre_cancelled_archive_search_is_empty() {
        let f = zip_fixture(&[("notes.txt", "match me\n")]);
        let opts = SearchOptions::case_insensitive();
        opts.cancel.cancel();
        let out = search(f.path(), &["match".to_string()], &opts).unwrap();
        assert!(out.is_empty());
    }
}
