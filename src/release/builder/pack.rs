//! Binary packing.
//!
//! A packed artifact is a copy of the platform launcher with the staging
//! directory appended as a zip archive, followed by a 12-byte footer:
//! the magic `ASST` and the archive length as a little-endian `u64`. The
//! launcher finds its assets by reading that footer from the end of its own
//! executable.
//!
//! Packing can be delegated to an external packer executable that takes
//! `<launcher> <staged_dir> <out>`, or done in-process.

use crate::release::{
    error::{Error, ErrorExt, ExitCode, Result},
    utils::fs::to_slash,
};
use std::{
    fs::{File, OpenOptions},
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter, write::SimpleFileOptions};

/// Footer marker.
pub const MAGIC: &[u8; 4] = b"ASST";

/// Magic plus the `u64` archive length.
pub const FOOTER_LEN: u64 = 4 + 8;

/// How the staging directory gets into the launcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packer {
    /// Run an external packer executable.
    External {
        /// Packer executable.
        program: PathBuf,
    },
    /// Zip and append in-process.
    Embedded,
}

impl Packer {
    /// Produces `out` from `launcher` with `staged_dir` embedded.
    pub async fn pack(&self, launcher: &Path, staged_dir: &Path, out: &Path) -> Result<()> {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating output directory", parent)?;
        }

        match self {
            Self::External { program } => run_external(program, launcher, staged_dir, out).await,
            Self::Embedded => {
                let (launcher, staged_dir, out) =
                    (launcher.to_path_buf(), staged_dir.to_path_buf(), out.to_path_buf());
                let zip_size = tokio::task::spawn_blocking(move || {
                    pack_embedded(&launcher, &staged_dir, &out)
                })
                .await
                .map_err(|e| Error::GenericError(format!("Packing task panicked: {}", e)))??;
                log::debug!("Appended {} byte asset archive", zip_size);
                Ok(())
            }
        }
    }
}

async fn run_external(program: &Path, launcher: &Path, staged_dir: &Path, out: &Path) -> Result<()> {
    log::info!(
        "Running packer {} {} {} {}",
        program.display(),
        launcher.display(),
        staged_dir.display(),
        out.display()
    );

    let output = tokio::process::Command::new(program)
        .arg(launcher)
        .arg(staged_dir)
        .arg(out)
        .output()
        .await
        .map_err(|error| Error::CommandFailed {
            command: program.display().to_string(),
            error,
        })?;

    if !output.status.success() {
        return Err(Error::ExternalProcess {
            program: program.display().to_string(),
            code: ExitCode::from(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    if !output.stdout.is_empty() {
        log::debug!("packer: {}", String::from_utf8_lossy(&output.stdout).trim_end());
    }
    Ok(())
}

/// Zips every file under `dir` with paths relative to `dir`.
///
/// Entries are sorted and timestamps fixed, so the same tree always yields
/// the same bytes.
pub fn zip_dir(dir: &Path) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
        .last_modified_time(DateTime::default());

    for entry in walkdir::WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel_path = to_slash(entry.path().strip_prefix(dir)?);

        zip.start_file(rel_path, options)?;
        let mut f = File::open(entry.path()).fs_context("opening asset", entry.path())?;
        io::copy(&mut f, &mut zip).fs_context("compressing asset", entry.path())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Copies `launcher` to `out` and appends the zipped `staged_dir` plus footer.
///
/// Returns the archive size.
pub fn pack_embedded(launcher: &Path, staged_dir: &Path, out: &Path) -> Result<u64> {
    if !launcher.is_file() {
        return Err(Error::GenericError(format!(
            "launcher binary {} does not exist",
            launcher.display()
        )));
    }

    let archive = zip_dir(staged_dir)?;
    let zip_size = archive.len() as u64;

    std::fs::copy(launcher, out).fs_context("copying launcher to", out)?;

    let mut out_file = OpenOptions::new()
        .append(true)
        .open(out)
        .fs_context("opening packed binary", out)?;
    out_file.write_all(&archive).fs_context("appending assets to", out)?;
    out_file.write_all(MAGIC).fs_context("writing footer to", out)?;
    out_file
        .write_all(&zip_size.to_le_bytes())
        .fs_context("writing footer to", out)?;
    out_file.sync_all().fs_context("syncing", out)?;
    drop(out_file);

    // Read the footer back; a launcher that cannot find it is useless.
    let embedded = read_embedded(out)?;
    if embedded.len() as u64 != zip_size {
        return Err(Error::GenericError(format!(
            "packed binary {} reports {} embedded bytes, expected {}",
            out.display(),
            embedded.len(),
            zip_size
        )));
    }

    log::info!(
        "Packed `{}` ({} bytes ZIP) into `{}`",
        staged_dir.display(),
        zip_size,
        out.display()
    );
    Ok(zip_size)
}

/// Extracts the embedded zip archive from a packed binary.
pub fn read_embedded(path: &Path) -> Result<Vec<u8>> {
    let no_assets = || Error::NoEmbeddedAssets {
        path: path.to_path_buf(),
    };

    let mut file = File::open(path).fs_context("opening packed binary", path)?;
    let len = file.metadata().fs_context("reading metadata of", path)?.len();
    if len < FOOTER_LEN {
        return Err(no_assets());
    }

    file.seek(SeekFrom::End(-(FOOTER_LEN as i64)))
        .fs_context("seeking footer in", path)?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).fs_context("reading footer of", path)?;
    if &magic != MAGIC {
        return Err(no_assets());
    }
    let mut size_bytes = [0u8; 8];
    file.read_exact(&mut size_bytes)
        .fs_context("reading footer of", path)?;
    let zip_size = u64::from_le_bytes(size_bytes);
    if zip_size > len - FOOTER_LEN {
        return Err(no_assets());
    }

    file.seek(SeekFrom::Start(len - FOOTER_LEN - zip_size))
        .fs_context("seeking archive in", path)?;
    let mut buf = Vec::with_capacity(zip_size as usize);
    file.take(zip_size)
        .read_to_end(&mut buf)
        .fs_context("reading archive from", path)?;
    Ok(buf)
}

/// Lists the entry names of the archive embedded in `path`.
pub fn embedded_entries(path: &Path) -> Result<Vec<String>> {
    let archive = ZipArchive::new(Cursor::new(read_embedded(path)?))?;
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    Ok(names)
}
