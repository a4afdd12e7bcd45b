use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::core::errors::TransferError;

/// Buffer size for file I/O operations (128KB for good throughput)
const BUFFER_SIZE: usize = 128 * 1024;

/// Location classes the copy step distinguishes. The local adapter only
/// moves data between `Posix` locations; everything else is left to
/// adapters backed by a real transfer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationClass {
    /// A filesystem location reachable from this process (`local://` or
    /// `file://`).
    Posix,
    /// Anything behind a network protocol.
    Remote,
}

pub fn classify(url: &Url) -> LocationClass {
    match url.scheme() {
        "local" | "file" => LocationClass::Posix,
        _ => LocationClass::Remote,
    }
}

/// Resolve a `Posix` location to a filesystem path. `local://site/path`
/// is rooted under `base/site`; `file://` is taken as an absolute host
/// path.
pub fn resolve_posix_path(url: &Url, base: &Path) -> Result<PathBuf, TransferError> {
    match url.scheme() {
        "local" => {
            let site = url.host_str().ok_or_else(|| {
                TransferError::UnsupportedTransferClass(format!(
                    "local url without a site name: {url}"
                ))
            })?;
            let rel = url.path().trim_start_matches('/');
            Ok(base.join(site).join(rel))
        }
        "file" => url.to_file_path().map_err(|_| {
            TransferError::UnsupportedTransferClass(format!("unusable file url: {url}"))
        }),
        other => Err(TransferError::UnsupportedTransferClass(format!(
            "scheme '{other}' is not a filesystem location"
        ))),
    }
}

/// Outcome of one completed copy.
#[derive(Debug, Clone)]
pub struct CopyReport {
    pub bytes: u64,
}

/// Copy one file between two `Posix` locations.
///
/// Missing intermediate destination directories are created. An existing
/// destination is refused unless `overwrite` is set. Runs on the blocking
/// pool so a large file does not stall the polling thread.
pub async fn copy_url(
    source_url: &str,
    dest_url: &str,
    base: &Path,
    overwrite: bool,
    sync_files: bool,
) -> Result<CopyReport, TransferError> {
    let source_url = Url::parse(source_url).map_err(|e| {
        TransferError::UnsupportedTransferClass(format!("unparseable source url: {e}"))
    })?;
    let dest_url = Url::parse(dest_url).map_err(|e| {
        TransferError::UnsupportedTransferClass(format!("unparseable dest url: {e}"))
    })?;

    if classify(&source_url) != LocationClass::Posix {
        return Err(TransferError::UnsupportedTransferClass(format!(
            "cannot read from '{}' locations",
            source_url.scheme()
        )));
    }
    if classify(&dest_url) != LocationClass::Posix {
        return Err(TransferError::UnsupportedTransferClass(format!(
            "cannot write to '{}' locations",
            dest_url.scheme()
        )));
    }

    let source = resolve_posix_path(&source_url, base)?;
    let dest = resolve_posix_path(&dest_url, base)?;

    debug!(source = %source.display(), dest = %dest.display(), "copying file");

    tokio::task::spawn_blocking(move || copy_file(&source, &dest, overwrite, sync_files))
        .await
        .map_err(|e| TransferError::Io(std::io::Error::other(e)))?
}

fn copy_file(
    source: &Path,
    dest: &Path,
    overwrite: bool,
    sync_files: bool,
) -> Result<CopyReport, TransferError> {
    if dest.exists() && !overwrite {
        return Err(TransferError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "destination already exists: {}. Refusing to overwrite.",
                dest.display()
            ),
        )));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let source_file = File::open(source)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, source_file);

    let dest_file = File::create(dest)?;
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, dest_file);

    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut bytes_written: u64 = 0;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
        bytes_written += bytes_read as u64;
    }

    writer.flush()?;

    if sync_files {
        let inner = writer
            .into_inner()
            .map_err(|e| TransferError::Io(e.into_error()))?;
        inner.sync_all()?;
    }

    // Carry source timestamps over; losing them is acceptable on odd
    // filesystems.
    if let Err(e) = preserve_timestamps(source, dest) {
        debug!(dest = %dest.display(), error = %e, "failed to preserve timestamps");
    }

    Ok(CopyReport {
        bytes: bytes_written,
    })
}

fn preserve_timestamps(source: &Path, dest: &Path) -> std::io::Result<()> {
    let metadata = fs::metadata(source)?;
    let atime = filetime::FileTime::from_last_access_time(&metadata);
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(dest, atime, mtime)
}
