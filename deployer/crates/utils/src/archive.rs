use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use flate2::read::GzDecoder;
use tokio::task::spawn_blocking;
use tracing::debug;

/// Archive formats used by the release artifacts we install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Failed to unpack {kind} archive into {}: {source}", dest.display())]
    Io {
        kind: ArchiveKind,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Extracts an in-memory archive into `dest`, creating `dest` if needed.
///
/// The work runs on the blocking pool. Entries escaping `dest` are rejected by the underlying
/// `tar`/`zip` implementations.
pub async fn extract_archive(kind: ArchiveKind, data: Bytes, dest: &Path) -> Result<(), ArchiveError> {
    let dest = dest.to_owned();
    spawn_blocking(move || extract_archive_sync(kind, &data, &dest)).await?
}

fn extract_archive_sync(kind: ArchiveKind, data: &[u8], dest: &Path) -> Result<(), ArchiveError> {
    let io_err = |source| ArchiveError::Io { kind, dest: dest.to_owned(), source };

    std::fs::create_dir_all(dest).map_err(io_err)?;

    match kind {
        ArchiveKind::TarGz => {
            let mut archive = tar::Archive::new(GzDecoder::new(Cursor::new(data)));
            archive.set_preserve_permissions(true);
            archive.unpack(dest).map_err(io_err)?;
        }
        ArchiveKind::Zip => {
            let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
            archive.extract(dest)?;
        }
    }

    debug!(%kind, dest = %dest.display(), size = data.len(), "archive extracted");
    Ok(())
}
