use std::path::{Path, PathBuf};

use bytes::Bytes;
use deployer_utils::{extract_archive, fetch_archive, ArchiveError, ArchiveKind, DownloadError};
use tracing::{debug, info, warn};
use url::Url;

use crate::utils::constants::{BOOTSTRAP_SNAPSHOT_ARCHIVE_NAME, SNAPSHOT_DIR_PREFIX, STAGING_DIR_PREFIX};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed downloading bootstrap snapshot: {0}")]
    Download(#[from] DownloadError),

    #[error("Failed installing bootstrap snapshot: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Snapshot archive {} does not contain {}", archive.display(), expected.display())]
    MissingSnapshot { archive: PathBuf, expected: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io { path: path.to_owned(), source }
}

/// Keeps the bootstrap network snapshot available on disk.
///
/// The snapshot archive is downloaded once and kept next to the extracted snapshot, so a forced
/// reset only needs to extract it again.
pub struct SnapshotManager {
    client: reqwest::Client,
    archive_url: Url,
    snapshot_name: String,
}

impl SnapshotManager {
    pub fn new(client: reqwest::Client, archive_url: Url, snapshot_name: impl Into<String>) -> Self {
        Self { client, archive_url, snapshot_name: snapshot_name.into() }
    }

    pub fn snapshot_name(&self) -> &str {
        &self.snapshot_name
    }

    pub fn snapshot_dir(&self, snapshots_dir: &Path) -> PathBuf {
        snapshots_dir.join(self.snapshot_dir_name())
    }

    fn snapshot_dir_name(&self) -> String {
        format!("{SNAPSHOT_DIR_PREFIX}{}", self.snapshot_name)
    }

    /// Makes sure the default snapshot is extracted in `snapshots_dir`.
    ///
    /// With `force` an already extracted snapshot is removed and extracted again from the archive.
    pub async fn ensure_default_snapshot(&self, snapshots_dir: &Path, force: bool) -> Result<(), SnapshotError> {
        let archive_path = snapshots_dir.join(BOOTSTRAP_SNAPSHOT_ARCHIVE_NAME);
        if !exists(&archive_path).await? {
            info!("Downloading bootstrap snapshot");
            let data = fetch_archive(&self.client, &self.archive_url).await?;
            write_atomically(snapshots_dir, &archive_path, &data).await?;
        }

        let snapshot_dir = self.snapshot_dir(snapshots_dir);
        if force && exists(&snapshot_dir).await? {
            debug!(dir = %snapshot_dir.display(), "removing default snapshot");
            tokio::fs::remove_dir_all(&snapshot_dir).await.map_err(io_error(&snapshot_dir))?;
        }

        if !exists(&snapshot_dir).await? {
            self.extract_snapshot(snapshots_dir, &archive_path, &snapshot_dir).await?;
            info!(snapshot = %self.snapshot_name, "Default snapshot installed");
        }

        Ok(())
    }

    /// Extracts the cached archive into a staging directory and moves the snapshot into place.
    ///
    /// A cached archive that fails to extract is deleted so the next call downloads it again.
    async fn extract_snapshot(
        &self,
        snapshots_dir: &Path,
        archive_path: &Path,
        snapshot_dir: &Path,
    ) -> Result<(), SnapshotError> {
        let data = tokio::fs::read(archive_path).await.map_err(io_error(archive_path))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir_in(snapshots_dir)
            .map_err(io_error(snapshots_dir))?;

        if let Err(e) = extract_archive(ArchiveKind::TarGz, Bytes::from(data), staging.path()).await {
            discard_archive(archive_path).await?;
            return Err(e.into());
        }

        let unpacked = staging.path().join(self.snapshot_dir_name());
        if !exists(&unpacked).await? {
            discard_archive(archive_path).await?;
            return Err(SnapshotError::MissingSnapshot { archive: archive_path.to_owned(), expected: unpacked });
        }
        tokio::fs::rename(&unpacked, snapshot_dir).await.map_err(io_error(snapshot_dir))
    }
}

async fn exists(path: &Path) -> Result<bool, SnapshotError> {
    tokio::fs::try_exists(path).await.map_err(io_error(path))
}

async fn discard_archive(path: &Path) -> Result<(), SnapshotError> {
    warn!(archive = %path.display(), "Bootstrap snapshot archive is unusable, removing it");
    tokio::fs::remove_file(path).await.map_err(io_error(path))
}

async fn write_atomically(dir: &Path, path: &Path, data: &[u8]) -> Result<(), SnapshotError> {
    tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))?;
    let partial = path.with_extension("partial");
    tokio::fs::write(&partial, data).await.map_err(io_error(&partial))?;
    tokio::fs::rename(&partial, path).await.map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::archives::tar_gz;
    use assert_matches::assert_matches;
    use httpmock::prelude::*;
    use rstest::rstest;

    const SNAPSHOT: &str = "default-1654102509";

    fn snapshot_archive() -> Vec<u8> {
        tar_gz(&[
            ("anr-snapshot-default-1654102509/", b""),
            ("anr-snapshot-default-1654102509/network.json", b"{}"),
        ])
    }

    fn manager(url: &str) -> SnapshotManager {
        SnapshotManager::new(reqwest::Client::new(), url.parse().unwrap(), SNAPSHOT)
    }

    /// Bytes that gzip cannot shrink, so cutting the archive lands inside this file.
    fn noise(len: usize) -> Vec<u8> {
        let mut state = 0x2545_f491_u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect()
    }

    #[rstest]
    #[tokio::test]
    async fn downloads_once_and_extracts() {
        let server = MockServer::start_async().await;
        let download = server
            .mock_async(|when, then| {
                when.method(GET).path("/assets/bootstrapSnapshot.tar.gz");
                then.status(200).body(snapshot_archive());
            })
            .await;
        let snapshots_dir = tempfile::tempdir().unwrap();
        let manager = manager(&server.url("/assets/bootstrapSnapshot.tar.gz"));

        manager.ensure_default_snapshot(snapshots_dir.path(), false).await.unwrap();
        manager.ensure_default_snapshot(snapshots_dir.path(), false).await.unwrap();

        download.assert_hits_async(1).await;
        assert!(snapshots_dir.path().join(BOOTSTRAP_SNAPSHOT_ARCHIVE_NAME).is_file());
        assert!(manager.snapshot_dir(snapshots_dir.path()).join("network.json").is_file());
    }

    #[rstest]
    #[tokio::test]
    async fn force_extracts_again_from_the_archive_on_disk() {
        let server = MockServer::start_async().await;
        let download = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body(snapshot_archive());
            })
            .await;
        let snapshots_dir = tempfile::tempdir().unwrap();
        let manager = manager(&server.url("/snapshot.tar.gz"));
        manager.ensure_default_snapshot(snapshots_dir.path(), false).await.unwrap();
        let leftover = manager.snapshot_dir(snapshots_dir.path()).join("db-from-last-run");
        std::fs::write(&leftover, b"state").unwrap();

        manager.ensure_default_snapshot(snapshots_dir.path(), false).await.unwrap();
        assert!(leftover.exists());

        manager.ensure_default_snapshot(snapshots_dir.path(), true).await.unwrap();
        assert!(!leftover.exists());
        assert!(manager.snapshot_dir(snapshots_dir.path()).join("network.json").is_file());
        download.assert_hits_async(1).await;
    }

    #[rstest]
    #[case(404)]
    #[case(500)]
    #[tokio::test]
    async fn failed_download_writes_nothing(#[case] status: u16) {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(status);
            })
            .await;
        let root = tempfile::tempdir().unwrap();
        let snapshots_dir = root.path().join("snapshots");
        let manager = manager(&server.url("/snapshot.tar.gz"));

        let result = manager.ensure_default_snapshot(&snapshots_dir, false).await;

        assert_matches!(result, Err(SnapshotError::Download(_)));
        assert!(!snapshots_dir.exists());
    }

    #[rstest]
    #[tokio::test]
    async fn truncated_archive_is_not_installed_and_downloaded_again() {
        let big = noise(200 * 1024);
        let archive = tar_gz(&[
            ("anr-snapshot-default-1654102509/", b""),
            ("anr-snapshot-default-1654102509/network.json", b"{}"),
            ("anr-snapshot-default-1654102509/db/big", &big),
        ]);
        let server = MockServer::start_async().await;
        let truncated = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body(&archive[..archive.len() / 2]);
            })
            .await;
        let snapshots_dir = tempfile::tempdir().unwrap();
        let manager = manager(&server.url("/snapshot.tar.gz"));

        let result = manager.ensure_default_snapshot(snapshots_dir.path(), false).await;

        assert_matches!(result, Err(SnapshotError::Archive(_)));
        assert!(!manager.snapshot_dir(snapshots_dir.path()).exists());
        assert_eq!(std::fs::read_dir(snapshots_dir.path()).unwrap().count(), 0);

        truncated.delete_async().await;
        let complete = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body(&archive);
            })
            .await;

        manager.ensure_default_snapshot(snapshots_dir.path(), false).await.unwrap();

        complete.assert_hits_async(1).await;
        let snapshot_dir = manager.snapshot_dir(snapshots_dir.path());
        assert_eq!(std::fs::read(snapshot_dir.join("db/big")).unwrap(), big);
    }

    #[rstest]
    #[tokio::test]
    async fn archive_without_the_snapshot_is_discarded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body(tar_gz(&[("anr-snapshot-other/network.json", b"{}")]));
            })
            .await;
        let snapshots_dir = tempfile::tempdir().unwrap();
        let manager = manager(&server.url("/snapshot.tar.gz"));

        let result = manager.ensure_default_snapshot(snapshots_dir.path(), false).await;

        assert_matches!(result, Err(SnapshotError::MissingSnapshot { .. }));
        assert!(!manager.snapshot_dir(snapshots_dir.path()).exists());
        assert!(!snapshots_dir.path().join(BOOTSTRAP_SNAPSHOT_ARCHIVE_NAME).exists());
    }
}
