//! Installs versioned release binaries into a local binary directory.
//!
//! Every binary lives in its own `<prefix><version>` directory. A directory only counts as an
//! installation once it contains the binary, and new installations are unpacked into a staging
//! directory first so a failed download or extraction never leaves a usable-looking directory.

use std::env::consts;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use deployer_utils::{extract_archive, fetch_archive, ArchiveError, ArchiveKind, DownloadError};
use semver::Version;
use tracing::{debug, info};
use url::Url;

use crate::utils::constants::STAGING_DIR_PREFIX;

const ZIP_BUILD_DIR: &str = "build";

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("OS not supported: {0}")]
    UnsupportedOs(String),

    #[error("Architecture {arch} is not supported on {os}")]
    UnsupportedArch { os: String, arch: String },

    #[error("Invalid version {version:?}: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Invalid release url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to download {binary}: {source}")]
    Download {
        binary: String,
        #[source]
        source: DownloadError,
    },

    #[error("Failed to unpack {binary}: {source}")]
    Archive {
        binary: String,
        #[source]
        source: ArchiveError,
    },

    #[error("Release archive of {binary} does not contain {}", expected.display())]
    MissingBinary { binary: String, expected: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ProvisionError + '_ {
    move |source| ProvisionError::Io { path: path.to_owned(), source }
}

/// Parses `v1.7.14` as well as `1.7.14`.
pub fn parse_version(version: &str) -> Result<Version, ProvisionError> {
    Version::parse(version.trim_start_matches('v'))
        .map_err(|source| ProvisionError::InvalidVersion { version: version.to_string(), source })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    /// Name used by release artifacts (`GOOS`).
    pub fn release_name(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "darwin",
            Os::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.release_name())
    }
}

/// Target platform of a download, with the architecture in release naming (`amd64`, `arm64`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: String,
}

impl Platform {
    pub fn current() -> Result<Self, ProvisionError> {
        Self::from_target(consts::OS, consts::ARCH)
    }

    pub fn from_target(os: &str, arch: &str) -> Result<Self, ProvisionError> {
        let os = match os {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            other => return Err(ProvisionError::UnsupportedOs(other.to_string())),
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            other => return Err(ProvisionError::UnsupportedArch { os: os.to_string(), arch: other.to_string() }),
        };
        Ok(Self { os, arch: arch.to_string() })
    }
}

/// Naming scheme of a project's release artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseLayout {
    /// `<project>-linux-<arch>-v<ver>.tar.gz` holding `<project>-v<ver>/`, and per-OS zip archives
    /// holding `build/` on macOS and Windows.
    Node,
    /// `<project>_<ver>_<os>_<arch>.tar.gz` with the binary at the archive root.
    GoReleaser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    /// Releases page of the project, e.g. `https://github.com/<org>/<project>/releases`
    pub base_url: Url,
    pub project: String,
    pub layout: ReleaseLayout,
}

/// A downloadable archive and where the binary directory sits inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArchive {
    pub url: Url,
    pub kind: ArchiveKind,
    /// Directory of the archive holding the binary, `None` for the archive root
    pub root: Option<String>,
}

impl ReleaseSource {
    pub fn archive(&self, platform: &Platform, version: &Version) -> Result<ReleaseArchive, ProvisionError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let project = &self.project;
        let tag = format!("v{version}");

        let (file, kind, root) = match self.layout {
            ReleaseLayout::Node => match platform.os {
                Os::Linux => (
                    format!("{project}-linux-{}-{tag}.tar.gz", platform.arch),
                    ArchiveKind::TarGz,
                    Some(format!("{project}-{tag}")),
                ),
                Os::MacOs => (format!("{project}-macos-{tag}.zip"), ArchiveKind::Zip, Some(ZIP_BUILD_DIR.to_string())),
                Os::Windows => {
                    (format!("{project}-win-{tag}-experimental.zip"), ArchiveKind::Zip, Some(ZIP_BUILD_DIR.to_string()))
                }
            },
            ReleaseLayout::GoReleaser => {
                (format!("{project}_{version}_{}_{}.tar.gz", platform.os, platform.arch), ArchiveKind::TarGz, None)
            }
        };

        Ok(ReleaseArchive { url: Url::parse(&format!("{base}/download/{tag}/{file}"))?, kind, root })
    }
}

/// What to install and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySpec {
    /// Prefix of the installation directory, the version is appended to it
    pub dir_prefix: String,
    pub binary_name: String,
    pub source: ReleaseSource,
}

impl BinarySpec {
    pub fn dir_name(&self, version: &Version) -> String {
        format!("{}{}", self.dir_prefix, version)
    }
}

pub struct BinaryProvisioner {
    client: reqwest::Client,
    platform: Platform,
}

impl BinaryProvisioner {
    pub fn new(client: reqwest::Client, platform: Platform) -> Self {
        Self { client, platform }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Newest installation in `target_dir` whose version matches or exceeds `version`.
    pub async fn find_installed(
        &self,
        spec: &BinarySpec,
        target_dir: &Path,
        version: &Version,
    ) -> Result<Option<PathBuf>, ProvisionError> {
        let mut entries = match tokio::fs::read_dir(target_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ProvisionError::Io { path: target_dir.to_owned(), source }),
        };

        let mut newest: Option<(Version, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await.map_err(io_error(target_dir))? {
            let file_name = entry.file_name();
            let Some(installed) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix(&spec.dir_prefix))
                .and_then(|v| Version::parse(v).ok())
            else {
                continue;
            };
            if installed < *version {
                continue;
            }
            let path = entry.path();
            if !is_file(&path.join(&spec.binary_name)).await {
                debug!(dir = %path.display(), "ignoring installation without binary");
                continue;
            }
            if newest.as_ref().map_or(true, |(newest, _)| installed > *newest) {
                newest = Some((installed, path));
            }
        }

        Ok(newest.map(|(_, path)| path))
    }

    /// Returns the installation directory of the binary, downloading it first if needed.
    pub async fn ensure(
        &self,
        spec: &BinarySpec,
        target_dir: &Path,
        version: &Version,
    ) -> Result<PathBuf, ProvisionError> {
        if let Some(dir) = self.find_installed(spec, target_dir, version).await? {
            debug!(binary = %spec.binary_name, dir = %dir.display(), "binary found locally, skipping installation");
            return Ok(dir);
        }

        let archive = spec.source.archive(&self.platform, version)?;
        info!(binary = %spec.binary_name, %version, "Installing {}", spec.binary_name);

        let data = fetch_archive(&self.client, &archive.url)
            .await
            .map_err(|source| ProvisionError::Download { binary: spec.binary_name.clone(), source })?;

        tokio::fs::create_dir_all(target_dir).await.map_err(io_error(target_dir))?;
        let staging =
            tempfile::Builder::new().prefix(STAGING_DIR_PREFIX).tempdir_in(target_dir).map_err(io_error(target_dir))?;

        extract_archive(archive.kind, data, staging.path())
            .await
            .map_err(|source| ProvisionError::Archive { binary: spec.binary_name.clone(), source })?;

        let unpacked = match &archive.root {
            Some(root) => staging.path().join(root),
            None => staging.path().to_path_buf(),
        };
        let binary = unpacked.join(&spec.binary_name);
        if !is_file(&binary).await {
            return Err(ProvisionError::MissingBinary { binary: spec.binary_name.clone(), expected: binary });
        }

        let install_dir = target_dir.join(spec.dir_name(version));
        if tokio::fs::try_exists(&install_dir).await.map_err(io_error(&install_dir))? {
            // Left over from an older installation without a binary
            tokio::fs::remove_dir_all(&install_dir).await.map_err(io_error(&install_dir))?;
        }
        tokio::fs::rename(&unpacked, &install_dir).await.map_err(io_error(&install_dir))?;

        info!(binary = %spec.binary_name, dir = %install_dir.display(), "{} installation successful", spec.binary_name);
        Ok(install_dir)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|metadata| metadata.is_file()).unwrap_or(false)
}
