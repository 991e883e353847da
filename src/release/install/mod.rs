//! Postinstall download of the Lumea launcher.
//!
//! Runs inside the installed npm package. If `dist/` does not already hold a
//! launcher for the package version, the matching release asset is fetched
//! from the project's release page, together with the API type declarations.

use crate::release::{
    error::{Error, ErrorExt, Result},
    platform::{OsFamily, PlatformTarget, RegistryId, resolve_host_platform},
    utils::http::{client, download_to_file},
};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Host serving release assets.
pub const DEFAULT_RELEASE_HOST: &str = "https://github.com";

/// `{owner}/{repo}` on the release host.
pub const DEFAULT_PROJECT: &str = "lumeajs/lumea";

/// Prefix of launcher release assets.
pub const DEFAULT_ARTIFACT_NAME: &str = "lumea";

/// Marker recording which version and launcher are installed.
pub const MARKER_FILE: &str = "path.txt";

/// API type declarations shipped next to the launcher.
pub const TYPES_FILE: &str = "types.d.ts";

/// Registry ids with a published launcher, and the build name of its asset.
const DOWNLOAD_NAMES: &[(&str, &str)] = &[("win32-x64", "x86_64-pc-windows-msvc")];

/// Where and what to install.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallConfig {
    /// Root of the installed npm package.
    pub package_dir: PathBuf,
    /// Release host, e.g. `https://github.com`.
    pub release_host: String,
    /// `{owner}/{repo}`.
    pub project: String,
    /// Asset name prefix.
    pub artifact_name: String,
    /// Also fetch `types.d.ts`.
    pub with_types: bool,
}

impl InstallConfig {
    /// Default configuration for the package rooted at `package_dir`.
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
            release_host: DEFAULT_RELEASE_HOST.into(),
            project: DEFAULT_PROJECT.into(),
            artifact_name: DEFAULT_ARTIFACT_NAME.into(),
            with_types: true,
        }
    }

    /// `{package_dir}/dist`
    pub fn dist_dir(&self) -> PathBuf {
        self.package_dir.join("dist")
    }

    /// URL of a file attached to the `v{version}` release.
    pub fn release_url(&self, version: &str, file: &str) -> String {
        format!(
            "{}/{}/releases/download/v{}/{}",
            self.release_host.trim_end_matches('/'),
            self.project,
            version,
            file
        )
    }
}

/// Result of an install run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The marker and launcher were already present.
    AlreadyInstalled {
        /// Launcher location.
        launcher: PathBuf,
    },
    /// The launcher was downloaded.
    Installed {
        /// Launcher location.
        launcher: PathBuf,
        /// Launcher size in bytes.
        bytes: u64,
        /// Type declarations, when requested.
        types: Option<PathBuf>,
    },
}

/// Build name of the release asset for `registry_id`.
pub fn download_name(registry_id: &str) -> Result<&'static str> {
    DOWNLOAD_NAMES
        .iter()
        .find(|(id, _)| *id == registry_id)
        .map(|(_, name)| *name)
        .ok_or_else(|| Error::UnsupportedPlatform {
            platform: registry_id.to_string(),
        })
}

#[derive(Deserialize)]
struct PackageVersion {
    version: String,
}

/// Reads `version` from `{dir}/package.json`.
pub async fn read_package_version(dir: &Path) -> Result<String> {
    let path = dir.join("package.json");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .fs_context("reading package manifest", &path)?;
    let manifest: PackageVersion = serde_json::from_str(&raw)?;
    Ok(manifest.version)
}

/// Contents of the marker file for `version` and `launcher_path`.
pub fn marker_contents(version: &str, launcher_path: &str) -> String {
    format!("v{version}-{launcher_path}")
}

/// Whether `dist` already holds the launcher for `version`.
pub async fn is_installed(dist: &Path, version: &str, launcher_path: &str) -> bool {
    let Ok(marker) = tokio::fs::read_to_string(dist.join(MARKER_FILE)).await else {
        return false;
    };
    let marker = marker.strip_prefix('v').unwrap_or(&marker);
    if marker != format!("{version}-{launcher_path}") {
        log::debug!("Marker {:?} does not match {}", marker, version);
        return false;
    }
    dist.join(launcher_path).is_file()
}

/// Returns true when an x64 process runs under Rosetta on Apple silicon.
async fn running_under_rosetta() -> bool {
    match tokio::process::Command::new("sysctl")
        .args(["-in", "sysctl.proc_translated"])
        .output()
        .await
    {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "1",
        Err(e) => {
            log::debug!("Rosetta probe failed: {}", e);
            false
        }
    }
}

/// Swaps a darwin x64 target for arm64 when the process is translated.
fn apply_rosetta(mut target: PlatformTarget, translated: bool) -> PlatformTarget {
    if translated && target.os == OsFamily::Darwin && target.registry_id.arch == "x64" {
        log::info!("Running under Rosetta, installing the arm64 build");
        target.registry_id = RegistryId::new(target.registry_id.platform.clone(), "arm64");
    }
    target
}

/// Resolves the host platform, preferring native arm64 builds on macOS
/// when this process is translated by Rosetta.
pub async fn resolve_install_platform() -> Result<PlatformTarget> {
    let target = resolve_host_platform()?;
    let translated = target.os == OsFamily::Darwin
        && target.registry_id.arch == "x64"
        && running_under_rosetta().await;
    Ok(apply_rosetta(target, translated))
}

/// Downloads launchers into an npm package.
#[derive(Debug)]
pub struct Installer {
    config: InstallConfig,
    client: Client,
}

impl Installer {
    /// Creates an installer with the release HTTP client.
    pub fn new(config: InstallConfig) -> Result<Self> {
        Ok(Self {
            config,
            client: client()?,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Installs the launcher for the running host.
    pub async fn install(&self) -> Result<InstallOutcome> {
        let target = resolve_install_platform().await?;
        self.install_for(&target).await
    }

    /// Installs the launcher for `target`.
    pub async fn install_for(&self, target: &PlatformTarget) -> Result<InstallOutcome> {
        let version = read_package_version(&self.config.package_dir).await?;
        let dist = self.config.dist_dir();
        let launcher = dist.join(target.launcher_path);

        log::info!("Installing Lumea v{} at {}", version, target.launcher_path);
        if is_installed(&dist, &version, target.launcher_path).await {
            log::info!("✓ Lumea is already installed at {}", target.launcher_path);
            return Ok(InstallOutcome::AlreadyInstalled { launcher });
        }

        let name = download_name(&target.registry_id.platform_arch())?;
        if let Some(parent) = launcher.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating install directory", parent)?;
        }

        let binary_url = self
            .config
            .release_url(&version, &format!("{}-{}", self.config.artifact_name, name));
        let types_path = dist.join(TYPES_FILE);
        let types_url = self.config.release_url(&version, TYPES_FILE);

        log::info!("Downloading {}", binary_url);
        let binary = download_to_file(&self.client, &binary_url, &launcher);
        let types = async {
            if self.config.with_types {
                log::info!("Downloading {}", types_url);
                download_to_file(&self.client, &types_url, &types_path)
                    .await
                    .map(Some)
            } else {
                Ok(None)
            }
        };
        let (binary, types) = tokio::join!(binary, types);
        let bytes = binary?;
        let types = types?.map(|_| types_path);

        make_executable(&launcher).await?;

        tokio::fs::write(
            dist.join(MARKER_FILE),
            marker_contents(&version, target.launcher_path),
        )
        .await
        .fs_context("writing install marker", dist.join(MARKER_FILE))?;

        log::info!("✓ Installed {} ({} bytes)", launcher.display(), bytes);
        Ok(InstallOutcome::Installed {
            launcher,
            bytes,
            types,
        })
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .fs_context("setting permissions of", path)
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::platform::resolve_platform;
    use mockito::{Server, ServerGuard};

    const RELEASE: &str = "/lumeajs/lumea/releases/download/v1.2.0";

    fn package(root: &Path, base: &str) -> InstallConfig {
        std::fs::write(root.join("package.json"), r#"{"name":"lumea","version":"1.2.0"}"#).unwrap();
        InstallConfig {
            release_host: base.to_string(),
            ..InstallConfig::new(root)
        }
    }

    fn windows() -> PlatformTarget {
        resolve_platform("win32", "x64").unwrap()
    }

    async fn not_found(server: &mut ServerGuard, path: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(404)
            .create_async()
            .await
    }

    #[test]
    fn rosetta_translated_darwin_x64_becomes_arm64() {
        let target = apply_rosetta(resolve_platform("macos", "x86_64").unwrap(), true);
        assert_eq!(target.registry_id.to_string(), "darwin-arm64");
        assert_eq!(target.launcher_path, "Lumea.app/Contents/MacOS/Lumea");
    }

    #[test]
    fn native_darwin_x64_is_kept() {
        let target = apply_rosetta(resolve_platform("macos", "x86_64").unwrap(), false);
        assert_eq!(target.registry_id.to_string(), "darwin-x64");
    }

    #[test]
    fn rosetta_only_applies_to_darwin() {
        let target = apply_rosetta(resolve_platform("linux", "x86_64").unwrap(), true);
        assert_eq!(target.registry_id.to_string(), "linux-x64");
    }

    #[test]
    fn release_url_template() {
        let config = InstallConfig::new("pkg");
        assert_eq!(
            config.release_url("1.2.0", "lumea-x86_64-pc-windows-msvc"),
            "https://github.com/lumeajs/lumea/releases/download/v1.2.0/lumea-x86_64-pc-windows-msvc"
        );
    }

    #[test]
    fn only_published_platforms_have_download_names() {
        assert_eq!(download_name("win32-x64").unwrap(), "x86_64-pc-windows-msvc");
        let err = download_name("linux-arm64").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Lumea builds are not available on platform: linux-arm64"
        );
    }

    #[tokio::test]
    async fn marker_must_match_version_and_launcher() {
        let tmp = tempfile::tempdir().unwrap();
        let dist = tmp.path();
        assert!(!is_installed(dist, "1.2.0", "lumea").await);

        std::fs::write(dist.join(MARKER_FILE), "v1.2.0-lumea").unwrap();
        assert!(!is_installed(dist, "1.2.0", "lumea").await);

        std::fs::write(dist.join("lumea"), "bin").unwrap();
        assert!(is_installed(dist, "1.2.0", "lumea").await);
        assert!(!is_installed(dist, "1.3.0", "lumea").await);

        std::fs::write(dist.join(MARKER_FILE), "1.2.0-lumea").unwrap();
        assert!(is_installed(dist, "1.2.0", "lumea").await);
    }

    #[tokio::test]
    async fn installs_launcher_types_and_marker() {
        let mut server = Server::new_async().await;
        let _launcher = server
            .mock("GET", format!("{RELEASE}/lumea-x86_64-pc-windows-msvc").as_str())
            .with_status(302)
            .with_header("location", "/cdn/lumea.exe")
            .create_async()
            .await;
        let _cdn = server
            .mock("GET", "/cdn/lumea.exe")
            .with_status(200)
            .with_body("MZ-launcher")
            .create_async()
            .await;
        let _types = server
            .mock("GET", format!("{RELEASE}/types.d.ts").as_str())
            .with_status(200)
            .with_body("declare module \"lumea/main\" {}")
            .create_async()
            .await;
        let base = server.url();
        let tmp = tempfile::tempdir().unwrap();
        let installer = Installer::new(package(tmp.path(), &base)).unwrap();

        let outcome = installer.install_for(&windows()).await.unwrap();
        let dist = tmp.path().join("dist");
        assert_eq!(
            outcome,
            InstallOutcome::Installed {
                launcher: dist.join("lumea.exe"),
                bytes: 11,
                types: Some(dist.join("types.d.ts")),
            }
        );
        assert_eq!(std::fs::read_to_string(dist.join("lumea.exe")).unwrap(), "MZ-launcher");
        assert_eq!(
            std::fs::read_to_string(dist.join(MARKER_FILE)).unwrap(),
            "v1.2.0-lumea.exe"
        );

        let again = installer.install_for(&windows()).await.unwrap();
        assert!(matches!(again, InstallOutcome::AlreadyInstalled { .. }));
    }

    #[tokio::test]
    async fn missing_release_leaves_no_partial_files() {
        let mut server = Server::new_async().await;
        let _launcher = not_found(&mut server, &format!("{RELEASE}/lumea-x86_64-pc-windows-msvc")).await;
        let _types = not_found(&mut server, &format!("{RELEASE}/types.d.ts")).await;
        let base = server.url();
        let tmp = tempfile::tempdir().unwrap();
        let installer = Installer::new(package(tmp.path(), &base)).unwrap();

        let err = installer.install_for(&windows()).await.unwrap_err();
        assert!(matches!(err, Error::Download { .. }));
        let dist = tmp.path().join("dist");
        assert!(!dist.join("lumea.exe").exists());
        assert!(!dist.join(TYPES_FILE).exists());
        assert!(!dist.join(MARKER_FILE).exists());
    }

    #[tokio::test]
    async fn redirect_chain_is_refused() {
        let mut server = Server::new_async().await;
        let _launcher = server
            .mock("GET", format!("{RELEASE}/lumea-x86_64-pc-windows-msvc").as_str())
            .with_status(302)
            .with_header("location", "/hop1")
            .create_async()
            .await;
        let _hop1 = server
            .mock("GET", "/hop1")
            .with_status(302)
            .with_header("location", &format!("{}/hop2", server.url()))
            .create_async()
            .await;
        let hop2 = server
            .mock("GET", "/hop2")
            .with_status(200)
            .with_body("MZ")
            .expect(0)
            .create_async()
            .await;
        let base = server.url();
        let tmp = tempfile::tempdir().unwrap();
        let mut config = package(tmp.path(), &base);
        config.with_types = false;

        let err = Installer::new(config)
            .unwrap()
            .install_for(&windows())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too many redirects"));
        assert!(!tmp.path().join("dist/lumea.exe").exists());
        hop2.assert_async().await;
    }

    #[tokio::test]
    async fn unsupported_platform_downloads_nothing() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let base = server.url();
        let tmp = tempfile::tempdir().unwrap();
        let installer = Installer::new(package(tmp.path(), &base)).unwrap();

        let err = installer
            .install_for(&resolve_platform("linux", "aarch64").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
        assert!(!tmp.path().join("dist").exists());
        any.assert_async().await;
    }
}
