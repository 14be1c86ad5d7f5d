//! Failure evidence capture
//!
//! Writes a screenshot and a DOM snapshot for a failing test as
//! `{test}_{yyyyMMdd_HHmmss}.png` and a matching `.html` sibling. Capture is
//! best-effort: errors are logged and show up as missing paths.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::driver::BrowserSession;
use crate::{Error, Result};

/// Files written for one failed test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceArtifact {
    /// Shared file stem, e.g. `testStartFreeTrialFromHome_20260114_093005`
    pub stem: String,
    pub screenshot_path: Option<PathBuf>,
    pub dom_path: Option<PathBuf>,
}

impl EvidenceArtifact {
    /// Both halves were written
    pub fn is_complete(&self) -> bool {
        self.screenshot_path.is_some() && self.dom_path.is_some()
    }

    /// Path to show in a failure report
    pub fn primary_path(&self) -> Option<&Path> {
        self.screenshot_path
            .as_deref()
            .or(self.dom_path.as_deref())
    }
}

/// Writes evidence under one directory
#[derive(Debug, Clone)]
pub struct EvidenceCapture {
    dir: PathBuf,
}

impl EvidenceCapture {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Capture the session's current screenshot and markup. Never fails.
    pub async fn capture(
        &self,
        session: &dyn BrowserSession,
        test_name: &str,
    ) -> Option<EvidenceArtifact> {
        match self.try_capture(session, test_name).await {
            Ok(artifact) => {
                if let Some(path) = artifact.primary_path() {
                    info!("Evidence for {} written to {}", test_name, path.display());
                }
                Some(artifact)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    async fn try_capture(
        &self,
        session: &dyn BrowserSession,
        test_name: &str,
    ) -> Result<EvidenceArtifact> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::evidence_capture(format!(
                "cannot create evidence directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let base = file_stem(test_name, Local::now());
        let reserved = self.reserve(&base).await.map_err(|e| {
            Error::evidence_capture(format!("cannot reserve files for {}: {}", test_name, e))
        })?;

        let screenshot = match session.screenshot().await {
            Ok(bytes) => write_all(reserved.png_file, &bytes)
                .await
                .map_err(|e| format!("writing {}: {}", reserved.png_path.display(), e)),
            Err(e) => {
                drop(reserved.png_file);
                Err(format!("screenshot: {}", e))
            }
        };
        let screenshot_path = keep_or_discard(reserved.png_path, screenshot, test_name).await;

        let dom = match session.page_source().await {
            Ok(html) => write_all(reserved.html_file, html.as_bytes())
                .await
                .map_err(|e| format!("writing {}: {}", reserved.html_path.display(), e)),
            Err(e) => {
                drop(reserved.html_file);
                Err(format!("page source: {}", e))
            }
        };
        let dom_path = keep_or_discard(reserved.html_path, dom, test_name).await;

        if screenshot_path.is_none() && dom_path.is_none() {
            return Err(Error::evidence_capture(format!(
                "nothing captured for {}",
                test_name
            )));
        }

        Ok(EvidenceArtifact {
            stem: reserved.stem,
            screenshot_path,
            dom_path,
        })
    }

    /// Claim both siblings of a stem that is not taken yet, suffixing `_2`,
    /// `_3`, ... on collision. A stem counts as taken if either file exists.
    async fn reserve(&self, base: &str) -> io::Result<Reserved> {
        const MAX_ATTEMPTS: u32 = 1000;

        for n in 1..=MAX_ATTEMPTS {
            let stem = if n == 1 {
                base.to_string()
            } else {
                format!("{}_{}", base, n)
            };
            let png_path = self.dir.join(format!("{}.png", stem));
            let html_path = self.dir.join(format!("{}.html", stem));

            let png_file = match create_new(&png_path).await {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            let html_file = match create_new(&html_path).await {
                Ok(file) => file,
                Err(e) => {
                    drop(png_file);
                    remove_quietly(&png_path).await;
                    if e.kind() == io::ErrorKind::AlreadyExists {
                        continue;
                    }
                    return Err(e);
                }
            };

            return Ok(Reserved {
                stem,
                png_path,
                png_file,
                html_path,
                html_file,
            });
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free evidence name for {}", base),
        ))
    }
}

/// Both sibling files of one capture, created empty
struct Reserved {
    stem: String,
    png_path: PathBuf,
    png_file: tokio::fs::File,
    html_path: PathBuf,
    html_file: tokio::fs::File,
}

async fn create_new(path: &Path) -> io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

/// Keep a written half, or drop its placeholder and log why it is missing
async fn keep_or_discard(
    path: PathBuf,
    written: std::result::Result<(), String>,
    test_name: &str,
) -> Option<PathBuf> {
    match written {
        Ok(()) => Some(path),
        Err(reason) => {
            let error = Error::evidence_capture(format!(
                "{} for {}: {}",
                path.display(),
                test_name,
                reason
            ));
            warn!("{}", error);
            remove_quietly(&path).await;
            None
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!("Could not remove {}: {}", path.display(), e);
    }
}

async fn write_all(mut file: tokio::fs::File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// Filesystem-safe test name
pub fn sanitize(test_name: &str) -> String {
    let cleaned: String = test_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "test".to_string()
    } else {
        cleaned
    }
}

/// `{test}_{yyyyMMdd_HHmmss}`
pub fn file_stem(test_name: &str, at: DateTime<Local>) -> String {
    format!("{}_{}", sanitize(test_name), at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::driver::{DriverFactory, DriverOptions, MockDriverFactory, MockPage, MockSite};
    use chrono::TimeZone;

    async fn session(factory: MockDriverFactory) -> Box<dyn BrowserSession> {
        let session = factory
            .create(&DriverOptions::from_config(&HarnessConfig::default()))
            .await
            .unwrap();
        session.navigate("http://localhost:3000/contact").await.unwrap();
        session
    }

    fn site() -> MockSite {
        MockSite::new("http://localhost:3000")
            .page("/contact", MockPage::new("Contact").html("<html><body>contact</body></html>"))
    }

    #[test]
    fn test_file_stem_format() {
        let at = Local.with_ymd_and_hms(2026, 1, 14, 9, 30, 5).unwrap();
        assert_eq!(
            file_stem("testStartFreeTrialFromHome", at),
            "testStartFreeTrialFromHome_20260114_093005"
        );
        assert_eq!(sanitize("cta: home/pricing"), "cta__home_pricing");
        assert_eq!(sanitize(""), "test");
    }

    #[tokio::test]
    async fn test_capture_writes_sibling_files() {
        let dir = tempfile::tempdir().unwrap();
        let evidence = EvidenceCapture::new(dir.path().join("screenshots"));
        let session = session(MockDriverFactory::new(site())).await;

        let artifact = evidence.capture(session.as_ref(), "testRequestDemo").await.unwrap();
        assert!(artifact.is_complete());
        assert!(artifact.stem.starts_with("testRequestDemo_"));

        let png = std::fs::read(artifact.screenshot_path.unwrap()).unwrap();
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]);
        let html = std::fs::read_to_string(artifact.dom_path.unwrap()).unwrap();
        assert!(html.contains("contact"));
    }

    #[tokio::test]
    async fn test_same_second_captures_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let evidence = EvidenceCapture::new(dir.path());
        let session = session(MockDriverFactory::new(site())).await;

        let first = evidence.capture(session.as_ref(), "dup").await.unwrap();
        let second = evidence.capture(session.as_ref(), "dup").await.unwrap();
        assert_ne!(first.screenshot_path, second.screenshot_path);
        assert_ne!(first.dom_path, second.dom_path);
    }

    #[tokio::test]
    async fn test_screenshot_failure_keeps_dom() {
        let dir = tempfile::tempdir().unwrap();
        let evidence = EvidenceCapture::new(dir.path());
        let session = session(MockDriverFactory::new(site()).fail_screenshot()).await;

        let artifact = evidence.capture(session.as_ref(), "noShot").await.unwrap();
        assert!(artifact.screenshot_path.is_none());
        assert!(artifact.dom_path.is_some());
        let pngs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.path().extension().map(|x| x == "png").unwrap_or(false))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(pngs, 0);
    }

    #[tokio::test]
    async fn test_dom_only_capture_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let evidence = EvidenceCapture::new(dir.path());
        let page = |body: &str| {
            let html = format!("<html>{}</html>", body);
            MockSite::new("http://localhost:3000")
                .page("/contact", MockPage::new("Contact").html(&html))
        };
        let broken = session(MockDriverFactory::new(page("FIRST")).fail_screenshot()).await;
        let healthy = session(MockDriverFactory::new(page("SECOND"))).await;

        let first = evidence.capture(broken.as_ref(), "same").await.unwrap();
        let second = evidence.capture(healthy.as_ref(), "same").await.unwrap();

        assert_ne!(first.stem, second.stem);
        assert_ne!(first.dom_path, second.dom_path);
        let first_html = std::fs::read_to_string(first.dom_path.unwrap()).unwrap();
        assert!(first_html.contains("FIRST"));
        let second_html = std::fs::read_to_string(second.dom_path.unwrap()).unwrap();
        assert!(second_html.contains("SECOND"));
    }

    #[tokio::test]
    async fn test_failed_dom_snapshot_leaves_no_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let evidence = EvidenceCapture::new(dir.path());
        let session = session(MockDriverFactory::new(site()).fail_page_source()).await;

        let artifact = evidence.capture(session.as_ref(), "noDom").await.unwrap();
        assert!(artifact.screenshot_path.is_some());
        assert!(artifact.dom_path.is_none());
        assert!(!dir.path().join(format!("{}.html", artifact.stem)).exists());
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let evidence = EvidenceCapture::new(blocker.join("screenshots"));
        let session = session(MockDriverFactory::new(site())).await;

        assert!(evidence.capture(session.as_ref(), "blocked").await.is_none());
    }
}
