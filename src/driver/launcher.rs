//! Local Chromium-family process launcher

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::traits::{BrowserKind, DriverOptions};
use crate::{Error, Result};

/// File Chrome writes into the profile once the DevTools server is listening
const DEVTOOLS_PORT_FILE: &str = "DevToolsActivePort";

/// A browser process started by the harness, with its throwaway profile
#[derive(Debug)]
pub struct LaunchedBrowser {
    child: Child,
    profile_dir: PathBuf,
    port: u16,
}

impl LaunchedBrowser {
    /// DevTools port chosen by the browser
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Kill the process and remove its profile directory
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down browser process {:?}", self.child.id());
        if let Err(e) = self.child.kill().await {
            // Already exited
            debug!("Kill returned {}", e);
        }
        remove_profile(&self.profile_dir).await;
        Ok(())
    }
}

async fn remove_profile(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        warn!("Failed to remove profile {}: {}", dir.display(), e);
    }
}

/// Executables tried, in order, when no override is configured
pub fn executable_candidates(kind: BrowserKind) -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut candidates = match kind {
        BrowserKind::Chrome => vec![
            "google-chrome",
            "google-chrome-stable",
            "chrome",
            "chromium",
            "chromium-browser",
        ],
        BrowserKind::Chromium => vec!["chromium", "chromium-browser"],
        BrowserKind::Edge => vec!["microsoft-edge", "microsoft-edge-stable", "msedge"],
        BrowserKind::Firefox => Vec::new(),
    };

    #[cfg(target_os = "macos")]
    match kind {
        BrowserKind::Chrome => {
            candidates.push("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome")
        }
        BrowserKind::Chromium => {
            candidates.push("/Applications/Chromium.app/Contents/MacOS/Chromium")
        }
        BrowserKind::Edge => {
            candidates.push("/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge")
        }
        BrowserKind::Firefox => {}
    }

    #[cfg(target_os = "windows")]
    match kind {
        BrowserKind::Chrome => {
            candidates.push(r"C:\Program Files\Google\Chrome\Application\chrome.exe");
            candidates.push(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe");
        }
        BrowserKind::Edge => {
            candidates.push(r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe")
        }
        _ => {}
    }

    candidates
}

/// Command-line flags for a fresh, isolated browser
pub fn launch_args(options: &DriverOptions, profile_dir: &Path) -> Vec<String> {
    let mut args = vec![
        "--remote-debugging-port=0".to_string(),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-sync".to_string(),
        format!("--window-size={},{}", options.window_width, options.window_height),
    ];

    if options.headless {
        args.push("--headless=new".to_string());
    } else {
        args.push("--start-maximized".to_string());
    }

    args.push("about:blank".to_string());
    args
}

/// Launch a browser and wait until its DevTools server is reachable
pub async fn launch(kind: BrowserKind, options: &DriverOptions) -> Result<LaunchedBrowser> {
    let profile_dir = std::env::temp_dir().join(format!("oxide-e2e-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&profile_dir).await?;

    let candidates: Vec<String> = match &options.executable {
        Some(path) => vec![path.clone()],
        None => executable_candidates(kind).into_iter().map(String::from).collect(),
    };
    let args = launch_args(options, &profile_dir);

    let mut spawned = None;
    for exe in &candidates {
        debug!("Trying browser executable {}", exe);
        let result = Command::new(exe)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        match result {
            Ok(child) => {
                info!("Launched {} with PID {:?}", exe, child.id());
                spawned = Some(child);
                break;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                remove_profile(&profile_dir).await;
                return Err(Error::session_acquisition(format!(
                    "failed to launch {}: {}",
                    exe, e
                )));
            }
        }
    }

    let mut child = match spawned {
        Some(child) => child,
        None => {
            remove_profile(&profile_dir).await;
            return Err(Error::session_acquisition(format!(
                "no browser executable found (tried {})",
                candidates.join(", ")
            )));
        }
    };

    match wait_for_devtools_port(&mut child, &profile_dir, options).await {
        Ok(port) => Ok(LaunchedBrowser {
            child,
            profile_dir,
            port,
        }),
        Err(e) => {
            if let Err(kill) = child.kill().await {
                debug!("Kill after failed launch returned {}", kill);
            }
            remove_profile(&profile_dir).await;
            Err(e)
        }
    }
}

async fn wait_for_devtools_port(
    child: &mut Child,
    profile_dir: &Path,
    options: &DriverOptions,
) -> Result<u16> {
    let port_file = profile_dir.join(DEVTOOLS_PORT_FILE);
    let deadline = tokio::time::Instant::now() + options.launch_timeout;

    loop {
        if let Ok(contents) = tokio::fs::read_to_string(&port_file).await {
            if let Some(port) = parse_devtools_port(&contents) {
                debug!("DevTools listening on port {}", port);
                return Ok(port);
            }
        }

        if let Some(status) = child.try_wait()? {
            return Err(Error::session_acquisition(format!(
                "browser exited during startup with {}",
                status
            )));
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(Error::session_acquisition(format!(
                "browser did not open a DevTools port within {:?}",
                options.launch_timeout
            )));
        }

        tokio::time::sleep(options.poll_interval.min(Duration::from_millis(250))).await;
    }
}

/// First line of DevToolsActivePort is the port
fn parse_devtools_port(contents: &str) -> Option<u16> {
    contents
        .lines()
        .next()
        .and_then(|line| line.trim().parse().ok())
        .filter(|port| *port != 0)
}
