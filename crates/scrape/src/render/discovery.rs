// ABOUTME: Locates a Chromium-family browser executable by probing well-known install paths.
// ABOUTME: Pure candidate lists per platform; the first existing path wins.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Host platform families with distinct install layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for. Other unixes use the Linux layout.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

const WINDOWS_CANDIDATES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files\Chromium\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
    r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
];

const MACOS_CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

const LINUX_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/usr/bin/microsoft-edge",
];

/// Ordered install locations to probe on `platform`.
pub fn candidate_paths(platform: Platform) -> Vec<PathBuf> {
    let list = match platform {
        Platform::Windows => WINDOWS_CANDIDATES,
        Platform::MacOs => MACOS_CANDIDATES,
        Platform::Linux => LINUX_CANDIDATES,
    };
    list.iter().map(PathBuf::from).collect()
}

/// Pick the engine executable: the explicit override if it exists, otherwise
/// the first existing candidate for `platform`.
///
/// `exists` is injected so the probe can be exercised without touching the
/// real filesystem.
pub fn discover_engine<F>(
    platform: Platform,
    override_path: Option<&Path>,
    exists: F,
) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    if let Some(path) = override_path {
        if exists(path) {
            debug!(path = %path.display(), "using configured rendering engine");
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured rendering engine not found; probing defaults");
    }

    let found = candidate_paths(platform).into_iter().find(|p| exists(p));
    match &found {
        Some(path) => debug!(path = %path.display(), "found rendering engine"),
        None => warn!(?platform, "no rendering engine found; rendered fallback disabled"),
    }
    found
}

/// Probe the real filesystem for the current platform.
pub fn locate_engine(override_path: Option<&Path>) -> Option<PathBuf> {
    discover_engine(Platform::current(), override_path, |p| p.is_file())
}
