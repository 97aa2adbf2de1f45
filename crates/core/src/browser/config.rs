//! Browser selection and per-kind debug configuration.

use std::fmt;
use std::path::PathBuf;

/// Which browser family to drive. Edge is the default for workplace SSO;
/// Chrome suits personal accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Edge,
    Chrome,
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserKind::Edge => write!(f, "edge"),
            BrowserKind::Chrome => write!(f, "chrome"),
        }
    }
}

/// Resolved launch/attach configuration for one driver invocation.
///
/// Built per call and never persisted. The executable may be absent when no
/// install was found; that only matters if a launch becomes necessary.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub kind: BrowserKind,
    pub executable: Option<String>,
    pub user_data_dir: PathBuf,
    pub debug_port: u16,
}

impl BrowserConfig {
    /// Resolves the configuration for `kind`.
    ///
    /// Each kind gets its own debug port and an isolated profile directory so
    /// a debug-enabled instance never collides with the user's main profile.
    pub fn resolve(kind: BrowserKind) -> Self {
        let debug_port = match kind {
            BrowserKind::Edge => 9222,
            BrowserKind::Chrome => 9223,
        };

        let data_root = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            kind,
            executable: find_executable(kind),
            user_data_dir: data_root.join("ssofetch").join(format!("{kind}-debug-profile")),
            debug_port,
        }
    }

    /// Local HTTP endpoint of the remote-debugging surface.
    pub fn debug_endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.debug_port)
    }
}

fn find_executable(kind: BrowserKind) -> Option<String> {
    let candidates: Vec<String> = if cfg!(target_os = "macos") {
        match kind {
            BrowserKind::Edge => {
                vec!["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge".into()]
            }
            BrowserKind::Chrome => {
                vec!["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into()]
            }
        }
    } else if cfg!(target_os = "windows") {
        windows_candidates(kind)
    } else {
        match kind {
            BrowserKind::Edge => ["microsoft-edge", "microsoft-edge-stable", "/usr/bin/microsoft-edge"],
            BrowserKind::Chrome => ["google-chrome", "google-chrome-stable", "/usr/bin/google-chrome"],
        }
        .into_iter()
        .map(str::to_string)
        .collect()
    };

    for candidate in candidates {
        if candidate.starts_with('/') || candidate.contains('\\') || candidate.contains(':') {
            if std::path::Path::new(&candidate).exists() {
                return Some(candidate);
            }
        } else if which::which(&candidate).is_ok() {
            return Some(candidate);
        }
    }

    None
}

fn windows_candidates(kind: BrowserKind) -> Vec<String> {
    let mut roots = Vec::new();
    for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
        if let Ok(value) = std::env::var(key) {
            roots.push(PathBuf::from(value));
        }
    }
    if roots.is_empty() {
        roots.push(PathBuf::from(r"C:\Program Files"));
        roots.push(PathBuf::from(r"C:\Program Files (x86)"));
    }

    let suffix: &[&str] = match kind {
        BrowserKind::Edge => &["Microsoft", "Edge", "Application", "msedge.exe"],
        BrowserKind::Chrome => &["Google", "Chrome", "Application", "chrome.exe"],
    };

    let mut candidates = Vec::new();
    for root in roots {
        let mut path = root;
        for component in suffix {
            path.push(component);
        }
        candidates.push(path.to_string_lossy().to_string());
    }

    candidates.push(match kind {
        BrowserKind::Edge => "msedge.exe".to_string(),
        BrowserKind::Chrome => "chrome.exe".to_string(),
    });

    candidates
}
