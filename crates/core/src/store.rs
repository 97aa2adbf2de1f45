//! Host-keyed on-disk session cache.
//!
//! One JSON file per authentication host under a private cache directory.
//! Saves fully replace the prior cookie set for a host; partial merges never
//! happen. Concurrent writers to the same host are last-writer-wins, which is
//! acceptable for an interactive single-user tool.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cookie::Cookie;
use crate::error::{FetchError, Result};

const SESSION_FILE_EXT: &str = "json";

/// Durable cookie cache keyed by authentication host.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Opens the store at the default location, `~/.config/ssofetch/auth`.
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            FetchError::BrowserLaunch("could not determine home directory".into())
        })?;
        Self::open(home.join(".config").join("ssofetch").join("auth"))
    }

    /// Opens the store rooted at `dir`, creating it with private permissions.
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
        }

        Ok(Self { dir })
    }

    /// Persists the complete cookie set for `host`, replacing any prior file.
    pub fn save(&self, host: &str, cookies: &[Cookie]) -> Result<()> {
        let path = self.session_path(host);
        let data = serde_json::to_vec_pretty(cookies)?;
        fs::write(&path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        debug!(host, count = cookies.len(), "session saved");
        Ok(())
    }

    /// Loads the cached cookies for `host`.
    ///
    /// A missing file is an empty session, not an error; a file that exists
    /// but does not parse is.
    pub fn load(&self, host: &str) -> Result<Vec<Cookie>> {
        let path = self.session_path(host);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        serde_json::from_slice(&data).map_err(|source| FetchError::MalformedSession {
            path,
            source,
        })
    }

    /// Removes the cached session for `host`. Returns whether a file existed.
    pub fn clear(&self, host: &str) -> Result<bool> {
        match fs::remove_file(self.session_path(host)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists every host with a cached session, in directory order.
    pub fn list_hosts(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut hosts = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(host) = name.strip_suffix(&format!(".{SESSION_FILE_EXT}")) {
                hosts.push(host.to_string());
            }
        }

        Ok(hosts)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, host: &str) -> PathBuf {
        self.dir.join(format!("{host}.{SESSION_FILE_EXT}"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::cookie::SameSite;

    fn store() -> (TempDir, SessionStore) {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path().join("auth")).unwrap();
        (temp, store)
    }

    fn cookie(name: &str, value: &str, domain: &str) -> Cookie {
        Cookie {
            name: name.into(),
            value: value.into(),
            path: "/".into(),
            domain: domain.into(),
            expires: 2_000_000_000.0,
            max_age: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }

    #[test]
    fn save_then_load_round_trips_in_order() {
        let (_temp, store) = store();
        let cookies = vec![
            cookie("first", "1", ".example.com"),
            cookie("second", "2", "app.example.com"),
        ];

        store.save("app.example.com", &cookies).unwrap();
        let loaded = store.load("app.example.com").unwrap();
        assert_eq!(loaded, cookies);
    }

    #[test]
    fn save_replaces_rather_than_merges() {
        let (_temp, store) = store();
        store
            .save("app.example.com", &[cookie("old", "1", ""), cookie("stale", "2", "")])
            .unwrap();
        store.save("app.example.com", &[cookie("new", "3", "")]).unwrap();

        let loaded = store.load("app.example.com").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "new");
    }

    #[test]
    fn load_of_unknown_host_is_empty_not_error() {
        let (_temp, store) = store();
        assert!(store.load("never.seen.com").unwrap().is_empty());
    }

    #[test]
    fn load_of_malformed_file_is_error() {
        let (_temp, store) = store();
        std::fs::write(store.dir().join("bad.example.com.json"), b"{not json").unwrap();

        let err = store.load("bad.example.com").unwrap_err();
        assert!(matches!(err, FetchError::MalformedSession { .. }), "got {err}");
    }

    #[test]
    fn clear_is_idempotent() {
        let (_temp, store) = store();
        store.save("app.example.com", &[cookie("sid", "1", "")]).unwrap();

        assert!(store.clear("app.example.com").unwrap());
        assert!(!store.clear("app.example.com").unwrap());
        assert!(store.load("app.example.com").unwrap().is_empty());
    }

    #[test]
    fn list_hosts_returns_saved_set() {
        let (_temp, store) = store();
        for host in ["h1.example.com", "h2.example.com", "h3.example.com"] {
            store.save(host, &[cookie("sid", "1", "")]).unwrap();
        }

        let mut hosts = store.list_hosts().unwrap();
        hosts.sort();
        assert_eq!(hosts, ["h1.example.com", "h2.example.com", "h3.example.com"]);
    }

    #[test]
    fn list_hosts_on_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore {
            dir: temp.path().join("does-not-exist"),
        };
        assert!(store.list_hosts().unwrap().is_empty());
    }

    #[test]
    fn same_host_writers_are_last_writer_wins() {
        // Known race: nothing coordinates two logins for the same host. The
        // file simply reflects whichever save ran last.
        let (_temp, store) = store();
        store.save("app.example.com", &[cookie("a", "1", "")]).unwrap();
        store.save("app.example.com", &[cookie("b", "2", "")]).unwrap();

        let loaded = store.load("app.example.com").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "b");
    }

    #[cfg(unix)]
    #[test]
    fn cache_dir_and_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, store) = store();
        store.save("app.example.com", &[cookie("sid", "1", "")]).unwrap();

        let dir_mode = std::fs::metadata(store.dir()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);

        let file_mode = std::fs::metadata(store.dir().join("app.example.com.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
    }
}
