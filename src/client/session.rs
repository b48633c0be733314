use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::client::ClientError;

/// The minimal user profile kept alongside the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    profile: Profile,
}

type AuthListener = Box<dyn Fn(bool) + Send>;

/// Holds at most one token and one user profile at a time, persisted as a
/// JSON file (last-write-wins, no multi-session support).
///
/// This is the CLI counterpart of the browser client's local storage. Views
/// interested in session transitions register a callback with
/// [`SessionStore::on_change`]; it fires whenever the store moves between
/// authenticated and anonymous.
pub struct SessionStore {
    path: PathBuf,
    current: Option<StoredSession>,
    listeners: Vec<AuthListener>,
}

impl SessionStore {
    /// Opens the store at `path`, loading an existing session if one is
    /// present. A corrupt session file is discarded rather than surfaced.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok());

        Self {
            path,
            current,
            listeners: Vec::new(),
        }
    }

    /// Default session location: `$TASKDECK_SESSION`, falling back to
    /// `$HOME/.taskdeck/session.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("TASKDECK_SESSION") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join(".taskdeck").join("session.json")
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.current.as_ref().map(|s| &s.profile)
    }

    /// True when a token is present and its expiry claim is still in the
    /// future. The payload is decoded without signature verification; the
    /// server remains the authority and will reject a forged token anyway.
    pub fn is_authenticated(&self) -> bool {
        let token = match self.token() {
            Some(token) => token,
            None => return false,
        };

        match token_expiry(token) {
            Some(exp) => exp > chrono::Utc::now().timestamp(),
            None => false,
        }
    }

    /// Stores a new session, replacing any previous one.
    pub fn save(&mut self, token: String, profile: Profile) -> Result<(), ClientError> {
        let was = self.is_authenticated();

        let session = StoredSession { token, profile };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Session(format!("cannot create {:?}: {}", parent, e)))?;
        }
        let raw = serde_json::to_string_pretty(&session)
            .map_err(|e| ClientError::Session(e.to_string()))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| ClientError::Session(format!("cannot write {:?}: {}", self.path, e)))?;
        self.current = Some(session);

        self.notify_if_changed(was);
        Ok(())
    }

    /// Clears all local session state, wholesale.
    pub fn clear(&mut self) {
        let was = self.is_authenticated();

        self.current = None;
        let _ = std::fs::remove_file(&self.path);

        self.notify_if_changed(was);
    }

    /// Registers a callback invoked with the new authenticated state
    /// whenever the session transitions.
    pub fn on_change(&mut self, listener: impl Fn(bool) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify_if_changed(&self, was: bool) {
        let now = self.is_authenticated();
        if was != now {
            for listener in &self.listeners {
                listener(now);
            }
        }
    }
}

/// Reads the `exp` claim from a JWT payload without verifying the signature.
fn token_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims.get("exp")?.as_i64()
}
