//!
//! # API Client
//!
//! The client half of the system: an HTTP consumer of the taskdeck REST API
//! with a persistent local session, used by the `taskdeck-cli` binary.
//!
//! The contract mirrors the server's expectations:
//! - the bearer token is attached to every request on the protected surface
//!   and never to the registration/login endpoints;
//! - any authorization-denied response from the protected surface clears all
//!   local session state (forced logout) before the error is surfaced;
//! - other failures are surfaced inline and leave the session untouched.

pub mod session;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::models::{Task, TaskInput, TaskUpdate};
pub use session::{Profile, SessionStore};

/// Failures surfaced by the client.
#[derive(Debug)]
pub enum ClientError {
    /// No usable credential, or the server denied the one presented. When
    /// the denial came from the server, the local session has already been
    /// cleared.
    Unauthorized(String),
    /// The API rejected the request; carries the server's error message.
    Api { status: u16, message: String },
    /// Transport-level failure.
    Http(reqwest::Error),
    /// Session file I/O or serialization failure.
    Session(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ClientError::Api { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Session(msg) => write!(f, "Session error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> ClientError {
        ClientError::Http(error)
    }
}

/// Mirror of the server's authentication response body.
#[derive(Debug, serde::Deserialize)]
struct AuthBody {
    id: i64,
    token: String,
    username: String,
    email: String,
}

/// HTTP client for the taskdeck API, bound to a [`SessionStore`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    /// Registers a new account. On success the returned token and profile
    /// replace whatever session was stored before.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Profile, ClientError> {
        let resp = self
            .http
            .post(format!("{}/auth/register", self.base_url))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        self.store_auth(resp).await
    }

    /// Logs in with username and password, replacing any stored session.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Profile, ClientError> {
        let resp = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await?;

        self.store_auth(resp).await
    }

    /// Clears the local session. Tokens are stateless server-side, so this
    /// is the whole of logout.
    pub fn logout(&mut self) {
        self.session.clear();
    }

    pub async fn list_tasks(&mut self) -> Result<Vec<Task>, ClientError> {
        let req = self.http.get(format!("{}/api/tasks", self.base_url));
        self.send_protected(req).await
    }

    pub async fn get_task(&mut self, id: i64) -> Result<Task, ClientError> {
        let req = self.http.get(format!("{}/api/tasks/{}", self.base_url, id));
        self.send_protected(req).await
    }

    pub async fn create_task(&mut self, input: &TaskInput) -> Result<Task, ClientError> {
        let req = self
            .http
            .post(format!("{}/api/tasks", self.base_url))
            .json(input);
        self.send_protected(req).await
    }

    pub async fn update_task(&mut self, id: i64, update: &TaskUpdate) -> Result<Task, ClientError> {
        let req = self
            .http
            .put(format!("{}/api/tasks/{}", self.base_url, id))
            .json(update);
        self.send_protected(req).await
    }

    pub async fn delete_task(&mut self, id: i64) -> Result<(), ClientError> {
        let token = self.require_token()?;
        let resp = self
            .http
            .delete(format!("{}/api/tasks/{}", self.base_url, id))
            .bearer_auth(token)
            .send()
            .await?;

        let resp = self.check_authorized(resp)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(api_error(resp).await)
        }
    }

    /// Sends a request on the protected surface with the stored bearer token
    /// attached, then decodes the JSON body.
    async fn send_protected<T: DeserializeOwned>(
        &mut self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let token = self.require_token()?;
        let resp = req.bearer_auth(token).send().await?;

        let resp = self.check_authorized(resp)?;
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(api_error(resp).await)
        }
    }

    fn require_token(&self) -> Result<String, ClientError> {
        self.session
            .token()
            .map(str::to_owned)
            .ok_or_else(|| ClientError::Unauthorized("Not logged in".into()))
    }

    /// Forced-logout path: an authorization-denied response from the
    /// protected surface clears all local session state.
    fn check_authorized(&mut self, resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            self.session.clear();
            return Err(ClientError::Unauthorized(
                "Session rejected by server; please log in again".into(),
            ));
        }
        Ok(resp)
    }

    async fn store_auth(&mut self, resp: reqwest::Response) -> Result<Profile, ClientError> {
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let body: AuthBody = resp.json().await?;
        let profile = Profile {
            id: body.id,
            username: body.username,
            email: body.email,
        };
        self.session.save(body.token, profile.clone())?;
        Ok(profile)
    }
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let message = match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string(),
        Err(_) => "Unknown error".to_string(),
    };
    ClientError::Api { status, message }
}
