use std::io::Read;
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info};

use super::types::{
    ActivitiesPayload, Activity, AuthResponse, Created, CurrentUser, ExportFile,
    MilestoneInsights, NewActivity, Stats,
};
use super::ActivityApi;
use crate::errors::{ChecklistError, Result};

const SESSION_COOKIE: &str = "session";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking client for the activity service. The login session is a cookie
/// captured from `Set-Cookie` and replayed on every request.
pub struct HttpApiClient {
    base_url: String,
    agent: ureq::Agent,
    session: Mutex<Option<String>>,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        // Redirects stay visible: the server answers unauthenticated calls
        // with a redirect to its login page.
        let agent = ureq::AgentBuilder::new()
            .redirects(0)
            .timeout_connect(CONNECT_TIMEOUT)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
            session: Mutex::new(None),
        }
    }

    pub fn with_session(self, cookie: Option<String>) -> Self {
        self.set_session(cookie);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_cookie(&self) -> Option<String> {
        self.session.lock().ok().and_then(|guard| guard.clone())
    }

    fn set_session(&self, cookie: Option<String>) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = cookie;
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let body = json!({ "username": username, "password": password });
        self.authenticate("/login", body)
    }

    pub fn register(&self, username: &str, password: &str, email: &str) -> Result<AuthResponse> {
        let body = json!({ "username": username, "password": password, "email": email });
        self.authenticate("/register", body)
    }

    /// Ends the server session. The local cookie is dropped even when the
    /// server cannot be reached.
    pub fn logout(&self) -> Result<()> {
        let result = self.request("GET", "/logout").call();
        self.set_session(None);
        match result {
            Ok(_) | Err(ureq::Error::Status(..)) => {
                info!("logged out");
                Ok(())
            }
            Err(err) => Err(self.failure("/logout", err)),
        }
    }

    fn authenticate(&self, path: &str, body: serde_json::Value) -> Result<AuthResponse> {
        let response = self
            .request("POST", path)
            .send_json(body)
            .map_err(|err| self.failure(path, err))?;
        let status = response.status();
        let cookie = session_from_headers(&response.all("set-cookie"));
        let auth: AuthResponse = read_json(response, path)?;
        if !auth.success {
            return Err(ChecklistError::Api {
                status,
                message: auth.message.unwrap_or_else(|| "authentication failed".into()),
            });
        }
        if cookie.is_some() {
            self.set_session(cookie);
        }
        info!(path, username = ?auth.username, "authenticated");
        Ok(auth)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        debug!(method, path, "api request");
        let mut request = self
            .agent
            .request(method, &self.url(path))
            .set("Accept", "application/json");
        if let Some(cookie) = self.session_cookie() {
            request = request.set("Cookie", &format!("{SESSION_COOKIE}={cookie}"));
        }
        request
    }

    fn failure(&self, path: &str, err: ureq::Error) -> ChecklistError {
        let err = match err {
            ureq::Error::Status(status, response) => ChecklistError::Api {
                status,
                message: error_message(response),
            },
            ureq::Error::Transport(transport) => {
                ChecklistError::Network(format!("{}: {}", self.url(path), transport))
            }
        };
        error!(path, error = %err, "api call failed");
        err
    }

    /// Runs the request and rejects the login redirect the server sends when
    /// the session is missing or expired.
    fn send(&self, request: ureq::Request, path: &str) -> Result<ureq::Response> {
        let response = request.call().map_err(|err| self.failure(path, err))?;
        check_redirect(response, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request("GET", path), path)?;
        read_json(response, path)
    }
}

impl ActivityApi for HttpApiClient {
    fn current_user(&self) -> Result<CurrentUser> {
        self.get_json("/api/current-user")
    }

    fn stats(&self) -> Result<Stats> {
        self.get_json("/api/stats")
    }

    fn activities(&self) -> Result<Vec<Activity>> {
        let payload: ActivitiesPayload = self.get_json("/api/activities")?;
        Ok(payload.into_vec())
    }

    fn create_activity(&self, activity: &NewActivity) -> Result<Option<i64>> {
        let path = "/api/activities";
        let response = self
            .request("POST", path)
            .send_json(activity)
            .map_err(|err| self.failure(path, err))?;
        let response = check_redirect(response, path)?;
        let created: Created = read_json(response, path)?;
        info!(date = %activity.date, id = ?created.id, "activity created");
        Ok(created.id)
    }

    fn delete_activity(&self, id: i64) -> Result<()> {
        let path = format!("/api/activities/{id}");
        self.send(self.request("DELETE", &path), &path)?;
        info!(id, "activity deleted");
        Ok(())
    }

    fn milestone(&self, days: u32) -> Result<MilestoneInsights> {
        self.get_json(&format!("/api/milestones/{days}"))
    }

    fn export_excel(&self) -> Result<ExportFile> {
        let path = "/api/export/excel";
        let response = self.send(self.request("GET", path), path)?;
        let filename = response
            .header("content-disposition")
            .and_then(filename_from_disposition);
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|err| ChecklistError::Network(format!("{path}: {err}")))?;
        info!(bytes = bytes.len(), "export downloaded");
        Ok(ExportFile { filename, bytes })
    }
}

fn check_redirect(response: ureq::Response, path: &str) -> Result<ureq::Response> {
    let status = response.status();
    if (300..400).contains(&status) {
        error!(path, status, "session rejected");
        return Err(ChecklistError::Api {
            status,
            message: "not logged in".into(),
        });
    }
    Ok(response)
}

fn read_json<T: DeserializeOwned>(response: ureq::Response, path: &str) -> Result<T> {
    let status = response.status();
    response.into_json().map_err(|err| {
        error!(path, error = %err, "unreadable api response");
        ChecklistError::Api {
            status,
            message: format!("invalid response body: {err}"),
        }
    })
}

/// `error` or `message` from a JSON error body, else the raw text.
fn error_message(response: ureq::Response) -> String {
    let text = response.into_string().unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| text.trim().to_string())
}

fn session_from_headers(headers: &[&str]) -> Option<String> {
    headers.iter().find_map(|header| {
        let pair = header.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

fn filename_from_disposition(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let value = part.trim().strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}
