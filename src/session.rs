use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to make login request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Login rejected: {status:?}, {body:?}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Invalid login response: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, AuthError>;

/// Authenticated handle on the certificate service.
#[derive(Debug, Clone)]
pub struct Session {
    pub base_url: String,
    pub token: String,
    pub client: Client,
}

impl Session {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Session {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

pub trait Login {
    fn login(
        &self,
        username: &str,
        password: Option<&str>,
        team_id: Option<&str>,
    ) -> Result<Session>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug)]
pub struct HttpLogin {
    client: Client,
    base_url: String,
}

impl HttpLogin {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpLogin {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Login for HttpLogin {
    fn login(
        &self,
        username: &str,
        password: Option<&str>,
        team_id: Option<&str>,
    ) -> Result<Session> {
        info!("Starting login with user '{}'", username);

        let req = LoginRequest {
            username,
            password,
            team_id,
        };

        let response = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&req)
            .send()?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected {
                status: response.status(),
                body: response.text()?,
            });
        }

        let body = response.bytes()?;
        let resp: LoginResponse = serde_json::from_slice(&body)?;
        debug!(team_id = ?team_id, "Session token acquired");
        info!("Successfully logged in");

        Ok(Session {
            base_url: self.base_url.clone(),
            token: resp.token,
            client: self.client.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MockLogin {
    base_url: String,
    token: String,
}

impl MockLogin {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

impl Login for MockLogin {
    fn login(
        &self,
        _username: &str,
        _password: Option<&str>,
        _team_id: Option<&str>,
    ) -> Result<Session> {
        Ok(Session::new(self.base_url.clone(), self.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_mock_login() {
        let session = MockLogin::new("http://localhost/", "token-123")
            .login("user", None, None)
            .unwrap();

        assert_eq!(session.token, "token-123");
        assert_eq!(session.endpoint("/certificates"), "http://localhost/certificates");
    }

    #[test]
    fn login_posts_credentials_and_returns_token() {
        let mut server = Server::new();

        let mock = server
            .mock("POST", "/session")
            .match_body(Matcher::Json(serde_json::json!({
                "username": "ci@example.com",
                "teamId": "TEAM42"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"abc"}"#)
            .create();

        let session = HttpLogin::new(server.url())
            .login("ci@example.com", None, Some("TEAM42"))
            .unwrap();

        mock.assert();
        assert_eq!(session.token, "abc");
        assert_eq!(session.base_url, server.url());
    }

    #[test]
    fn login_rejected_on_error_status() {
        let mut server = Server::new();

        let mock = server
            .mock("POST", "/session")
            .with_status(401)
            .with_body("bad credentials")
            .create();

        let result = HttpLogin::new(server.url()).login("ci@example.com", Some("nope"), None);

        mock.assert();
        match result {
            Err(AuthError::Rejected { status, body }) => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                assert_eq!(body, "bad credentials");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn login_with_invalid_json() {
        let mut server = Server::new();

        let mock = server
            .mock("POST", "/session")
            .with_status(200)
            .with_body("invalid json")
            .create();

        let result = HttpLogin::new(server.url()).login("ci@example.com", None, None);

        mock.assert();
        assert!(matches!(result, Err(AuthError::Json(_))));
    }
}
