use crate::domain::model::Timetable;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://mmumobileapps.mmu.edu.my/api";
pub const DEFAULT_CLIENT_ID: &str = "asd";

/// Student-key body the service sends instead of a key when rate limiting.
const RATE_LIMITED_BODY: &str = "03";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Client for the MMU mobile API timetable flow.
///
/// The session token only ever lives inside a single [`TimetableFetcher::fetch`]
/// call, so one fetcher (and its connection pool) can serve concurrent fetches
/// for different students.
#[derive(Debug, Clone)]
pub struct TimetableFetcher {
    client: Client,
    base_url: Url,
    client_id: String,
}

impl TimetableFetcher {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    /// Reuses an existing client, sharing its connection pool.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(EtlError::ConfigError {
                message: format!("API base URL cannot be a base: {}", base_url),
            });
        }

        Ok(Self {
            client,
            base_url,
            client_id: DEFAULT_CLIENT_ID.to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::with_client(client, config.api_base_url())?.with_client_id(config.client_id()))
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Logs in, looks up the student key and downloads the timetable.
    ///
    /// Returns an empty timetable when any step is refused (bad credentials and
    /// service trouble look the same), and [`EtlError::RateLimitedError`] when the
    /// service asks us to back off. Transport failures propagate as
    /// [`EtlError::ApiError`].
    pub async fn fetch(&self, student_id: &str, password: &str) -> Result<Timetable> {
        let token = match self.login(student_id, password).await? {
            Some(token) => token,
            None => return Ok(Timetable::empty()),
        };

        let result = self.fetch_with_token(&token).await;
        self.logout(&token).await;
        result
    }

    async fn fetch_with_token(&self, token: &str) -> Result<Timetable> {
        match self.student_key(token).await? {
            Some(student_key) => self.timetable(&student_key, token).await,
            None => Ok(Timetable::empty()),
        }
    }

    async fn login(&self, student_id: &str, password: &str) -> Result<Option<String>> {
        let url = self.endpoint(&["auth", "login2"])?;
        tracing::debug!("Logging in at {}", url);

        let form = [
            ("username", student_id),
            ("password", password),
            ("id", self.client_id.as_str()),
        ];
        let response = self.client.post(url).form(&form).send().await?;
        tracing::debug!("Login response status: {}", response.status());

        if !response.status().is_success() {
            return Ok(None);
        }

        let body = response.text().await?;
        match serde_json::from_str::<LoginResponse>(&body) {
            Ok(login) => Ok(Some(login.token)),
            Err(e) => {
                tracing::debug!("Login response has no usable token: {}", e);
                Ok(None)
            }
        }
    }

    async fn student_key(&self, token: &str) -> Result<Option<String>> {
        let url = self.endpoint(&["camsys", "student_key"])?;
        tracing::debug!("Requesting student key from {}", url);

        let response = self
            .client
            .get(url)
            .query(&[("token", token)])
            .send()
            .await?;
        tracing::debug!("Student key response status: {}", response.status());

        if !response.status().is_success() {
            return Ok(None);
        }

        let body = response.text().await?;
        let student_key = body.trim();
        if student_key == RATE_LIMITED_BODY {
            return Err(EtlError::RateLimitedError {
                message: "Unable to obtain student key due to rate limit".to_string(),
            });
        }
        if student_key.is_empty() {
            return Ok(None);
        }

        Ok(Some(student_key.to_string()))
    }

    async fn timetable(&self, student_key: &str, token: &str) -> Result<Timetable> {
        let url = self.endpoint(&["camsys", "timetable", student_key])?;
        tracing::debug!("Requesting timetable from {}", url.path());

        let response = self
            .client
            .get(url)
            .query(&[("token", token)])
            .send()
            .await?;
        tracing::debug!("Timetable response status: {}", response.status());

        if !response.status().is_success() {
            return Ok(Timetable::empty());
        }

        let body: serde_json::Value = serde_json::from_str(&response.text().await?)?;
        if body.is_object() {
            // An object instead of a list of days means the student key was rejected
            tracing::debug!("Timetable endpoint returned an object: {}", body);
            return Ok(Timetable::empty());
        }

        let timetable: Timetable = serde_json::from_value(body)?;
        tracing::debug!(
            "Fetched {} class sessions in {} day groups",
            timetable.session_count(),
            timetable.days.len()
        );
        Ok(timetable)
    }

    /// Best effort; never fails the fetch.
    async fn logout(&self, token: &str) {
        let url = match self.endpoint(&["logout"]) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping logout: {}", e);
                return;
            }
        };

        match self
            .client
            .post(url)
            .query(&[("token", token)])
            .send()
            .await
        {
            Ok(response) => tracing::debug!("Logout response status: {}", response.status()),
            Err(e) => tracing::warn!("Logout failed: {}", e),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EtlError::ConfigError {
                message: format!("API base URL cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn timetable_body() -> serde_json::Value {
        serde_json::json!([
            [
                {
                    "day": "Monday", "start": "14:00", "end": "17:00",
                    "subject_name": "SUBJECT NAME", "subject_code": "EEE1234",
                    "type": "LEC", "venue": "FOEVC0123", "section": "EC01", "strm": "2110"
                }
            ],
            [
                {
                    "day": "Thursday", "start": "09:00", "end": "10:00",
                    "subject_name": "OTHER", "subject_code": "EEE5678",
                    "type": "TUT", "venue": "FOEVC0456", "section": "TT02", "strm": "2110"
                }
            ]
        ])
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let fetcher = TimetableFetcher::new("https://example.com/api").unwrap();
        let url = fetcher.endpoint(&["camsys", "timetable", "KEY 1"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/camsys/timetable/KEY%201");

        let fetcher = TimetableFetcher::new("https://example.com/api/").unwrap();
        let url = fetcher.endpoint(&["logout"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/logout");
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(matches!(
            TimetableFetcher::new("mailto:someone@example.com"),
            Err(EtlError::ConfigError { .. })
        ));
        assert!(matches!(
            TimetableFetcher::new("not a url"),
            Err(EtlError::UrlError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_full_flow() {
        let server = MockServer::start();

        let login_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/login2")
                .x_www_form_urlencoded_tuple("username", "1191100000")
                .x_www_form_urlencoded_tuple("password", "secret")
                .x_www_form_urlencoded_tuple("id", "asd");
            then.status(200).json_body(serde_json::json!({"token": "tok123"}));
        });
        let key_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/camsys/student_key")
                .query_param("token", "tok123");
            then.status(200).body("KEY42");
        });
        let timetable_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/camsys/timetable/KEY42")
                .query_param("token", "tok123");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(timetable_body());
        });
        let logout_mock = server.mock(|when, then| {
            when.method(POST).path("/logout").query_param("token", "tok123");
            then.status(200);
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        let timetable = fetcher.fetch("1191100000", "secret").await.unwrap();

        login_mock.assert();
        key_mock.assert();
        timetable_mock.assert();
        logout_mock.assert();
        assert_eq!(timetable.days.len(), 2);
        assert_eq!(timetable.session_count(), 2);
        assert_eq!(timetable.days[1][0].subject_code, "EEE5678");
    }

    #[tokio::test]
    async fn test_login_failure_returns_empty_timetable() {
        let server = MockServer::start();

        let login_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/login2");
            then.status(401);
        });
        let key_mock = server.mock(|when, then| {
            when.method(GET).path("/camsys/student_key");
            then.status(200).body("KEY42");
        });
        let logout_mock = server.mock(|when, then| {
            when.method(POST).path("/logout");
            then.status(200);
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        let timetable = fetcher.fetch("1191100000", "wrong").await.unwrap();

        login_mock.assert();
        key_mock.assert_hits(0);
        logout_mock.assert_hits(0);
        assert!(timetable.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_returns_empty_timetable() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/auth/login2");
            then.status(200).json_body(serde_json::json!({"message": "ok"}));
        });
        let key_mock = server.mock(|when, then| {
            when.method(GET).path("/camsys/student_key");
            then.status(200).body("KEY42");
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        let timetable = fetcher.fetch("1191100000", "secret").await.unwrap();

        key_mock.assert_hits(0);
        assert!(timetable.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_is_signalled_and_session_closed() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/auth/login2");
            then.status(200).json_body(serde_json::json!({"token": "tok123"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/student_key");
            then.status(200).body("03");
        });
        let timetable_mock = server.mock(|when, then| {
            when.method(GET).path_contains("/camsys/timetable/");
            then.status(200).json_body(timetable_body());
        });
        let logout_mock = server.mock(|when, then| {
            when.method(POST).path("/logout").query_param("token", "tok123");
            then.status(200);
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        let result = fetcher.fetch("1191100000", "secret").await;

        assert!(matches!(result, Err(EtlError::RateLimitedError { .. })));
        timetable_mock.assert_hits(0);
        logout_mock.assert();
    }

    #[tokio::test]
    async fn test_student_key_failure_returns_empty_timetable() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/auth/login2");
            then.status(200).json_body(serde_json::json!({"token": "tok123"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/student_key");
            then.status(403);
        });
        let logout_mock = server.mock(|when, then| {
            when.method(POST).path("/logout");
            then.status(200);
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        let timetable = fetcher.fetch("1191100000", "secret").await.unwrap();

        assert!(timetable.is_empty());
        logout_mock.assert();
    }

    #[tokio::test]
    async fn test_object_timetable_means_invalid_key() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/auth/login2");
            then.status(200).json_body(serde_json::json!({"token": "tok123"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/student_key");
            then.status(200).body("BADKEY");
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/timetable/BADKEY");
            then.status(200)
                .json_body(serde_json::json!({"error": "invalid student key"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/logout");
            then.status(200);
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        let timetable = fetcher.fetch("1191100000", "secret").await.unwrap();

        assert!(timetable.is_empty());
    }

    #[tokio::test]
    async fn test_timetable_server_error_returns_empty() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/auth/login2");
            then.status(200).json_body(serde_json::json!({"token": "tok123"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/student_key");
            then.status(200).body("KEY42");
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/timetable/KEY42");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(POST).path("/logout");
            then.status(200);
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        assert!(fetcher.fetch("1191100000", "secret").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_failure_is_ignored() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/auth/login2");
            then.status(200).json_body(serde_json::json!({"token": "tok123"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/student_key");
            then.status(200).body("KEY42");
        });
        server.mock(|when, then| {
            when.method(GET).path("/camsys/timetable/KEY42");
            then.status(200).json_body(timetable_body());
        });
        let logout_mock = server.mock(|when, then| {
            when.method(POST).path("/logout");
            then.status(500).body("boom");
        });

        let fetcher = TimetableFetcher::new(&server.base_url()).unwrap();
        let timetable = fetcher.fetch("1191100000", "secret").await.unwrap();

        logout_mock.assert();
        assert_eq!(timetable.session_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        // Nothing listens on port 9 of localhost
        let fetcher = TimetableFetcher::new("http://127.0.0.1:9").unwrap();
        let result = fetcher.fetch("1191100000", "secret").await;

        assert!(matches!(result, Err(EtlError::ApiError(_))));
    }
}
