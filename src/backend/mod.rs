//! Client of the popup's backend: login and weekly reports.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::{
    error::PopupError,
    ledger::entities::{Credentials, LoginResponse, WeeklyReport},
};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// A rejected login is a successful call, so it comes back as [LoginResponse::Rejected].
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, PopupError>;

    async fn fetch_reports(&self, token: String) -> Result<Vec<WeeklyReport>, PopupError>;
}

pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PopupError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn login(&self, credentials: Credentials) -> Result<LoginResponse, PopupError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&credentials)
            .send()
            .await?;
        debug!("Login answered with {}", response.status());
        // Rejections carry their reason in the body whatever the status is.
        Ok(response.json::<LoginResponse>().await?)
    }

    #[instrument(skip_all)]
    async fn fetch_reports(&self, token: String) -> Result<Vec<WeeklyReport>, PopupError> {
        let response = self
            .client
            .get(self.url("/api/reports"))
            .bearer_auth(token)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Reports request was not authorized");
                Err(PopupError::AuthFailure("session expired".into()))
            }
            StatusCode::NOT_FOUND => Err(PopupError::NotFound("reports".into())),
            status => Err(PopupError::NetworkFailure(format!(
                "reports request returned {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use axum::{
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use crate::{
        error::PopupError,
        ledger::entities::{Credentials, LoginResponse},
    };

    use super::{Backend, HttpBackend};

    async fn login(Json(body): Json<Value>) -> impl IntoResponse {
        if body["password"] == "secret" {
            (
                StatusCode::OK,
                Json(json!({"token": "t-1", "user": {"email": body["email"]}})),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid credentials"})),
            )
        }
    }

    async fn reports(headers: HeaderMap) -> impl IntoResponse {
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some("Bearer t-1") => (
                StatusCode::OK,
                Json(json!([
                    {"weekStart": "2026-10-05", "totalTime": 7_260_000, "topSite": "docs.rs"}
                ])),
            ),
            _ => (StatusCode::UNAUTHORIZED, Json(json!({"message": "nope"}))),
        }
    }

    async fn serve() -> Result<String> {
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/reports", get(reports));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(format!("http://{address}/"))
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            email: "me@example.com".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_login_accepted_and_rejected() -> Result<()> {
        let backend = HttpBackend::new(serve().await?)?;

        let LoginResponse::Accepted { token, user } = backend.login(credentials("secret")).await?
        else {
            panic!("Expected login to be accepted");
        };
        assert_eq!(token, "t-1");
        assert_eq!(user.email.as_deref(), Some("me@example.com"));

        let rejected = backend.login(credentials("wrong")).await?;
        assert_eq!(
            rejected,
            LoginResponse::Rejected {
                message: Some("Invalid credentials".into())
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reports_use_bearer_token() -> Result<()> {
        let backend = HttpBackend::new(serve().await?)?;

        let reports = backend.fetch_reports("t-1".into()).await?;
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].week_start,
            NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()
        );
        assert_eq!(reports[0].total_time, 7_260_000);

        let unauthorized = backend.fetch_reports("stale".into()).await;
        assert!(matches!(unauthorized, Err(PopupError::AuthFailure(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_failure() -> Result<()> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let address = listener.local_addr()?;
        drop(listener);

        let backend = HttpBackend::new(format!("http://{address}"))?;
        let result = backend.fetch_reports("t-1".into()).await;
        assert!(matches!(result, Err(PopupError::NetworkFailure(_))));
        Ok(())
    }
}
