//! API client for the loyalty service.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the bearer
//! token from the shared [`SessionStore`] and evicts the session when the
//! server answers 401.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::auth::SessionStore;
use crate::models::{
    ApiResponse, BalanceResponse, EarnPointsRequest, HistoryResponse, LoginCredentials,
    LoginResponse, RedeemPointsRequest,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds. A request that gets no response within
/// this budget fails as a network error.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

const LOGIN_PATH: &str = "/auth/login";
const EARN_PATH: &str = "/loyalty/earn";
const REDEEM_PATH: &str = "/redeem";
const BALANCE_PATH: &str = "loyalty/balance";
const HISTORY_PATH: &str = "loyalty/history";

/// API client for the loyalty service.
/// Clone is cheap - reqwest::Client and the session are both behind Arc.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client for `base_url` that reads credentials from `session`
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self> {
        Self::with_timeout(base_url, session, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Like [`new`](Self::new), with a custom per-request timeout
    pub fn with_timeout(
        base_url: &str,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Join a path onto the base URL with exactly one `/` between them,
    /// whether or not either side carries one.
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send a request, attaching the session token if there is one, and
    /// return the URL and body of a successful response.
    ///
    /// A 401 evicts the session (see [`SessionStore::expire`]) whatever the
    /// endpoint; other error statuses come back as [`ApiError::Server`].
    async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(String, String)>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        let credentials = self.session.request_credentials();

        let mut request = self.client.request(method.clone(), &url);
        if let Some(ref token) = credentials.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, url = %url, authenticated = credentials.token.is_some(), "Sending request");

        let response = request.send().await.map_err(ApiError::NetworkError)?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.session.expire(credentials.epoch);
            return Err(ApiError::Unauthorized.into());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let text = response.text().await.map_err(ApiError::NetworkError)?;
        Ok((url, text))
    }

    /// Send a request whose response body must decode as `T`.
    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (url, text) = self.execute(method, path, body).await?;
        let value = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))?;
        Ok(value)
    }

    /// POST to an endpoint whose outcome is decided by the status alone.
    ///
    /// A 2xx response with an empty or non-JSON body still counts as success.
    async fn send_command<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let (url, text) = self.execute(Method::POST, path, Some(body)).await?;
        if text.trim().is_empty() {
            return Ok(ApiResponse::accepted());
        }
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(url = %url, error = %e, "Ignoring undecodable body of successful response");
            ApiResponse::accepted()
        }))
    }

    // ===== Operations =====

    /// Authenticate with email and password.
    ///
    /// Does not touch the session; the caller passes the returned identity
    /// and token to [`SessionStore::login`].
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse> {
        self.send(Method::POST, LOGIN_PATH, Some(credentials))
            .await
            .inspect_err(|e| error!(error = %e, email = %credentials.email, "Login API error"))
    }

    pub async fn earn_points(&self, request: &EarnPointsRequest) -> Result<ApiResponse> {
        self.send_command(EARN_PATH, request)
            .await
            .inspect_err(|e| error!(error = %e, points = request.points, "Earn points API error"))
    }

    pub async fn redeem_points(&self, request: &RedeemPointsRequest) -> Result<ApiResponse> {
        self.send_command(REDEEM_PATH, request)
            .await
            .inspect_err(|e| error!(error = %e, points = request.points, "Redeem points API error"))
    }

    pub async fn get_balance(&self) -> Result<BalanceResponse> {
        self.send::<_, ()>(Method::GET, BALANCE_PATH, None)
            .await
            .inspect_err(|e| error!(error = %e, "Get balance API error"))
    }

    /// Fetch the full transaction list. Filtering happens client-side.
    pub async fn get_history(&self) -> Result<HistoryResponse> {
        self.send::<_, ()>(Method::GET, HISTORY_PATH, None)
            .await
            .inspect_err(|e| error!(error = %e, "Get history API error"))
    }
}
