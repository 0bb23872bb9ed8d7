//! REST boundary: URL assembly, bearer auth, timeouts, JSON decoding and the
//! single translation from transport failures to [`ApiError`].

use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::http_client::{
    HttpAuth, HttpClient, HttpErrorKind, HttpMethod, HttpRequest, ReqwestHttpClient,
};
use crate::query::QueryParameterSet;

/// Failure at the transport boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401. Stored credentials have already been cleared.
    #[error("unauthorized; sign in again at '{login_route}'")]
    Unauthorized { login_route: String },

    /// HTTP 422 with the server's validation details.
    #[error("request rejected by server validation: {}", .details.join(", "))]
    Unprocessable { details: Vec<String> },

    #[error("server returned status {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {message}")]
    Network { message: String },

    #[error("failed to encode request body: {message}")]
    Encode { message: String },

    #[error("failed to decode response from '{path}': {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => String::from("session expired, please sign in again"),
            Self::Unprocessable { details } if details.is_empty() => {
                String::from("invalid request parameters, please check your input")
            }
            Self::Unprocessable { details } => details.join(", "),
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Status { detail: None, .. } | Self::Encode { .. } | Self::Decode { .. } => {
                String::from("request failed")
            }
            Self::Timeout => String::from("request timed out, please try again later"),
            Self::Network { .. } => String::from("network error, please check your connection"),
        }
    }

    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Unprocessable { .. } => Some(422),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Bearer token shared by every clone of an [`ApiClient`].
#[derive(Debug, Default)]
pub struct CredentialStore {
    token: RwLock<Option<String>>,
}

impl CredentialStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn auth(&self) -> HttpAuth {
        self.token().map_or(HttpAuth::None, HttpAuth::BearerToken)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
    login_route: String,
    credentials: Arc<CredentialStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            timeout_ms: config.timeout_ms(),
            login_route: config.login_route.clone(),
            credentials: Arc::new(CredentialStore::new(config.api_token.clone())),
        }
    }

    /// Client backed by reqwest.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str, params: &QueryParameterSet) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.to_query_string());
        }
        url
    }

    pub async fn get<T>(&self, path: &str, params: &QueryParameterSet) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = HttpRequest::get(self.url(path, params));
        let body = self.send(request).await?;
        decode(path, &body)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(HttpMethod::Post, path, body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(HttpMethod::Put, path, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(HttpMethod::Patch, path, body).await
    }

    /// Response bodies of deletions are ignored.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = HttpRequest::new(HttpMethod::Delete, self.url(path, &QueryParameterSet::new()));
        self.send(request).await.map(|_| ())
    }

    async fn send_json<B, T>(&self, method: HttpMethod, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_string(body).map_err(|error| ApiError::Encode {
            message: error.to_string(),
        })?;
        let request = HttpRequest::new(method, self.url(path, &QueryParameterSet::new()))
            .with_json_body(payload);
        let body = self.send(request).await?;
        decode(path, &body)
    }

    async fn send(&self, request: HttpRequest) -> Result<String, ApiError> {
        let request = request
            .with_auth(&self.credentials.auth())
            .with_timeout_ms(self.timeout_ms);
        let method = request.method;
        let url = request.url.clone();
        debug!(%method, %url, "dispatching request");

        let response = self.http.execute(request).await.map_err(|error| {
            warn!(%method, %url, error = %error, "transport failure");
            match error.kind() {
                HttpErrorKind::Timeout => ApiError::Timeout,
                HttpErrorKind::Connect | HttpErrorKind::Other => ApiError::Network {
                    message: error.message().to_owned(),
                },
            }
        })?;

        if response.is_success() {
            return Ok(response.body);
        }

        warn!(%method, %url, status = response.status, "request failed");
        Err(match response.status {
            401 => {
                self.credentials.clear();
                ApiError::Unauthorized {
                    login_route: self.login_route.clone(),
                }
            }
            422 => ApiError::Unprocessable {
                details: validation_details(&response.body),
            },
            status => ApiError::Status {
                status,
                detail: detail_text(&response.body),
            },
        })
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|error| ApiError::Decode {
        path: path.to_owned(),
        message: error.to_string(),
    })
}

fn detail_value(body: &str) -> Option<serde_json::Value> {
    let mut value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get_mut("detail").map(serde_json::Value::take)
}

/// `detail` as a list of `{msg}` objects or strings, or a single string.
fn validation_details(body: &str) -> Vec<String> {
    use serde_json::Value;

    match detail_value(body) {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .map(|entry| match entry {
                Value::String(text) => text,
                Value::Object(ref fields) => match fields.get("msg") {
                    Some(Value::String(msg)) => msg.clone(),
                    _ => entry.to_string(),
                },
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(text)) => vec![text],
        _ => Vec::new(),
    }
}

fn detail_text(body: &str) -> Option<String> {
    match detail_value(body)? {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use serde::Deserialize;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::query::ParamValue;

    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn responding(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: i64,
    }

    fn client_with(http: Arc<RecordingHttpClient>, token: Option<&str>) -> ApiClient {
        let mut config = ClientConfig::default().with_base_url("https://board.example/api/v1/");
        config.api_token = token.map(str::to_owned);
        ApiClient::new(&config, http)
    }

    #[tokio::test]
    async fn get_builds_url_and_applies_token() {
        let http = RecordingHttpClient::responding(Ok(HttpResponse::ok_json(r#"[{"id": 1}]"#)));
        let client = client_with(http.clone(), Some("token-123"));
        let params: QueryParameterSet = [("date", ParamValue::from("2024-05-10"))]
            .into_iter()
            .collect();

        let rows: Vec<Row> = client.get("/lhb/", &params).await.expect("decodes");

        assert_eq!(rows, vec![Row { id: 1 }]);
        let request = &http.recorded_requests()[0];
        assert_eq!(request.url, "https://board.example/api/v1/lhb/?date=2024-05-10");
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer token-123")
        );
        assert_eq!(request.timeout_ms, 60_000);
    }

    #[tokio::test]
    async fn unauthorized_clears_credentials() {
        let http = RecordingHttpClient::responding(Ok(HttpResponse::new(401, "{}")));
        let client = client_with(http, Some("stale"));

        let error = client
            .get::<Vec<Row>>("/lhb/", &QueryParameterSet::new())
            .await
            .expect_err("must fail");

        assert_eq!(
            error,
            ApiError::Unauthorized {
                login_route: String::from("/login")
            }
        );
        assert_eq!(client.credentials().token(), None);
    }

    #[tokio::test]
    async fn unprocessable_surfaces_detail_messages() {
        let body = r#"{"detail": [{"loc": ["query", "date"], "msg": "field required"}, "bad range"]}"#;
        let http = RecordingHttpClient::responding(Ok(HttpResponse::new(422, body)));
        let client = client_with(http, None);

        let error = client
            .get::<Vec<Row>>("/zt-pool/", &QueryParameterSet::new())
            .await
            .expect_err("must fail");

        assert_eq!(error.user_message(), "field required, bad range");
    }

    #[tokio::test]
    async fn timeouts_get_a_distinct_message() {
        let http = RecordingHttpClient::responding(Err(HttpError::timeout("deadline elapsed")));
        let client = client_with(http, None);

        let error = client
            .get::<Vec<Row>>("/index/", &QueryParameterSet::new())
            .await
            .expect_err("must fail");

        assert_eq!(error, ApiError::Timeout);
        assert_eq!(error.user_message(), "request timed out, please try again later");
    }

    #[tokio::test]
    async fn other_statuses_use_server_detail_or_fallback() {
        let http = RecordingHttpClient::responding(Ok(HttpResponse::new(
            500,
            r#"{"detail": "database unavailable"}"#,
        )));
        let error = client_with(http, None)
            .get::<Vec<Row>>("/sector/", &QueryParameterSet::new())
            .await
            .expect_err("must fail");
        assert_eq!(error.user_message(), "database unavailable");

        let http = RecordingHttpClient::responding(Ok(HttpResponse::new(502, "bad gateway")));
        let error = client_with(http, None)
            .get::<Vec<Row>>("/sector/", &QueryParameterSet::new())
            .await
            .expect_err("must fail");
        assert_eq!(error.user_message(), "request failed");
        assert_eq!(error.status(), Some(502));
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let http = RecordingHttpClient::responding(Ok(HttpResponse::ok_json(r#"{"id": 4}"#)));
        let client = client_with(http.clone(), None);

        let row: Row = client
            .post("/trading-calendar", &serde_json::json!({"stock_name": "平安银行"}))
            .await
            .expect("decodes");

        assert_eq!(row, Row { id: 4 });
        let request = &http.recorded_requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body.as_deref(), Some(r#"{"stock_name":"平安银行"}"#));
        assert!(!request.headers.contains_key("authorization"));
    }
}
