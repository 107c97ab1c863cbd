//! HTTP transport for the remote API, with response classification.

use crate::Result;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use reqwest::header::HeaderMap;
use serde_json::Value;

const LOG_TARGET: &str = "    client";

/// Delay before retrying after a dropped connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Classified outcome of a transport-level API call.
#[derive(Debug)]
pub enum ApiResponse {
    /// 2xx with a decoded JSON body.
    Payload(Value),

    /// 429: the shared rate-limit budget is exhausted.
    RateLimited,

    /// 401: the resource is access-restricted (protected account).
    Restricted,

    /// 404: the target vanished mid-run.
    Gone,
}

/// Minimal API client carrying auth and the base URL.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new API client with an optional bearer token and base URL.
    pub fn new(token: Option<&str>, base_url: impl Into<String>) -> Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut builder = reqwest::Client::builder().user_agent("gyre");

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);

            let mut headers = HeaderMap::new();
            let _ = headers.insert(AUTHORIZATION, auth_val);

            builder = builder.default_headers(headers);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into(),
        })
    }

    /// Get the base URL for this client.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `<base>/<path>.json` with the given query parameters and classify the response.
    ///
    /// Dropped connections are retried after a short delay; they are a fact of
    /// life on long crawls and must not end the run. Everything else that is
    /// not a recognized status is a hard error.
    pub async fn get(&self, path: &str, params: &[(String, String)]) -> Result<ApiResponse> {
        let url = format!("{}/{path}.json", self.base_url);

        let resp = loop {
            match self.http.get(&url).query(params).send().await {
                Ok(resp) => break resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    log::warn!(
                        target: LOG_TARGET,
                        "connection lost for '{path}', retrying in {}s: {e}",
                        RECONNECT_DELAY.as_secs()
                    );
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let status = resp.status();
        if status.is_success() {
            let payload: Value = resp
                .json()
                .await
                .into_app_err_with(|| format!("decoding response from '{path}'"))?;
            return Ok(ApiResponse::Payload(payload));
        }

        match status.as_u16() {
            429 => Ok(ApiResponse::RateLimited),
            401 => Ok(ApiResponse::Restricted),
            404 => Ok(ApiResponse::Gone),
            code => Err(app_err!("request to '{path}' failed with status {code} (params: {params:?})")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_without_token() {
        let client = Client::new(None, "https://api.example.com/1.1").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/1.1");
    }

    #[test]
    fn client_with_token() {
        let client = Client::new(Some("secret"), "https://api.example.com/1.1").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/1.1");
    }
}
