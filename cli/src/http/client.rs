//! HTTP client implementation

use std::time::Duration;

use controller_api::ErrorResponse;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::CliError;

/// HTTP client for controller communication
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CliError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| CliError::ConfigError(format!("Invalid target '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CliError::ConfigError(format!(
                "Invalid target '{}': unsupported scheme {}",
                base_url,
                parsed.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: parsed,
            token: None,
        })
    }

    /// Attach the bearer token sent with every request
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append `segments` to the base URL, percent-encoding each one
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, CliError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CliError::ConfigError(format!("Invalid target '{}'", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and turn non-success statuses into errors
    pub(crate) async fn send(&self, method: &str, request: RequestBuilder) -> Result<Response, CliError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        if status == StatusCode::NOT_FOUND {
            debug!("HTTP {} returned 404: {}", method, message);
            return Err(CliError::NotFound(message));
        }

        error!("HTTP {} failed: {} - {}", method, status, message);
        Err(CliError::Transport(format!("{}: {}", status, message)))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, CliError> {
        let url = self.url(segments)?;
        debug!("GET {}", url);

        let response = self.send("GET", self.client.get(url)).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a GET request returning the raw body
    pub async fn get_bytes(&self, segments: &[&str]) -> Result<Vec<u8>, CliError> {
        let url = self.url(segments)?;
        debug!("GET {}", url);

        let response = self.send("GET", self.client.get(url)).await?;
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, CliError> {
        let url = self.url(segments)?;
        debug!("POST {}", url);

        let response = self.send("POST", self.client.post(url).json(body)).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request, discarding the response body
    pub async fn post_discard<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), CliError> {
        let url = self.url(segments)?;
        debug!("POST {}", url);

        self.send("POST", self.client.post(url).json(body)).await?;
        Ok(())
    }

    /// Make a PUT request, discarding the response body
    pub async fn put<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<(), CliError> {
        let url = self.url(segments)?;
        debug!("PUT {}", url);

        self.send("PUT", self.client.put(url).json(body)).await?;
        Ok(())
    }

    /// Make a multipart PUT request
    pub async fn put_multipart(
        &self,
        segments: &[&str],
        form: reqwest::multipart::Form,
    ) -> Result<(), CliError> {
        let url = self.url(segments)?;
        debug!("PUT {} (multipart)", url);

        self.send("PUT", self.client.put(url).multipart(form)).await?;
        Ok(())
    }

    /// Make a DELETE request
    pub async fn delete(&self, segments: &[&str]) -> Result<(), CliError> {
        let url = self.url(segments)?;
        debug!("DELETE {}", url);

        self.send("DELETE", self.client.delete(url)).await?;
        Ok(())
    }
}

/// The controller's `description` when the body is an error document
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => match err.code {
            Some(code) => format!("{} (code {})", err.description, code),
            None => err.description,
        },
        Err(_) => body.to_string(),
    }
}
