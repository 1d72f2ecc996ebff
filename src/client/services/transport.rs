use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use crate::client::config::ClientConfig;
use crate::client::models::session::Session;
use crate::common::error::{ClientError, Result};

/// Header carrying the session token on every call
pub const TOKEN_HEADER: &str = "X-Auth-Token";

/// One remote service endpoint.
///
/// Every service speaks JSON over a single URL: reads are GET with query
/// parameters (the domain API disambiguates them with `action`), writes
/// are POST with a JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, params: &[(&str, &str)]) -> Result<Value>;
    async fn post(&self, body: Value) -> Result<Value>;
}

/// reqwest-backed transport that attaches the current session token
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    session: Arc<Session>,
}

impl HttpTransport {
    pub fn new(client: Client, endpoint: &str, session: Arc<Session>) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            session,
        })
    }

    /// Shared HTTP client for all three services
    pub fn build_client(config: &ClientConfig) -> Result<Client> {
        Ok(Client::builder().timeout(config.request_timeout).build()?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn handle_response(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) if status.is_success() => return Err(e.into()),
                // error pages are not always JSON
                Err(_) => Value::String(text),
            }
        };

        if !status.is_success() || error_message(&body).is_some() {
            return Err(error_from_body(status.as_u16(), &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let mut url = self.endpoint.clone();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        debug!("[HTTP] GET {}{}", url.path(), action_hint(params));
        let response = self.authorize(self.client.get(url)).send().await?;
        self.handle_response(response).await
    }

    async fn post(&self, body: Value) -> Result<Value> {
        debug!(
            "[HTTP] POST {} action={}",
            self.endpoint.path(),
            body.get("action").and_then(Value::as_str).unwrap_or("-")
        );
        let request = self.client.post(self.endpoint.clone()).json(&body);
        let response = self.authorize(request).send().await?;
        self.handle_response(response).await
    }
}

fn action_hint(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .find(|(k, _)| *k == "action")
        .map(|(_, v)| format!(" action={}", v))
        .unwrap_or_default()
}

fn error_message(body: &Value) -> Option<&str> {
    body.get("error").and_then(Value::as_str)
}

/// Maps a failed answer onto the client error taxonomy
pub(crate) fn error_from_body(status: u16, body: &Value) -> ClientError {
    let message = error_message(body)
        .map(str::to_string)
        .or_else(|| body.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("request failed with status {}", status));

    if message == "blocked" {
        let block_count = body
            .get("block_count")
            .and_then(Value::as_u64)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0);
        return ClientError::Blocked { block_count };
    }

    match status {
        401 => ClientError::Auth(message),
        404 => ClientError::NotFound(message),
        _ => ClientError::Server { status, message },
    }
}
