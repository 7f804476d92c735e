//! reqwest-backed provider gateway.
//!
//! Selects the wire format from the provider's endpoint and resolves API
//! keys from explicit credentials or the environment.

use super::{anthropic, openai};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use std::collections::HashMap;
use std::time::Duration;
use switchboard_application::{GatewayError, ProviderGateway, ProviderReply};
use switchboard_domain::{AuthRequirement, Model, Provider, ProviderApi, Request};
use tracing::debug;

/// Provider id to API key
pub type Credentials = HashMap<String, String>;

/// Longest error body kept in a failure message
const MAX_ERROR_BODY: usize = 500;

pub struct HttpProviderGateway {
    client: reqwest::Client,
    credentials: Credentials,
}

impl HttpProviderGateway {
    /// `timeout` bounds the whole HTTP exchange; the router applies its own
    /// deadline on top.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn api_key(&self, provider: &Provider) -> Result<Option<String>, GatewayError> {
        match &provider.auth {
            AuthRequirement::None => Ok(None),
            AuthRequirement::ApiKey { env } => self
                .credentials
                .get(&provider.id)
                .cloned()
                .or_else(|| std::env::var(env).ok())
                .filter(|key| !key.trim().is_empty())
                .map(Some)
                .ok_or_else(|| {
                    GatewayError::Auth(format!(
                        "no API key for provider '{}' (set {})",
                        provider.id, env
                    ))
                }),
        }
    }

    fn headers(api: ProviderApi, api_key: Option<&str>) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let invalid = |_: InvalidHeaderValue| {
            GatewayError::Auth("API key contains invalid header characters".to_string())
        };
        match api {
            ProviderApi::OpenAi => {
                if let Some(key) = api_key {
                    headers.insert(
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
                    );
                }
            }
            ProviderApi::Anthropic => {
                headers.insert(
                    "anthropic-version",
                    HeaderValue::from_static(anthropic::API_VERSION),
                );
                if let Some(key) = api_key {
                    headers.insert("x-api-key", HeaderValue::from_str(key).map_err(invalid)?);
                }
            }
        }
        Ok(headers)
    }

    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &impl serde::Serialize,
    ) -> Result<(u16, String), GatewayError> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;
        Ok((status, text))
    }
}

#[async_trait]
impl ProviderGateway for HttpProviderGateway {
    async fn invoke(
        &self,
        provider: &Provider,
        model: &Model,
        request: &Request,
    ) -> Result<ProviderReply, GatewayError> {
        let api = provider.endpoint.api;
        let api_key = self.api_key(provider)?;
        let headers = Self::headers(api, api_key.as_deref())?;

        let (status, body) = match api {
            ProviderApi::OpenAi => {
                let url = openai::endpoint(&provider.endpoint.base_url);
                debug!(provider = %provider.id, model = %model.id, url = %url, "POST chat completion");
                self.post(&url, headers, &openai::build_request(model, request))
                    .await?
            }
            ProviderApi::Anthropic => {
                let url = anthropic::endpoint(&provider.endpoint.base_url);
                debug!(provider = %provider.id, model = %model.id, url = %url, "POST messages");
                self.post(&url, headers, &anthropic::build_request(model, request))
                    .await?
            }
        };

        if !(200..300).contains(&status) {
            let message = match api {
                ProviderApi::OpenAi => openai::error_message(&body),
                ProviderApi::Anthropic => anthropic::error_message(&body),
            };
            return Err(GatewayError::Status {
                code: status,
                message: truncate(&message, MAX_ERROR_BODY),
            });
        }

        match api {
            ProviderApi::OpenAi => openai::parse_response(&body),
            ProviderApi::Anthropic => anthropic::parse_response(&body),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
