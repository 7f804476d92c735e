//! OpenAI-compatible chat completions wire format.
//!
//! `POST {base_url}/chat/completions`; also spoken by most aggregators and
//! self-hosted servers.

use serde::{Deserialize, Serialize};
use switchboard_application::{GatewayError, ProviderReply};
use switchboard_domain::request::Attachment;
use switchboard_domain::{FinishReason, Model, Request, Role, Usage};

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub(crate) fn endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

pub(crate) fn build_request(model: &Model, request: &Request) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if let Some(system) = &request.system_prompt {
        messages.push(WireMessage {
            role: Role::System.as_str(),
            content: WireContent::Text(system.clone()),
        });
    }
    for turn in &request.history {
        messages.push(WireMessage {
            role: turn.role.as_str(),
            content: WireContent::Text(turn.content.clone()),
        });
    }

    let images: Vec<ContentPart> = request
        .attachments
        .iter()
        .filter_map(|a| match a {
            Attachment::Image { url } => Some(ContentPart::ImageUrl {
                image_url: ImageUrl { url: url.clone() },
            }),
            Attachment::Tool { .. } => None,
        })
        .collect();
    let content = if images.is_empty() {
        WireContent::Text(request.prompt.clone())
    } else {
        let mut parts = vec![ContentPart::Text {
            text: request.prompt.clone(),
        }];
        parts.extend(images);
        WireContent::Parts(parts)
    };
    messages.push(WireMessage {
        role: Role::User.as_str(),
        content,
    });

    ChatCompletionRequest {
        model: model.id.clone(),
        messages,
        max_tokens: request.effective_max_tokens(model.max_output_tokens),
        temperature: request.params.temperature,
        stop: (!request.params.stop.is_empty()).then(|| request.params.stop.clone()),
        stream: false,
    }
}

pub(crate) fn parse_response(body: &str) -> Result<ProviderReply, GatewayError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Malformed(format!("invalid chat completion: {e}")))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::Malformed("no choices in response".to_string()))?;

    let usage = parsed
        .usage
        .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();
    let finish_reason = choice
        .finish_reason
        .as_deref()
        .map(FinishReason::from_provider)
        .unwrap_or(FinishReason::Stop);

    Ok(
        ProviderReply::new(choice.message.content.unwrap_or_default(), usage)
            .with_finish_reason(finish_reason)
            .with_metadata(serde_json::json!({
                "id": parsed.id,
                "model": parsed.model,
            })),
    )
}

/// Best-effort message from an error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
