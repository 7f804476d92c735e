//! Anthropic Messages API wire format.
//!
//! `POST {base_url}/v1/messages`. The system prompt is a top-level field and
//! `max_tokens` is mandatory.

use serde::{Deserialize, Serialize};
use switchboard_application::{GatewayError, ProviderReply};
use switchboard_domain::request::Attachment;
use switchboard_domain::{FinishReason, Model, Request, Role, Usage};

pub(crate) const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<RequestBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    url: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
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
    format!("{}/v1/messages", base_url.trim_end_matches('/'))
}

fn text(content: &str) -> Vec<RequestBlock> {
    vec![RequestBlock::Text {
        text: content.to_string(),
    }]
}

pub(crate) fn build_request(model: &Model, request: &Request) -> MessagesRequest {
    // System turns in history are folded into the top-level system prompt
    let mut system: Vec<&str> = request.system_prompt.iter().map(String::as_str).collect();
    let mut messages = Vec::with_capacity(request.history.len() + 1);
    for turn in &request.history {
        match turn.role {
            Role::System => system.push(&turn.content),
            role => messages.push(WireMessage {
                role: role.as_str(),
                content: text(&turn.content),
            }),
        }
    }

    let mut content = text(&request.prompt);
    content.extend(request.attachments.iter().filter_map(|a| match a {
        Attachment::Image { url } => Some(RequestBlock::Image {
            source: ImageSource {
                kind: "url",
                url: url.clone(),
            },
        }),
        Attachment::Tool { .. } => None,
    }));
    messages.push(WireMessage {
        role: Role::User.as_str(),
        content,
    });

    MessagesRequest {
        model: model.id.clone(),
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages,
        max_tokens: request.effective_max_tokens(model.max_output_tokens),
        temperature: request.params.temperature,
        stop_sequences: (!request.params.stop.is_empty()).then(|| request.params.stop.clone()),
    }
}

pub(crate) fn parse_response(body: &str) -> Result<ProviderReply, GatewayError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Malformed(format!("invalid messages response: {e}")))?;

    let content: String = parsed
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();
    let usage = parsed
        .usage
        .map(|u| Usage::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();
    let finish_reason = parsed
        .stop_reason
        .as_deref()
        .map(FinishReason::from_provider)
        .unwrap_or(FinishReason::Stop);

    Ok(ProviderReply::new(content, usage)
        .with_finish_reason(finish_reason)
        .with_metadata(serde_json::json!({
            "id": parsed.id,
            "model": parsed.model,
        })))
}

pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
