//! Gemini provider — the `generateContent` endpoint with function calling.
//!
//! Turns map to `contents` entries, tool descriptors become
//! `functionDeclarations`, and tool results go back as `functionResponse`
//! parts in user-role contents. Calls are non-streaming; one request per
//! relay round.

use async_trait::async_trait;
use mordomo_core::conversation::Turn;
use mordomo_core::error::ProviderError;
use mordomo_core::provider::{ModelReply, Provider, ProviderRequest, ToolInvocation};
use mordomo_core::tool::{ToolDescriptor, ToolOutput};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-call deadline. Without one, a hung request stalls the conversation
/// forever.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A Gemini API provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider for the given model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Override the endpoint base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert the turn log to Gemini `contents`.
    ///
    /// Adjacent turns that map to the same role are coalesced into one
    /// content with multiple parts, so parallel tool calls and their
    /// responses form the grouped shape the API expects.
    ///
    /// A `ToolCall` that was never answered (the log ends at it after an
    /// unknown-tool abort) would be rejected by the API as an unpaired
    /// `functionCall`, so an error `functionResponse` is synthesized for it.
    fn to_contents(turns: &[Turn]) -> Vec<ApiContent> {
        let mut parts: Vec<(&str, ApiPart)> = Vec::new();

        for (i, turn) in turns.iter().enumerate() {
            match turn {
                Turn::User { text } => parts.push(("user", ApiPart::text(text.as_str()))),
                Turn::Model { text } => parts.push(("model", ApiPart::text(text.as_str()))),
                Turn::ToolCall { name, arguments } => {
                    parts.push((
                        "model",
                        ApiPart {
                            function_call: Some(ApiFunctionCall {
                                name: name.clone(),
                                args: arguments.clone(),
                            }),
                            ..ApiPart::default()
                        },
                    ));

                    // Answered if a matching result appears before the next
                    // plain-text turn.
                    let answered = turns[i + 1..]
                        .iter()
                        .take_while(|t| {
                            matches!(t, Turn::ToolCall { .. } | Turn::ToolResult { .. })
                        })
                        .any(|t| {
                            matches!(t, Turn::ToolResult { name: next, .. } if next == name)
                        });
                    if !answered {
                        let output =
                            ToolOutput::Error(format!("Ferramenta indisponível: {name}"));
                        parts.push((
                            "user",
                            ApiPart {
                                function_response: Some(ApiFunctionResponse {
                                    name: name.clone(),
                                    response: output.to_payload(),
                                }),
                                ..ApiPart::default()
                            },
                        ));
                    }
                }
                Turn::ToolResult { name, output } => parts.push((
                    "user",
                    ApiPart {
                        function_response: Some(ApiFunctionResponse {
                            name: name.clone(),
                            response: output.to_payload(),
                        }),
                        ..ApiPart::default()
                    },
                )),
            }
        }

        let mut contents: Vec<ApiContent> = Vec::new();
        for (role, part) in parts {
            match contents.last_mut() {
                Some(last) if last.role == role => last.parts.push(part),
                _ => contents.push(ApiContent {
                    role: role.to_string(),
                    parts: vec![part],
                }),
            }
        }

        contents
    }

    fn to_api_tools(tools: &[ToolDescriptor]) -> Vec<ApiTool> {
        if tools.is_empty() {
            return Vec::new();
        }
        vec![ApiTool {
            function_declarations: tools
                .iter()
                .map(|t| ApiFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    }

    /// Collapse a candidate's parts into our reply shape.
    fn to_model_reply(content: ApiContent) -> ModelReply {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in content.parts {
            if let Some(t) = part.text {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(ToolInvocation {
                    name: fc.name,
                    arguments: fc.args,
                });
            }
        }

        ModelReply { text, tool_calls }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ModelReply, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let body = ApiRequest {
            system_instruction: ApiSystemInstruction {
                parts: vec![ApiPart::text(request.system_instruction.as_str())],
            },
            contents: Self::to_contents(&request.turns),
            tools: Self::to_api_tools(&request.tools),
            generation_config: ApiGenerationConfig {
                temperature: request.temperature,
            },
        };

        debug!(model = %self.model, turns = request.turns.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited { retry_after_secs: 5 });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse response: {e}"))
        })?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No candidates in response".into()))?;

        let content = candidate.content.ok_or_else(|| {
            ProviderError::MalformedResponse("Candidate without content".into())
        })?;

        Ok(Self::to_model_reply(content))
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    system_instruction: ApiSystemInstruction,
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct ApiSystemInstruction {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

impl ApiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiTool {
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: Option<ApiContent>,
}
