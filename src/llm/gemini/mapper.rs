//! Mapping between abstraction types and Gemini types

use std::collections::HashMap;

use uuid::Uuid;

use crate::llm::core::{
    config::GenerationConfig,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
        MessageMetadata, MessageRole, PartialToolUse, StreamEvent, ToolDeclaration, UsageMetadata,
    },
};

use super::types::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GeminiGenerationConfig,
    GenerateContentRequest, GenerateContentResponse, Part, SystemInstruction, Tool,
};

/// JSON-schema keywords Gemini rejects in function parameters
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &[
    "$schema",
    "title",
    "definitions",
    "$defs",
    "additionalProperties",
    "format",
];

/// Convert our abstraction request to Gemini's request format
pub fn to_gemini_request(request: GenerateRequest) -> GenerateContentRequest {
    // Gemini function responses are matched by name, not id.
    let tool_names: HashMap<String, String> = request
        .messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, .. } => Some((id.clone(), name.clone())),
            _ => None,
        })
        .collect();

    // Parallel tool results must reach Gemini as a single user turn
    let mut contents: Vec<Content> = Vec::with_capacity(request.messages.len());
    for message in request.messages {
        let content = to_gemini_content(message, &tool_names);
        match contents.last_mut() {
            Some(last) if last.role == content.role => last.parts.extend(content.parts),
            _ => contents.push(content),
        }
    }

    GenerateContentRequest {
        contents,
        system_instruction: request.system.map(|s| SystemInstruction {
            parts: vec![Part::Text { text: s }],
        }),
        tools: request
            .tools
            .filter(|tools| !tools.is_empty())
            .map(|tools| {
                vec![Tool {
                    function_declarations: tools
                        .into_iter()
                        .map(to_gemini_function_declaration)
                        .collect(),
                }]
            }),
        generation_config: Some(to_gemini_generation_config(request.config)),
    }
}

/// Convert a message to Gemini's content format
fn to_gemini_content(message: Message, tool_names: &HashMap<String, String>) -> Content {
    let role = match message.role {
        MessageRole::Assistant => "model",
        // Tool results travel in the user role as FunctionResponse parts
        MessageRole::User | MessageRole::Tool => "user",
    };

    let parts = message
        .content
        .into_iter()
        .map(|block| to_gemini_part(block, tool_names))
        .collect();

    Content {
        role: role.to_string(),
        parts,
    }
}

/// Convert a content block to a Gemini part
fn to_gemini_part(block: ContentBlock, tool_names: &HashMap<String, String>) -> Part {
    match block {
        ContentBlock::Text { text } => Part::Text { text },
        ContentBlock::ToolUse { name, input, .. } => Part::FunctionCall {
            function_call: FunctionCall { name, args: input },
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let response = if is_error {
                serde_json::json!({ "error": content })
            } else {
                // Gemini requires an object here
                match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(value @ serde_json::Value::Object(_)) => value,
                    Ok(value) => serde_json::json!({ "result": value }),
                    Err(_) => serde_json::json!({ "result": content }),
                }
            };

            let name = tool_names
                .get(&tool_use_id)
                .cloned()
                .unwrap_or_else(|| tool_use_id.clone());

            Part::FunctionResponse {
                function_response: FunctionResponse { name, response },
            }
        }
    }
}

/// Convert a tool declaration to Gemini's function declaration
fn to_gemini_function_declaration(tool: ToolDeclaration) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name,
        description: tool.description,
        parameters: sanitize_schema(tool.input_schema),
    }
}

/// Strip JSON-schema keywords Gemini does not accept
///
/// Returns `None` for object schemas without properties, which Gemini refuses outright.
pub fn sanitize_schema(schema: serde_json::Value) -> Option<serde_json::Value> {
    let cleaned = strip_unsupported(schema);
    let empty_object = cleaned.get("type").and_then(|t| t.as_str()) == Some("object")
        && cleaned
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|p| p.is_empty())
            .unwrap_or(true);

    if empty_object {
        None
    } else {
        Some(cleaned)
    }
}

fn strip_unsupported(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(key, _)| !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()))
                .map(|(key, value)| {
                    let value = if key == "properties" {
                        strip_property_schemas(value)
                    } else {
                        strip_unsupported(value)
                    };
                    (key, value)
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(strip_unsupported).collect())
        }
        other => other,
    }
}

/// Property names are user data; only their schemas are cleaned
fn strip_property_schemas(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(name, schema)| (name, strip_unsupported(schema)))
                .collect(),
        ),
        other => other,
    }
}

/// Convert generation config to Gemini's format
fn to_gemini_generation_config(config: GenerationConfig) -> GeminiGenerationConfig {
    GeminiGenerationConfig {
        max_output_tokens: Some(config.max_tokens),
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k,
        stop_sequences: config.stop_sequences,
    }
}

/// Convert Gemini response to our abstraction's stream events
///
/// Text parts become deltas on the current block; each function call becomes a complete
/// start/delta/end triple with a generated id, since Gemini does not assign one.
pub fn from_gemini_response(
    response: GenerateContentResponse,
    current_index: &mut usize,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    let Some(candidate) = response.candidates.first() else {
        return events;
    };

    for part in &candidate.content.parts {
        match part {
            Part::Text { text } => {
                events.push(StreamEvent::ContentDelta {
                    index: *current_index,
                    delta: ContentDelta::TextDelta { text: text.clone() },
                });
            }
            Part::FunctionCall { function_call } => {
                events.push(StreamEvent::ContentBlockStart {
                    index: *current_index,
                    block: ContentBlockStart::ToolUse {
                        id: Uuid::new_v4().to_string(),
                        name: function_call.name.clone(),
                    },
                });

                let args = if function_call.args.is_null() {
                    serde_json::json!({})
                } else {
                    function_call.args.clone()
                };

                events.push(StreamEvent::ContentDelta {
                    index: *current_index,
                    delta: ContentDelta::ToolUseDelta {
                        partial: PartialToolUse {
                            id: None,
                            name: Some(function_call.name.clone()),
                            partial_json: args.to_string(),
                        },
                    },
                });

                events.push(StreamEvent::ContentBlockEnd {
                    index: *current_index,
                });

                *current_index += 1;
            }
            Part::FunctionResponse { .. } => {}
        }
    }

    if let Some(finish_reason_str) = &candidate.finish_reason {
        let usage = response
            .usage_metadata
            .as_ref()
            .map(|usage| UsageMetadata {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            })
            .unwrap_or_default();

        events.push(StreamEvent::MessageEnd {
            finish_reason: map_finish_reason(finish_reason_str),
            usage,
        });
    }

    events
}

/// Map Gemini's finish reason to our abstraction
fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" => FinishReason::Safety,
        other => FinishReason::Other(other.to_string()),
    }
}

/// Helper to create initial message start event
pub fn create_message_start(message_id: String) -> StreamEvent {
    StreamEvent::MessageStart {
        message: MessageMetadata {
            id: message_id,
            role: MessageRole::Assistant,
            usage: None,
        },
    }
}
