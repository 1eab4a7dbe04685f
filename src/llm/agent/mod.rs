//! Simple agent loop implementation
//!
//! This module provides a simple agent that:
//! - Maintains conversation history
//! - Calls the LLM and streams all responses
//! - Automatically executes tool calls
//! - Loops until getting a text-only response or the iteration bound
//! - Returns a stream of events throughout the entire loop

mod error;

pub use error::AgentError;

use crate::llm::core::{
    config::GenerationConfig,
    provider::LlmProvider,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration,
    },
};
use crate::llm::tools::executor::ToolExecutor;
use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use pin_utils::pin_mut;
use std::pin::Pin;
use std::sync::Arc;

/// Prompt appended when the iteration bound is hit and a final answer is requested
const FINAL_ANSWER_PROMPT: &str = "You have reached the maximum number of tool calls. \
Using only the information gathered so far, give your best final answer now.";

/// What to do when the agent reaches `max_iterations`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarlyStopping {
    /// Stop with `AgentError::MaxIterationsReached`
    Force,
    /// Make one last call without tools and return whatever the model says
    #[default]
    Generate,
}

/// Events emitted by the agent during execution
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Raw LLM streaming event (text deltas, tool calls, etc.)
    LlmEvent(StreamEvent),

    /// Agent is executing a tool call
    ToolExecutionStarted {
        tool_use_id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed successfully
    ToolExecutionCompleted {
        tool_use_id: String,
        name: String,
        result: String,
    },

    /// Tool execution failed with an error
    ToolExecutionFailed {
        tool_use_id: String,
        name: String,
        error: String,
    },

    /// Agent is starting a new iteration (calling LLM again after tool execution)
    IterationStarted { iteration: usize },

    /// Iteration bound hit; the agent is asking for a final answer without tools
    FinalAnswerRequested { iterations: usize },

    /// Agent loop completed (final response with no tool calls)
    Completed,
}

/// Result of driving the agent loop to the end
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentRun {
    /// Final assistant text
    pub output: String,
    /// One line per tool call, in execution order
    pub steps: Vec<String>,
}

/// Helper struct for accumulating partial tool use data
struct PartialToolUseAccumulator {
    id: String,
    name: String,
    input: String,
}

/// Simple agent that manages conversation history and tool execution
pub struct Agent {
    /// LLM provider
    provider: Arc<dyn LlmProvider>,

    /// Tool executor for handling function calls
    tool_executor: Arc<dyn ToolExecutor>,

    /// Tool declarations available to the LLM
    tool_declarations: Vec<ToolDeclaration>,

    /// Conversation history (kept in memory)
    messages: Vec<Message>,

    /// Generation configuration (temperature, max_tokens, etc.)
    config: GenerationConfig,

    /// System prompt (optional)
    system: Option<String>,

    /// Maximum number of agent loop iterations (default: 10)
    max_iterations: usize,

    early_stopping: EarlyStopping,
}

impl Agent {
    /// Create a new agent with default settings
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tool_executor: Arc<dyn ToolExecutor>,
        tool_declarations: Vec<ToolDeclaration>,
        config: GenerationConfig,
        system: Option<String>,
    ) -> Self {
        Self {
            provider,
            tool_executor,
            tool_declarations,
            messages: Vec::new(),
            config,
            system,
            max_iterations: 10,
            early_stopping: EarlyStopping::default(),
        }
    }

    /// Set the maximum number of iterations (default: 10)
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the behaviour when the iteration bound is reached
    pub fn with_early_stopping(mut self, early_stopping: EarlyStopping) -> Self {
        self.early_stopping = early_stopping;
        self
    }

    /// Process a new user message through the agent loop
    ///
    /// The returned stream will emit:
    /// - IterationStarted events when calling the LLM
    /// - LlmEvent events for all streaming responses from the LLM
    /// - ToolExecution* events when executing tools
    /// - FinalAnswerRequested when the bound is hit under `EarlyStopping::Generate`
    /// - Completed event when the agent loop finishes
    pub async fn run(
        &mut self,
        user_message: impl Into<String>,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + '_>>, AgentError>
    {
        self.messages.push(Message::user(user_message));

        let stream = self.create_agent_stream();

        Ok(Box::pin(stream))
    }

    /// Drive the loop for one user message and collect the final answer
    ///
    /// Text produced in the last model turn becomes `output`; each tool call is recorded
    /// in `steps` as `name -> <first line of result>`.
    pub async fn run_to_completion(
        &mut self,
        user_message: impl Into<String>,
    ) -> Result<AgentRun, AgentError> {
        let mut steps = Vec::new();
        let mut turn_text = String::new();

        {
            let mut events = self.run(user_message).await?;
            while let Some(event) = events.next().await {
                match event? {
                    AgentEvent::IterationStarted { .. } | AgentEvent::FinalAnswerRequested { .. } => {
                        turn_text.clear()
                    }
                    AgentEvent::LlmEvent(StreamEvent::ContentDelta {
                        delta: ContentDelta::TextDelta { text },
                        ..
                    }) => turn_text.push_str(&text),
                    AgentEvent::ToolExecutionCompleted { name, result, .. } => {
                        steps.push(format!("{} -> {}", name, summarize(&result)));
                    }
                    AgentEvent::ToolExecutionFailed { name, error, .. } => {
                        steps.push(format!("{} failed: {}", name, summarize(&error)));
                    }
                    AgentEvent::ToolExecutionStarted { name, input, .. } => {
                        tracing::info!(tool = %name, %input, "Agent invoking tool");
                    }
                    AgentEvent::Completed => break,
                    _ => {}
                }
            }
        }

        Ok(AgentRun {
            output: turn_text.trim().to_string(),
            steps,
        })
    }

    /// Get the full conversation history
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Roll history back to its first `len` messages
    ///
    /// Undoes a turn that failed or was dropped before it finished.
    pub fn truncate_history(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Drop all but the last `k` exchanges
    ///
    /// An exchange starts at a plain user turn and includes every assistant and tool
    /// message that follows it, so tool calls are never separated from their results.
    pub fn retain_recent_exchanges(&mut self, k: usize) {
        let starts: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_user_turn())
            .map(|(i, _)| i)
            .collect();

        if starts.len() <= k {
            return;
        }

        let cut = if k == 0 {
            self.messages.len()
        } else {
            starts[starts.len() - k]
        };
        self.messages.drain(..cut);
    }

    fn request(&self, with_tools: bool) -> GenerateRequest {
        GenerateRequest {
            messages: self.messages.clone(),
            tools: if with_tools {
                Some(self.tool_declarations.clone())
            } else {
                None
            },
            config: self.config.clone(),
            system: self.system.clone(),
        }
    }

    /// Create the agent event stream
    fn create_agent_stream(
        &mut self,
    ) -> impl Stream<Item = Result<AgentEvent, AgentError>> + Send + '_ {
        stream! {
            let mut iteration = 0;
            let mut final_answer = false;

            loop {
                iteration += 1;

                if iteration > self.max_iterations && !final_answer {
                    match self.early_stopping {
                        EarlyStopping::Force => {
                            yield Err(AgentError::MaxIterationsReached(iteration - 1));
                            return;
                        }
                        EarlyStopping::Generate => {
                            tracing::warn!(iterations = iteration - 1, "Iteration bound reached, requesting final answer");
                            final_answer = true;
                            self.messages.push(Message::user(FINAL_ANSWER_PROMPT));
                            yield Ok(AgentEvent::FinalAnswerRequested { iterations: iteration - 1 });
                        }
                    }
                } else {
                    yield Ok(AgentEvent::IterationStarted { iteration });
                }

                let request = self.request(!final_answer);

                let llm_stream = match self.provider.stream_generate(request).await {
                    Ok(s) => s,
                    Err(e) => {
                        yield Err(AgentError::Llm(e));
                        return;
                    }
                };

                let mut text_content = String::new();
                let mut tool_uses = Vec::new();
                let mut current_tool_use: Option<PartialToolUseAccumulator> = None;

                pin_mut!(llm_stream);

                while let Some(event_result) = llm_stream.next().await {
                    let event = match event_result {
                        Ok(e) => e,
                        Err(e) => {
                            yield Err(AgentError::Llm(e));
                            return;
                        }
                    };

                    yield Ok(AgentEvent::LlmEvent(event.clone()));

                    match &event {
                        StreamEvent::ContentBlockStart { block, .. } => {
                            match block {
                                ContentBlockStart::Text { text } => {
                                    text_content.push_str(text);
                                }
                                ContentBlockStart::ToolUse { id, name } => {
                                    current_tool_use = Some(PartialToolUseAccumulator {
                                        id: id.clone(),
                                        name: name.clone(),
                                        input: String::new(),
                                    });
                                }
                            }
                        }
                        StreamEvent::ContentDelta { delta, .. } => {
                            match delta {
                                ContentDelta::TextDelta { text } => {
                                    text_content.push_str(text);
                                }
                                ContentDelta::ToolUseDelta { partial } => {
                                    if let Some(tool_use) = &mut current_tool_use {
                                        tool_use.input.push_str(&partial.partial_json);
                                    }
                                }
                            }
                        }
                        StreamEvent::ContentBlockEnd { .. } => {
                            if let Some(tool_use) = current_tool_use.take() {
                                match serde_json::from_str(&tool_use.input) {
                                    Ok(input) => {
                                        tool_uses.push(ContentBlock::ToolUse {
                                            id: tool_use.id,
                                            name: tool_use.name,
                                            input,
                                        });
                                    }
                                    Err(e) => {
                                        yield Err(AgentError::ToolInputParse(e));
                                        return;
                                    }
                                }
                            }
                        }
                        StreamEvent::Error { error } => {
                            yield Err(AgentError::Stream(error.clone()));
                            return;
                        }
                        StreamEvent::MessageEnd { .. } => break,
                        _ => {}
                    }
                }

                // A tool-less final call cannot legitimately request tools
                if final_answer {
                    tool_uses.clear();
                }

                if tool_uses.is_empty() {
                    let mut assistant_content = Vec::new();
                    if !text_content.is_empty() {
                        assistant_content.push(ContentBlock::Text { text: text_content });
                    }

                    self.messages.push(Message {
                        role: MessageRole::Assistant,
                        content: assistant_content,
                    });

                    yield Ok(AgentEvent::Completed);
                    return;
                }

                let mut assistant_content = Vec::new();
                if !text_content.is_empty() {
                    assistant_content.push(ContentBlock::Text { text: text_content });
                }
                assistant_content.extend(tool_uses.clone());

                self.messages.push(Message {
                    role: MessageRole::Assistant,
                    content: assistant_content,
                });

                for block in &tool_uses {
                    if let ContentBlock::ToolUse { id, name, input } = block {
                        yield Ok(AgentEvent::ToolExecutionStarted {
                            tool_use_id: id.clone(),
                            name: name.clone(),
                            input: input.clone(),
                        });

                        match self.tool_executor.execute(
                            id.clone(),
                            name.clone(),
                            input.clone(),
                        ).await {
                            Ok(result) => {
                                yield Ok(AgentEvent::ToolExecutionCompleted {
                                    tool_use_id: id.clone(),
                                    name: name.clone(),
                                    result: result.clone(),
                                });

                                self.messages.push(Message::tool_result(id.clone(), result));
                            }
                            Err(error) => {
                                tracing::warn!(tool = %name, %error, "Tool execution failed");
                                yield Ok(AgentEvent::ToolExecutionFailed {
                                    tool_use_id: id.clone(),
                                    name: name.clone(),
                                    error: error.clone(),
                                });

                                self.messages.push(Message::tool_error(id.clone(), error));
                            }
                        }
                    }
                }
            }
        }
    }
}

/// First line of a tool payload, capped for step listings
fn summarize(text: &str) -> String {
    const LIMIT: usize = 200;
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > LIMIT {
        format!("{}...", line.chars().take(LIMIT).collect::<String>())
    } else {
        line.to_string()
    }
}
