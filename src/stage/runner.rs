//! Stage runner backed by OpenAI chat completions.

use super::tools::{fetch_tool_definitions, parse_tool_call};
use super::{coerce_output, Stage, StageOutput, StageRunner};
use crate::config::ScriptSettings;
use crate::documents::DocumentSource;
use crate::error::{FortellError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, info};

/// Executes stages against the OpenAI chat API.
///
/// Stages that declare document access get the fetch tool and a bounded
/// tool-calling loop; all other stages are a single completion.
pub struct OpenAiStageRunner {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    documents: DocumentSource,
    max_iterations: usize,
}

impl OpenAiStageRunner {
    /// Create a runner from script settings and a document source.
    pub fn new(settings: &ScriptSettings, documents: DocumentSource) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            documents,
            max_iterations: settings.max_stage_iterations,
        }
    }

    fn system_message(stage: &Stage) -> String {
        format!(
            "{}\n\nRespond with a single JSON object of the form:\n{}\nDo not include any other text outside the JSON object.",
            stage.instructions,
            stage.kind.output_contract()
        )
    }

    async fn complete(&self, stage: &Stage, input: &str) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(Self::system_message(stage))
                .build()
                .map_err(|e| FortellError::Stage(stage.name.to_string(), e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(input.to_string())
                .build()
                .map_err(|e| FortellError::Stage(stage.name.to_string(), e.to_string()))?
                .into(),
        ];

        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(FortellError::Stage(
                    stage.name.to_string(),
                    format!("exceeded maximum iterations ({})", self.max_iterations),
                ));
            }

            debug!("Stage '{}' iteration {}", stage.name, iterations);

            let mut request_builder = CreateChatCompletionRequestArgs::default();
            request_builder
                .model(&self.model)
                .messages(messages.clone())
                .temperature(self.temperature);

            if stage.uses_documents {
                request_builder.tools(fetch_tool_definitions(&self.documents));
            }

            let request = request_builder
                .build()
                .map_err(|e| FortellError::Stage(stage.name.to_string(), e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| FortellError::OpenAI(format!("Stage API error: {}", e)))?;

            let choice = response.choices.first().ok_or_else(|| {
                FortellError::Stage(stage.name.to_string(), "No response from model".to_string())
            })?;

            match &choice.message.tool_calls {
                Some(tool_calls) if !tool_calls.is_empty() && stage.uses_documents => {
                    let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                        .tool_calls(tool_calls.clone())
                        .build()
                        .map_err(|e| FortellError::Stage(stage.name.to_string(), e.to_string()))?;
                    messages.push(assistant_msg.into());

                    for tool_call in tool_calls {
                        let name = &tool_call.function.name;
                        let arguments = &tool_call.function.arguments;
                        info!("Stage '{}' calling tool: {}({})", stage.name, name, arguments);

                        // Tool failures become result text the stage can read
                        let result = match parse_tool_call(name, arguments) {
                            Ok(tool) => tool.execute(&self.documents),
                            Err(e) => format!("Failed to parse tool call: {}", e),
                        };

                        let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(&tool_call.id)
                            .content(result)
                            .build()
                            .map_err(|e| {
                                FortellError::Stage(stage.name.to_string(), e.to_string())
                            })?;
                        messages.push(tool_msg.into());
                    }
                }
                _ => {
                    return choice.message.content.clone().ok_or_else(|| {
                        FortellError::Stage(
                            stage.name.to_string(),
                            "Empty response from model".to_string(),
                        )
                    });
                }
            }
        }
    }
}

#[async_trait]
impl StageRunner for OpenAiStageRunner {
    async fn run(&self, stage: &Stage, input: &str) -> Result<StageOutput> {
        info!("Running stage '{}'", stage.name);
        let content = self.complete(stage, input).await?;
        coerce_output(stage, &content)
    }
}
