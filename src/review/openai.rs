#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result};
use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use super::{Judgment, Reviewer, review_request};
use crate::config::OpenAiEnv;

/// Reviews submissions through an OpenAI-compatible chat completion endpoint.
///
/// Owns a single-threaded runtime so callers stay blocking.
pub struct OpenAiReviewer {
    /// API client
    client:  OpenAIClient<OpenAIConfig>,
    /// model, endpoint and sampling settings
    env:     OpenAiEnv,
    /// runtime driving the client
    runtime: Runtime,
}

impl OpenAiReviewer {
    /// Creates a reviewer for `env`.
    pub fn new(env: OpenAiEnv) -> Result<Self> {
        let client = OpenAIClient::with_config(
            OpenAIConfig::new()
                .with_api_base(env.api_base())
                .with_api_key(env.api_key()),
        );
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create Tokio runtime for review requests")?;
        Ok(Self {
            client,
            env,
            runtime,
        })
    }

    /// Renders the instructor/student messages for one review.
    fn messages(&self, problem: &str, source: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        let (instructions, code) = review_request(problem, source);
        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .name("Instructor".to_string())
                .build()
                .context("Failed to build system message")?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(code)
                .name("Student".to_string())
                .build()
                .context("Failed to build user message")?
                .into(),
        ])
    }
}

impl Reviewer for OpenAiReviewer {
    fn review(&self, problem: &str, source: &str) -> Result<Judgment> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.env.model())
            .messages(self.messages(problem, source)?)
            .temperature(self.env.temperature())
            .response_format(ResponseFormat::JsonObject)
            .build()
            .context("Failed to build review request")?;

        let response = self
            .runtime
            .block_on(self.client.chat().create(request))
            .context("Review request failed")?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .context("Review response has no content")?;

        tracing::debug!("Review response: {content}");
        Judgment::from_response(&content)
    }
}
