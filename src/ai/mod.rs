pub mod prompt;

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use backoff::ExponentialBackoffBuilder;
use tracing::{debug, info};

use crate::config::RemoteSettings;
use crate::{AppError, AppResult};

/// Something that turns a prompt into generated text.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

/// Chat-completions client for OpenAI or any compatible server.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerator {
    #[tracing::instrument(name = "Configuring the language model client", level = "debug", skip(settings))]
    pub fn new(settings: &RemoteSettings) -> AppResult<Self> {
        let mut config = OpenAIConfig::new().with_api_key(settings.credential.expose());
        if let Some(api_base) = &settings.api_base {
            debug!("Using API base {}", api_base);
            config = config.with_api_base(api_base);
        }
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        // One request per run: the client's rate-limit retries stay disabled.
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        let client = Client::with_config(config)
            .with_http_client(http_client)
            .with_backoff(no_retry);
        Ok(Self {
            client,
            model: settings.model.clone(),
        })
    }
}

impl TextGenerator for OpenAiGenerator {
    #[tracing::instrument(
        name = "Waiting for the language model",
        level = "info",
        skip(self, prompt),
        fields(model = %self.model)
    )]
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .build()?;

        info!("Sending prompt to {}", self.model);
        let response = self.client.chat().create(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                "Token usage: {} prompt, {} completion",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::RemoteCall("The response contained no text".to_string()))
    }
}
