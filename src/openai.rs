//! Shared OpenAI client construction.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// How long one API request may run before the client gives up. Script stages
/// on long briefs and full-size speech chunks can both take minutes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Build the OpenAI client shared by the stage runner and the speech
/// synthesizer. Credentials come from the `OPENAI_API_KEY` environment
/// variable via the default config.
pub fn create_client() -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
