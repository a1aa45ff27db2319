//! OpenAI-compatible streaming client.
//!
//! Contains [`OpenAiSource`], the production [`ModelSource`]. It posts the
//! transcript to `{base_url}/chat/completions` with `stream: true` and decodes
//! the server-sent-events body into [`StreamEvent`](super::StreamEvent)s.

use anyhow::{Context, Result};
use futures::StreamExt;
use std::time::Duration;

use super::source::{EventStream, ModelSource, StepRequest, StreamError};
use super::sse::SseDecoder;
use super::wire;
use crate::config::Settings;
use crate::constants::CONNECT_TIMEOUT_SECS;

/// A configured chat-completions endpoint ready to stream steps.
pub struct OpenAiSource {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiSource {
    /// Creates a source from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait::async_trait]
impl ModelSource for OpenAiSource {
    async fn stream(&self, request: StepRequest<'_>) -> Result<EventStream, StreamError> {
        let body = wire::request_body(&self.model, &request);
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "opening model stream"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes_stream().boxed();
        let events = futures::stream::unfold(Some((body, SseDecoder::new())), |state| async move {
            let Some((mut body, mut decoder)) = state else {
                return None;
            };
            let batch = match body.next().await {
                Some(Ok(bytes)) => decoder.feed(&bytes),
                Some(Err(e)) => vec![Err(StreamError::Transport(e))],
                None => return Some((decoder.finish().into_iter().collect::<Vec<_>>(), None)),
            };
            Some((batch, Some((body, decoder))))
        })
        .flat_map(futures::stream::iter);

        Ok(events.boxed())
    }
}
