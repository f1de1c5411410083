// Transcription boundary for transcriptd
// The recognizer itself is an external service consumed as a black box

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::path::Path;
use std::time::Duration;

/// Converts one exported clip to text.
///
/// Failures are per-clip: the caller skips the affected segment and
/// continues with the remaining clips.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, clip: &Path) -> Result<String>;
}

/// Whisper-style HTTP transcription service
pub struct RemoteTranscriber {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    language: String,
}

impl RemoteTranscriber {
    pub fn new(endpoint: String, api_key: Option<String>, language: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            language,
        })
    }
}

impl Transcriber for RemoteTranscriber {
    fn transcribe(&self, clip: &Path) -> Result<String> {
        let form = reqwest::blocking::multipart::Form::new()
            .text("language", self.language.clone())
            .text("response_format", "json")
            .file("file", clip)
            .with_context(|| format!("Failed to attach clip {:?}", clip))?;

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .context("Transcription request failed")?
            .error_for_status()
            .context("Transcription service returned an error")?;

        let body: serde_json::Value = response
            .json()
            .context("Failed to parse transcription response")?;

        let text = body
            .get("text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow!("Transcription response missing 'text' field"))?;

        debug!("Transcribed {:?}: {} chars", clip, text.len());
        Ok(text.trim().to_string())
    }
}
