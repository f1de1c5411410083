// Voice embedding features via an external embedding service
// The model itself is a black-box boundary; we upload a clip and get a
// fixed-length vector back

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::path::Path;
use std::time::Duration;

use super::{DistanceMetric, FeatureExtractor};

/// Speaker embedding extractor backed by an HTTP embedding service
pub struct RemoteEmbeddingExtractor {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    acceptance_threshold: f32,
    suggestion_threshold: f32,
}

impl RemoteEmbeddingExtractor {
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            acceptance_threshold: 0.2,
            suggestion_threshold: 0.25,
        })
    }
}

impl FeatureExtractor for RemoteEmbeddingExtractor {
    fn extract(&self, clip: &Path) -> Result<Vec<f32>> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("file", clip)
            .with_context(|| format!("Failed to attach clip {:?}", clip))?;

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .context("Embedding request failed")?
            .error_for_status()
            .context("Embedding service returned an error")?;

        let body: serde_json::Value = response
            .json()
            .context("Failed to parse embedding response")?;

        let embedding: Vec<f32> = body
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow!("Embedding response missing 'embedding' array"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if embedding.is_empty() {
            return Err(anyhow!("Embedding service returned an empty vector"));
        }

        debug!("Embedded {:?}: {} dims", clip, embedding.len());
        Ok(embedding)
    }

    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    fn acceptance_threshold(&self) -> f32 {
        self.acceptance_threshold
    }

    fn suggestion_threshold(&self) -> f32 {
        self.suggestion_threshold
    }
}
