// Pipeline configuration for transcriptd
// Defaults under the platform data directory, overridable via a JSON
// config file and TRANSCRIPTD_* environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which voice-activity detector to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VadBackend {
    /// WebRTC frame classifier
    WebRtc,
    /// Pure energy threshold, works at any sample rate
    Energy,
}

/// Which feature extraction strategy feeds clustering and identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureBackend {
    /// Scalar mean-amplitude heuristic, fully local
    Amplitude,
    /// Voice embeddings from the external embedding service
    RemoteEmbedding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory scanned for `<date>/<time>.<ext>` source files
    pub audio_root: PathBuf,
    /// Where exported clips land
    pub segments_dir: PathBuf,
    pub db_path: PathBuf,
    /// Flat registry snapshot (legacy keyed store, written atomically)
    pub registry_path: PathBuf,

    pub poll_interval_secs: u64,
    pub audio_extensions: Vec<String>,

    pub vad: VadBackend,
    /// WebRTC VAD aggressiveness (0-3)
    pub vad_aggressiveness: u8,
    /// RMS threshold for the energy fallback
    pub energy_threshold: f32,
    pub merge_gap_sec: f64,
    pub pad_sec: f64,

    /// Requested clusters per recording (clamped to distinct features)
    pub cluster_count: usize,
    pub cluster_seed: u64,

    pub features: FeatureBackend,
    pub embedding_endpoint: Option<String>,
    pub transcription_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("transcriptd");

        Self {
            audio_root: data_dir.join("audio"),
            segments_dir: data_dir.join("audio_segments"),
            db_path: data_dir.join("transcripts.db"),
            registry_path: data_dir.join("global_speakers.json"),
            poll_interval_secs: 60,
            audio_extensions: vec!["wav".to_string()],
            vad: VadBackend::WebRtc,
            vad_aggressiveness: 3,
            energy_threshold: 0.01,
            merge_gap_sec: 0.2,
            pad_sec: 0.1,
            cluster_count: 2,
            cluster_seed: 42,
            features: FeatureBackend::Amplitude,
            embedding_endpoint: None,
            transcription_endpoint: None,
            api_key: None,
            language: "english".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Build configuration from the environment: `TRANSCRIPTD_CONFIG`
    /// names an optional JSON file, individual variables override it.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os("TRANSCRIPTD_CONFIG") {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(v) = env_var("TRANSCRIPTD_AUDIO") {
            config.audio_root = PathBuf::from(v);
        }
        if let Some(v) = env_var("TRANSCRIPTD_AUDIO_SEGMENTS") {
            config.segments_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("TRANSCRIPTD_DB") {
            config.db_path = PathBuf::from(v);
        }
        if let Some(v) = env_var("TRANSCRIPTD_REGISTRY") {
            config.registry_path = PathBuf::from(v);
        }
        if let Some(v) = env_var("TRANSCRIPTD_TRANSCRIBE_URL") {
            config.transcription_endpoint = Some(v);
        }
        if let Some(v) = env_var("TRANSCRIPTD_EMBED_URL") {
            config.embedding_endpoint = Some(v);
            config.features = FeatureBackend::RemoteEmbedding;
        }
        if let Some(v) = env_var("TRANSCRIPTD_API_KEY") {
            config.api_key = Some(v);
        }

        Ok(config)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.merge_gap_sec, 0.2);
        assert_eq!(config.pad_sec, 0.1);
        assert_eq!(config.features, FeatureBackend::Amplitude);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"audio_root": "/mnt/audio", "cluster_count": 3, "vad": "energy"}"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.audio_root, PathBuf::from("/mnt/audio"));
        assert_eq!(config.cluster_count, 3);
        assert_eq!(config.vad, VadBackend::Energy);
        assert_eq!(config.poll_interval_secs, 60);
    }
}
