// Pipeline context for transcriptd
// Configuration plus opened handles, passed explicitly to every
// pipeline call instead of process-global singletons

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::config::{FeatureBackend, PipelineConfig, VadBackend};
use crate::database::DatabaseManager;
use crate::features::{AmplitudeFeatures, FeatureExtractor, RemoteEmbeddingExtractor};
use crate::segmentation::{EnergyVad, FallbackVad, SegmentationEngine, VadEngine, WebRtcVad};
use crate::transcription::{RemoteTranscriber, Transcriber};

pub struct PipelineContext {
    pub config: PipelineConfig,
    pub db: DatabaseManager,
    pub extractor: Box<dyn FeatureExtractor>,
    pub transcriber: Box<dyn Transcriber>,
}

impl PipelineContext {
    /// Open the context described by `config`: database, feature
    /// extraction strategy, and the transcription boundary.
    pub fn open(config: PipelineConfig) -> Result<Self> {
        let db = DatabaseManager::new(config.db_path.clone())?;

        let extractor: Box<dyn FeatureExtractor> = match config.features {
            FeatureBackend::Amplitude => Box::new(AmplitudeFeatures::default()),
            FeatureBackend::RemoteEmbedding => {
                let endpoint = config
                    .embedding_endpoint
                    .clone()
                    .ok_or_else(|| anyhow!("remote_embedding features require an embedding endpoint"))?;
                Box::new(RemoteEmbeddingExtractor::new(endpoint, config.api_key.clone())?)
            }
        };

        let endpoint = config
            .transcription_endpoint
            .clone()
            .ok_or_else(|| anyhow!("A transcription endpoint must be configured"))?;
        let transcriber = Box::new(RemoteTranscriber::new(
            endpoint,
            config.api_key.clone(),
            config.language.clone(),
        )?);

        Ok(Self {
            config,
            db,
            extractor,
            transcriber,
        })
    }

    /// Assemble with explicit parts (embedders, tests, alternative stacks)
    pub fn with_parts(
        config: PipelineConfig,
        db: DatabaseManager,
        extractor: Box<dyn FeatureExtractor>,
        transcriber: Box<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            db,
            extractor,
            transcriber,
        }
    }

    /// A segmentation engine for the configured VAD backend. The frame
    /// classifier is wrapped so input it cannot process (unsupported
    /// sample rates) degrades to energy detection instead of failing
    /// the file.
    pub fn segmentation_engine(&self) -> SegmentationEngine {
        let vad: Box<dyn VadEngine> = match self.config.vad {
            VadBackend::WebRtc => Box::new(FallbackVad::new(
                Box::new(WebRtcVad::new(self.config.vad_aggressiveness)),
                Box::new(EnergyVad::new(self.config.energy_threshold)),
            )),
            VadBackend::Energy => Box::new(EnergyVad::new(self.config.energy_threshold)),
        };
        SegmentationEngine::new(vad, self.config.merge_gap_sec, self.config.pad_sec)
    }

    /// Path of the flat registry snapshot
    pub fn registry_path(&self) -> &Path {
        &self.config.registry_path
    }
}
