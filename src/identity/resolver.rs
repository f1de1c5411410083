// Identity resolver
// Turns a recording's local clusters into stable, long-lived speaker
// identities: match against the registry, create sequential ids for
// unmatched clusters, and keep each identity's exemplar set bounded

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::path::Path;

use crate::clustering::{self, Clustering};
use crate::database::speakers_repo::{
    exemplar_segment_ids_impl, replace_exemplars_impl, upsert_speaker_impl, MAX_EXEMPLARS,
};
use crate::database::{Segment, Speaker};
use crate::features::{euclidean_distance, mean_vector};
use crate::identity::registry;
use crate::PipelineContext;

/// Outcome of one resolution pass over a recording
#[derive(Debug, Clone, Default)]
pub struct ResolutionSummary {
    pub recording_id: i64,
    /// Clusters that produced an assignment (empty clusters excluded)
    pub clusters: usize,
    /// Ids of existing speakers clusters were merged into
    pub matched: Vec<String>,
    /// Newly allocated speaker ids
    pub created: Vec<String>,
}

/// A similar-segment suggestion returned by `reassign_segment`
#[derive(Debug, Clone)]
pub struct SegmentSuggestion {
    pub segment_id: i64,
    pub distance: f32,
}

/// An existing identity with its exemplar vectors re-extracted
struct SpeakerProfile {
    speaker: Speaker,
    exemplars: Vec<(i64, Vec<f32>)>,
    mean: Vec<f32>,
}

/// Planned updates for one cluster, applied in a single transaction
struct ClusterPlan {
    speaker: Speaker,
    is_new: bool,
    segment_ids: Vec<i64>,
    exemplar_ids: Vec<i64>,
}

/// Run identity resolution for one recording.
///
/// Re-running recomputes clustering from scratch and overwrites prior
/// speaker assignments, except segments with a manually locked speaker.
/// Clusters are matched only against speakers registered before this
/// pass, so two clusters of one recording never collapse into each
/// other here.
pub fn resolve_recording(ctx: &PipelineContext, recording_id: i64) -> Result<ResolutionSummary> {
    let segments = ctx.db.segments_for_recording(recording_id)?;
    if segments.is_empty() {
        info!("Recording {} has no segments, nothing to resolve", recording_id);
        return Ok(ResolutionSummary {
            recording_id,
            ..Default::default()
        });
    }

    // Feature extraction; unreadable clips drop out of the pass
    let mut features: Vec<(Segment, Vec<f32>)> = Vec::with_capacity(segments.len());
    for segment in segments {
        match ctx.extractor.extract(Path::new(&segment.clip_path)) {
            Ok(vector) => features.push((segment, vector)),
            Err(e) => warn!("Skipping segment {}: {:#}", segment.id, e),
        }
    }
    if features.is_empty() {
        warn!("Recording {} has no usable features", recording_id);
        return Ok(ResolutionSummary {
            recording_id,
            ..Default::default()
        });
    }

    let vectors: Vec<Vec<f32>> = features.iter().map(|(_, v)| v.clone()).collect();
    let clustering = clustering::kmeans(&vectors, ctx.config.cluster_count, ctx.config.cluster_seed);

    let profiles = speaker_profiles(ctx)?;
    let mut next_index = ctx.db.next_speaker_index()?;
    let now = chrono::Utc::now().to_rfc3339();

    let mut summary = ResolutionSummary {
        recording_id,
        ..Default::default()
    };

    let mut plans: Vec<ClusterPlan> = Vec::new();
    for cluster in 0..clustering.centroids.len() {
        let plan = match plan_cluster(
            ctx,
            &features,
            &clustering,
            cluster,
            &profiles,
            &mut next_index,
            &now,
        ) {
            Some(p) => p,
            None => continue,
        };
        if plan.is_new {
            summary.created.push(plan.speaker.id.clone());
        } else {
            summary.matched.push(plan.speaker.id.clone());
        }
        plans.push(plan);
    }
    // Empty clusters are not planned and not counted
    summary.clusters = plans.len();

    // One transaction per resolution pass: a crash leaves either the old
    // or the fully-updated assignments
    ctx.db.with_connection_mut(|conn| {
        let tx = conn.transaction()?;
        for plan in &plans {
            upsert_speaker_impl(&tx, &plan.speaker)?;
            for segment_id in &plan.segment_ids {
                tx.execute(
                    "UPDATE segments SET speaker_id = ? WHERE id = ? AND speaker_locked = 0",
                    rusqlite::params![plan.speaker.id, segment_id],
                )?;
            }
            replace_exemplars_impl(&tx, &plan.speaker.id, &plan.exemplar_ids)?;
        }
        tx.commit()?;
        Ok(())
    })?;

    registry::export_snapshot(&ctx.db, ctx.registry_path())?;

    info!(
        "Resolved recording {}: {} clusters, matched {:?}, created {:?}",
        recording_id, summary.clusters, summary.matched, summary.created
    );
    Ok(summary)
}

fn plan_cluster(
    ctx: &PipelineContext,
    features: &[(Segment, Vec<f32>)],
    clustering: &Clustering,
    cluster: usize,
    profiles: &[SpeakerProfile],
    next_index: &mut u64,
    now: &str,
) -> Option<ClusterPlan> {
    let members = clustering.members_of(cluster);
    if members.is_empty() {
        return None;
    }
    let centroid = &clustering.centroids[cluster];

    // Up to 10 members closest to the centroid form the cluster's sample
    let mut ranked = members.clone();
    ranked.sort_by(|&a, &b| {
        let da = euclidean_distance(&features[a].1, centroid);
        let db = euclidean_distance(&features[b].1, centroid);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    let top: Vec<(i64, Vec<f32>)> = ranked
        .iter()
        .take(MAX_EXEMPLARS)
        .map(|&i| (features[i].0.id, features[i].1.clone()))
        .collect();
    let representative = mean_vector(&top.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>());

    let metric = ctx.extractor.metric();
    let best = profiles
        .iter()
        .map(|p| (p, metric.distance(&representative, &p.mean)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let (speaker, is_new, previous_exemplars) = match best {
        Some((profile, distance)) if distance <= ctx.extractor.acceptance_threshold() => {
            let mut speaker = profile.speaker.clone();
            speaker.last_seen = Some(now.to_string());
            (speaker, false, profile.exemplars.clone())
        }
        _ => {
            let id = format!("speaker_{}", *next_index);
            *next_index += 1;
            (Speaker::new(id), true, Vec::new())
        }
    };

    // Exemplar rebuild: previous set plus this cluster's sample,
    // re-ranked against the updated representative, truncated to the bound
    let mut candidates = previous_exemplars;
    for (segment_id, vector) in top {
        if !candidates.iter().any(|(id, _)| *id == segment_id) {
            candidates.push((segment_id, vector));
        }
    }
    let updated_rep =
        mean_vector(&candidates.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>());
    candidates.sort_by(|a, b| {
        let da = metric.distance(&a.1, &updated_rep);
        let db = metric.distance(&b.1, &updated_rep);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(MAX_EXEMPLARS);

    Some(ClusterPlan {
        segment_ids: members.iter().map(|&i| features[i].0.id).collect(),
        exemplar_ids: candidates.iter().map(|(id, _)| *id).collect(),
        speaker,
        is_new,
    })
}

/// Re-extract every speaker's exemplar vectors; speakers without a
/// single usable exemplar cannot be matched and are skipped
fn speaker_profiles(ctx: &PipelineContext) -> Result<Vec<SpeakerProfile>> {
    let mut profiles = Vec::new();
    for speaker in ctx.db.list_speakers()? {
        let mut exemplars = Vec::new();
        for segment_id in ctx.db.exemplar_segment_ids(&speaker.id)? {
            let Some(segment) = ctx.db.get_segment(segment_id)? else {
                continue;
            };
            match ctx.extractor.extract(Path::new(&segment.clip_path)) {
                Ok(vector) => exemplars.push((segment_id, vector)),
                Err(e) => warn!(
                    "Unreadable exemplar {} for {}: {:#}",
                    segment_id, speaker.id, e
                ),
            }
        }
        if exemplars.is_empty() {
            continue;
        }
        let mean = mean_vector(&exemplars.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>());
        profiles.push(SpeakerProfile {
            speaker,
            exemplars,
            mean,
        });
    }
    Ok(profiles)
}

/// Set a speaker's display label. No effect on exemplars or identity.
pub fn relabel_speaker(ctx: &PipelineContext, speaker_id: &str, new_label: &str) -> Result<()> {
    ctx.db.relabel_speaker(speaker_id, new_label)?;
    registry::export_snapshot(&ctx.db, ctx.registry_path())?;
    info!("Relabeled {} to '{}'", speaker_id, new_label);
    Ok(())
}

/// Fold `source_id` into `target_id`: every segment and exemplar
/// reference moves to the target, the source row is deleted, and the
/// target inherits the source's label when it has none.
pub fn merge_speakers(ctx: &PipelineContext, source_id: &str, target_id: &str) -> Result<()> {
    if source_id == target_id {
        return Err(anyhow!("Cannot merge a speaker into itself"));
    }
    let source = ctx
        .db
        .get_speaker(source_id)?
        .ok_or_else(|| anyhow!("Speaker not found: {}", source_id))?;
    let target = ctx
        .db
        .get_speaker(target_id)?
        .ok_or_else(|| anyhow!("Speaker not found: {}", target_id))?;

    let mut merged = target.clone();
    if merged.label.is_none() {
        merged.label = source.label.clone();
    }
    for alias in source.aliases.iter().chain(std::iter::once(&source.id)) {
        if !merged.aliases.contains(alias) {
            merged.aliases.push(alias.clone());
        }
    }
    merged.first_seen = match (merged.first_seen, source.first_seen) {
        (Some(a), Some(b)) => Some(if a <= b { a } else { b }),
        (a, b) => a.or(b),
    };
    merged.last_seen = match (merged.last_seen, source.last_seen) {
        (Some(a), Some(b)) => Some(if a >= b { a } else { b }),
        (a, b) => a.or(b),
    };

    ctx.db.with_connection_mut(|conn| {
        let tx = conn.transaction()?;

        upsert_speaker_impl(&tx, &merged)?;

        tx.execute(
            "UPDATE segments SET speaker_id = ? WHERE speaker_id = ?",
            rusqlite::params![target_id, source_id],
        )?;

        // Union of exemplar references, target's first, deduplicated and
        // re-bounded
        let mut exemplar_ids = exemplar_segment_ids_impl(&tx, target_id)?;
        for id in exemplar_segment_ids_impl(&tx, source_id)? {
            if !exemplar_ids.contains(&id) {
                exemplar_ids.push(id);
            }
        }
        exemplar_ids.truncate(MAX_EXEMPLARS);
        tx.execute(
            "DELETE FROM speaker_exemplars WHERE speaker_id = ?",
            rusqlite::params![source_id],
        )?;
        replace_exemplars_impl(&tx, target_id, &exemplar_ids)?;

        tx.execute(
            "DELETE FROM speakers WHERE id = ?",
            rusqlite::params![source_id],
        )?;

        tx.commit()?;
        Ok(())
    })?;

    registry::export_snapshot(&ctx.db, ctx.registry_path())?;
    info!("Merged speaker {} into {}", source_id, target_id);
    Ok(())
}

/// Manually pin one segment to a speaker, then suggest similar segments
/// from the same recording. Suggestions are never applied automatically.
pub fn reassign_segment(
    ctx: &PipelineContext,
    segment_id: i64,
    speaker_id: &str,
) -> Result<Vec<SegmentSuggestion>> {
    let segment = ctx
        .db
        .get_segment(segment_id)?
        .ok_or_else(|| anyhow!("Segment not found: {}", segment_id))?;

    if ctx.db.get_speaker(speaker_id)?.is_none() {
        ctx.db.upsert_speaker(&Speaker::new(speaker_id.to_string()))?;
    }
    ctx.db.set_segment_speaker(segment_id, speaker_id, true)?;

    let target = ctx.extractor.extract(Path::new(&segment.clip_path))?;
    let metric = ctx.extractor.metric();
    let threshold = ctx.extractor.suggestion_threshold();

    let mut suggestions = Vec::new();
    for other in ctx.db.segments_for_recording(segment.recording_id)? {
        if other.id == segment_id {
            continue;
        }
        match ctx.extractor.extract(Path::new(&other.clip_path)) {
            Ok(vector) => {
                let distance = metric.distance(&target, &vector);
                if distance < threshold {
                    suggestions.push(SegmentSuggestion {
                        segment_id: other.id,
                        distance,
                    });
                }
            }
            Err(e) => warn!("Skipping candidate segment {}: {:#}", other.id, e),
        }
    }
    suggestions.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    registry::export_snapshot(&ctx.db, ctx.registry_path())?;
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::database::{DatabaseManager, NewSegment};
    use crate::features::{DistanceMetric, FeatureExtractor};
    use crate::transcription::Transcriber;
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// Maps clip paths to fixed embedding vectors
    struct MapExtractor {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl FeatureExtractor for MapExtractor {
        fn extract(&self, clip: &Path) -> Result<Vec<f32>> {
            self.vectors
                .get(clip.to_string_lossy().as_ref())
                .cloned()
                .ok_or_else(|| anyhow!("no vector for {:?}", clip))
        }

        fn metric(&self) -> DistanceMetric {
            DistanceMetric::Cosine
        }

        fn acceptance_threshold(&self) -> f32 {
            0.2
        }

        fn suggestion_threshold(&self) -> f32 {
            0.25
        }
    }

    struct NoopTranscriber;

    impl Transcriber for NoopTranscriber {
        fn transcribe(&self, _clip: &Path) -> Result<String> {
            Ok(String::new())
        }
    }

    fn test_context(
        dir: &tempfile::TempDir,
        vectors: HashMap<String, Vec<f32>>,
    ) -> PipelineContext {
        let mut config = PipelineConfig::default();
        config.db_path = dir.path().join("test.db");
        config.registry_path = dir.path().join("global_speakers.json");
        let db = DatabaseManager::new(config.db_path.clone()).unwrap();
        PipelineContext::with_parts(
            config,
            db,
            Box::new(MapExtractor { vectors }),
            Box::new(NoopTranscriber),
        )
    }

    /// Insert a recording whose segments have the given feature vectors;
    /// returns (recording_id, segment_ids)
    fn insert_recording(
        ctx: &PipelineContext,
        vectors: &mut HashMap<String, Vec<f32>>,
        transcript_id: &str,
        features: &[Vec<f32>],
    ) -> (i64, Vec<i64>) {
        let segments: Vec<NewSegment> = features
            .iter()
            .enumerate()
            .map(|(i, _)| NewSegment {
                start_time: i as f64,
                end_time: i as f64 + 0.8,
                transcript: Some(format!("utterance {}", i)),
                clip_path: format!("/clips/{}_seg{:03}.wav", transcript_id, i),
            })
            .collect();
        let recording_id = ctx
            .db
            .insert_recording_with_segments("rec.wav", transcript_id, 60.0, &segments)
            .unwrap();
        let ids: Vec<i64> = ctx
            .db
            .segments_for_recording(recording_id)
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        for (i, vector) in features.iter().enumerate() {
            vectors.insert(
                format!("/clips/{}_seg{:03}.wav", transcript_id, i),
                vector.clone(),
            );
        }
        (recording_id, ids)
    }

    fn rebuild_extractor(ctx: &mut PipelineContext, vectors: &HashMap<String, Vec<f32>>) {
        ctx.extractor = Box::new(MapExtractor {
            vectors: vectors.clone(),
        });
    }

    fn two_voice_features() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.98, 0.05, 0.0],
            vec![0.99, 0.0, 0.05],
            vec![0.0, 1.0, 0.0],
            vec![0.05, 0.98, 0.0],
            vec![0.0, 0.99, 0.05],
        ]
    }

    #[test]
    fn test_first_pass_creates_sequential_speakers() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());
        let (rec, _) = insert_recording(&ctx, &mut vectors, "2025-08-01_09-00-00", &two_voice_features());
        rebuild_extractor(&mut ctx, &vectors);

        let summary = resolve_recording(&ctx, rec).unwrap();

        assert_eq!(summary.clusters, 2);
        assert_eq!(summary.clusters, summary.matched.len() + summary.created.len());
        assert!(summary.matched.is_empty());
        let mut created = summary.created.clone();
        created.sort();
        assert_eq!(created, vec!["speaker_0", "speaker_1"]);

        // Every segment got a speaker, two distinct ones
        let assigned: Vec<String> = ctx
            .db
            .segments_for_recording(rec)
            .unwrap()
            .iter()
            .map(|s| s.speaker_id.clone().unwrap())
            .collect();
        let distinct: std::collections::BTreeSet<_> = assigned.iter().collect();
        assert_eq!(distinct.len(), 2);

        // Registry snapshot was written
        assert!(ctx.registry_path().exists());
    }

    #[test]
    fn test_close_cluster_merges_into_existing_identity() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());

        let (first, _) = insert_recording(
            &ctx,
            &mut vectors,
            "2025-08-01_09-00-00",
            &[vec![1.0, 0.0, 0.0], vec![0.99, 0.01, 0.0]],
        );
        rebuild_extractor(&mut ctx, &vectors);
        resolve_recording(&ctx, first).unwrap();

        // A later recording with nearly identical voice features
        let (second, _) = insert_recording(
            &ctx,
            &mut vectors,
            "2025-08-02_10-00-00",
            &[vec![0.98, 0.02, 0.0], vec![1.0, 0.01, 0.01]],
        );
        rebuild_extractor(&mut ctx, &vectors);
        let summary = resolve_recording(&ctx, second).unwrap();

        assert_eq!(summary.matched, vec!["speaker_0"]);
        assert!(summary.created.is_empty());
        assert_eq!(ctx.db.list_speakers().unwrap().len(), 1);

        for segment in ctx.db.segments_for_recording(second).unwrap() {
            assert_eq!(segment.speaker_id.as_deref(), Some("speaker_0"));
        }
    }

    #[test]
    fn test_distant_cluster_gets_next_sequential_id() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());

        let (first, _) = insert_recording(
            &ctx,
            &mut vectors,
            "2025-08-01_09-00-00",
            &[vec![1.0, 0.0, 0.0], vec![0.99, 0.01, 0.0]],
        );
        rebuild_extractor(&mut ctx, &vectors);
        resolve_recording(&ctx, first).unwrap();

        // Orthogonal voice: cosine distance 1.0 > 0.2
        let (second, _) = insert_recording(
            &ctx,
            &mut vectors,
            "2025-08-02_10-00-00",
            &[vec![0.0, 0.0, 1.0], vec![0.0, 0.01, 0.99]],
        );
        rebuild_extractor(&mut ctx, &vectors);
        let summary = resolve_recording(&ctx, second).unwrap();

        assert!(summary.matched.is_empty());
        assert_eq!(summary.created, vec!["speaker_1"]);
    }

    #[test]
    fn test_exemplar_bound_holds_across_passes() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());

        // Three recordings of the same voice, 8 segments each
        for (i, tid) in ["2025-08-01_09-00-00", "2025-08-02_09-00-00", "2025-08-03_09-00-00"]
            .iter()
            .enumerate()
        {
            let features: Vec<Vec<f32>> = (0..8)
                .map(|j| vec![1.0, 0.001 * (i * 8 + j) as f32, 0.0])
                .collect();
            let (rec, _) = insert_recording(&ctx, &mut vectors, tid, &features);
            rebuild_extractor(&mut ctx, &vectors);
            resolve_recording(&ctx, rec).unwrap();
        }

        for speaker in ctx.db.list_speakers().unwrap() {
            let exemplars = ctx.db.exemplar_segment_ids(&speaker.id).unwrap();
            assert!(exemplars.len() <= MAX_EXEMPLARS);
        }
    }

    #[test]
    fn test_rerun_overwrites_except_locked_segments() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());
        let (rec, ids) =
            insert_recording(&ctx, &mut vectors, "2025-08-01_09-00-00", &two_voice_features());
        rebuild_extractor(&mut ctx, &vectors);

        resolve_recording(&ctx, rec).unwrap();

        // Operator pins one segment to a brand-new identity
        reassign_segment(&ctx, ids[0], "alice").unwrap();

        resolve_recording(&ctx, rec).unwrap();

        let segments = ctx.db.segments_for_recording(rec).unwrap();
        let pinned = segments.iter().find(|s| s.id == ids[0]).unwrap();
        assert_eq!(pinned.speaker_id.as_deref(), Some("alice"));
        assert!(pinned.speaker_locked);
        // All other segments were re-resolved to auto ids
        for segment in segments.iter().filter(|s| s.id != ids[0]) {
            assert!(segment.speaker_id.as_deref().unwrap().starts_with("speaker_"));
        }
    }

    #[test]
    fn test_merge_speakers_moves_everything() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());

        // 5 segments for the source voice, 3 for the target voice
        let features: Vec<Vec<f32>> = (0..5)
            .map(|i| vec![1.0, 0.001 * i as f32, 0.0])
            .chain((0..3).map(|i| vec![0.0, 1.0, 0.001 * i as f32]))
            .collect();
        let (rec, _) = insert_recording(&ctx, &mut vectors, "2025-08-01_09-00-00", &features);
        rebuild_extractor(&mut ctx, &vectors);
        resolve_recording(&ctx, rec).unwrap();

        let source = "speaker_0";
        let target = "speaker_1";
        ctx.db.relabel_speaker(source, "Jozef").unwrap();
        let before =
            ctx.db.segment_count_for_speaker(source).unwrap() + ctx.db.segment_count_for_speaker(target).unwrap();
        assert_eq!(before, 8);

        merge_speakers(&ctx, source, target).unwrap();

        assert_eq!(ctx.db.segment_count_for_speaker(target).unwrap(), 8);
        assert_eq!(ctx.db.segment_count_for_speaker(source).unwrap(), 0);
        assert!(ctx.db.get_speaker(source).unwrap().is_none());

        let merged = ctx.db.get_speaker(target).unwrap().unwrap();
        // Target had no label, inherits the source's
        assert_eq!(merged.label.as_deref(), Some("Jozef"));
        assert!(merged.aliases.contains(&source.to_string()));

        // No exemplar references to the source remain
        assert!(ctx.db.exemplar_segment_ids(source).unwrap().is_empty());
        assert!(ctx.db.exemplar_segment_ids(target).unwrap().len() <= MAX_EXEMPLARS);
    }

    #[test]
    fn test_reassign_segment_suggests_similar_segments() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());
        let (_, ids) =
            insert_recording(&ctx, &mut vectors, "2025-08-01_09-00-00", &two_voice_features());
        rebuild_extractor(&mut ctx, &vectors);

        let suggestions = reassign_segment(&ctx, ids[0], "jozef").unwrap();

        // The two other members of the same voice group are suggested,
        // the orthogonal group is not
        let suggested: Vec<i64> = suggestions.iter().map(|s| s.segment_id).collect();
        assert_eq!(suggested.len(), 2);
        assert!(suggested.contains(&ids[1]));
        assert!(suggested.contains(&ids[2]));

        let pinned = ctx.db.get_segment(ids[0]).unwrap().unwrap();
        assert_eq!(pinned.speaker_id.as_deref(), Some("jozef"));
        assert!(pinned.speaker_locked);
    }

    #[test]
    fn test_relabel_changes_label_only() {
        let dir = tempdir().unwrap();
        let mut vectors = HashMap::new();
        let mut ctx = test_context(&dir, HashMap::new());
        let (rec, _) = insert_recording(
            &ctx,
            &mut vectors,
            "2025-08-01_09-00-00",
            &[vec![1.0, 0.0, 0.0], vec![0.99, 0.01, 0.0]],
        );
        rebuild_extractor(&mut ctx, &vectors);
        resolve_recording(&ctx, rec).unwrap();

        let before = ctx.db.exemplar_segment_ids("speaker_0").unwrap();
        relabel_speaker(&ctx, "speaker_0", "Alex").unwrap();

        let speaker = ctx.db.get_speaker("speaker_0").unwrap().unwrap();
        assert_eq!(speaker.label.as_deref(), Some("Alex"));
        assert_eq!(ctx.db.exemplar_segment_ids("speaker_0").unwrap(), before);
    }

    #[test]
    fn test_empty_recording_resolves_to_nothing() {
        let dir = tempdir().unwrap();
        let ctx = test_context(&dir, HashMap::new());
        let rec = ctx
            .db
            .insert_recording_with_segments("rec.wav", "2025-08-01_09-00-00", 5.0, &[])
            .unwrap();

        let summary = resolve_recording(&ctx, rec).unwrap();
        assert_eq!(summary.clusters, 0);
        assert!(ctx.db.list_speakers().unwrap().is_empty());
    }
}
