//! Subcommand implementations

use anyhow::{Context, Result};
use keyline_animation::{
    normalize, sample, Easing, EngineConfig, KeyframeStore, ObjectId, ObjectPose, PlaybackEngine,
    RestPoses, SampledFrame, SceneTarget, StepAnimation, TrackRef, Transform,
};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read a step animation document
pub fn read_document(path: &Path) -> Result<StepAnimation> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    StepAnimation::from_json(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read rest poses (`{"objectId": {position, rotation, scale}, ...}`)
pub fn read_rest_poses(path: Option<&Path>) -> Result<RestPoses> {
    let Some(path) = path else {
        return Ok(RestPoses::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a document to `output`, or stdout
fn write_document(doc: &StepAnimation, output: Option<&Path>) -> Result<()> {
    let json = doc.to_json()?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackSummary {
    track: TrackRef,
    keyframes: usize,
    first: f64,
    last: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSummary {
    duration: f64,
    is_offset: bool,
    annotations: usize,
    tracks: Vec<TrackSummary>,
}

fn summarize(doc: &StepAnimation) -> DocumentSummary {
    let store = KeyframeStore::new(doc.clone());
    let mut tracks: Vec<TrackRef> = store
        .tracked_objects()
        .into_iter()
        .map(TrackRef::Object)
        .collect();
    if !doc.camera_keyframes.is_empty() {
        tracks.push(TrackRef::Camera);
    }

    let tracks = tracks
        .into_iter()
        .filter_map(|track| {
            let times = store.track_times(&track);
            Some(TrackSummary {
                keyframes: times.len(),
                first: *times.first()?,
                last: *times.last()?,
                track,
            })
        })
        .collect();

    DocumentSummary {
        duration: doc.duration,
        is_offset: doc.is_offset,
        annotations: doc.annotation_instances.as_ref().map_or(0, Vec::len),
        tracks,
    }
}

/// `keyline inspect`
pub fn inspect(path: &Path) -> Result<()> {
    let doc = read_document(path)?;
    let summary = summarize(&doc);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// `keyline normalize`
pub fn normalize_document(path: &Path, rest: &Path, output: Option<&Path>) -> Result<()> {
    let doc = read_document(path)?;
    let rest_poses = read_rest_poses(Some(rest))?;
    if doc.is_offset {
        tracing::info!("{} is already in offset form", path.display());
    } else if rest_poses.is_empty() {
        anyhow::bail!("{} contains no rest poses", rest.display());
    }
    write_document(&normalize(&doc, &rest_poses), output)
}

/// `keyline sample`
pub fn sample_document(path: &Path, time: f64, rest: Option<&Path>) -> Result<()> {
    let doc = read_document(path)?;
    let rest_poses = read_rest_poses(rest)?;
    let frame = sample(&doc, &rest_poses, time);
    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(())
}

/// `keyline shift`
pub fn shift(path: &Path, delta: f64, output: Option<&Path>, config: &EngineConfig) -> Result<()> {
    if !delta.is_finite() {
        anyhow::bail!("Shift delta must be a finite number of seconds");
    }
    let doc = read_document(path)?;
    let mut store = KeyframeStore::new(doc).with_probe_step(config.timeline.probe_step);
    store.shift_all(delta);
    tracing::info!(
        "shifted by {}s, duration now {}s",
        delta,
        store.duration()
    );
    write_document(store.document(), output)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EasingPreview {
    easing: Easing,
    overshoots: bool,
    svg_points: String,
    #[serde(flatten)]
    curve: keyline_animation::EasingCurve,
}

/// `keyline ease`
pub fn ease(kind: Option<&str>, samples: Option<usize>, config: &EngineConfig) -> Result<()> {
    let Some(kind) = kind else {
        for easing in Easing::ALL {
            println!("{}", easing);
        }
        return Ok(());
    };

    let easing = Easing::from_id(kind);
    if easing == Easing::Linear && !kind.eq_ignore_ascii_case("linear") {
        tracing::warn!("unknown easing {:?}, previewing linear", kind);
    }
    let curve = easing.preview(
        samples.unwrap_or(config.preview.samples),
        config.preview.width,
        config.preview.height,
    );
    let preview = EasingPreview {
        easing,
        overshoots: easing.overshoots(),
        svg_points: curve.to_svg_points(),
        curve,
    };
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

/// Counts what the engine pushed into the scene
#[derive(Debug, Default)]
struct FrameStats {
    posed: usize,
    reset: usize,
}

impl SceneTarget for FrameStats {
    fn apply_pose(&mut self, _object_id: &ObjectId, _pose: &ObjectPose) {
        self.posed += 1;
    }

    fn reset_to_rest(&mut self, _object_id: &ObjectId, _rest: &Transform) {
        self.reset += 1;
    }
}

/// `keyline frames`: play the step once on the internal clock and emit one
/// JSON line per tick
pub fn frames(
    path: &Path,
    fps: Option<f64>,
    rest: Option<&Path>,
    config: &EngineConfig,
) -> Result<()> {
    let doc = read_document(path)?;
    let rest_poses = read_rest_poses(rest)?;

    let mut clock = config.playback_clock(doc.duration).with_loop(false);
    if let Some(fps) = fps {
        if !(fps.is_finite() && fps > 0.0) {
            anyhow::bail!("--fps must be a positive number");
        }
        clock = clock.with_tick_rate(fps);
    }
    let dt = clock.frame_interval();

    let mut engine = PlaybackEngine::new(clock);
    engine.clock_mut().play();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut stats = FrameStats::default();
    let mut count = 0usize;

    emit(&mut out, engine.render(&doc, &rest_poses, &mut stats, None))?;
    count += 1;
    while engine.clock().is_running() {
        engine.advance(dt, None);
        emit(&mut out, engine.render(&doc, &rest_poses, &mut stats, None))?;
        count += 1;
    }

    tracing::info!(
        "emitted {} frame(s): {} pose(s) applied, {} rest reset(s)",
        count,
        stats.posed,
        stats.reset
    );
    Ok(())
}

fn emit(out: &mut impl Write, frame: &SampledFrame) -> Result<()> {
    serde_json::to_writer(&mut *out, frame)?;
    writeln!(out)?;
    Ok(())
}
