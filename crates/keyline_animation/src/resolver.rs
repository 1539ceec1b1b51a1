//! Transform resolver
//!
//! Samples every track of a step animation at one instant and produces the
//! absolute pose of each tracked object plus the camera placement. Sampling
//! is a pure function of `(document, rest poses, time)`: it never mutates the
//! document and returns bit-identical results for identical inputs.

use crate::document::StepAnimation;
use crate::easing::ease;
use crate::keyframe::{CameraKeyframe, CameraPose, ObjectId, ObjectKeyframe, Timed};
use crate::math::{euler_to_quat, quat_to_euler, Transform, Vec3};
use crate::offset::{apply_offset, RestPoses};
use glam::DQuat;
use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

type Track<'a, K> = SmallVec<[&'a K; 8]>;

/// How a pose was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseSource {
    /// Between two keyframes
    Interpolated,
    /// At or after a keyframe with nothing later on the track
    Held,
}

/// Visibility state of an object at the sampled instant
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    /// Whether the object should be rendered at all
    pub visible: bool,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Shadows only while fully shown or fading in
    pub cast_shadow: bool,
}

impl Visibility {
    pub const SHOWN: Visibility = Visibility {
        visible: true,
        opacity: 1.0,
        cast_shadow: true,
    };
    pub const HIDDEN: Visibility = Visibility {
        visible: false,
        opacity: 0.0,
        cast_shadow: false,
    };

    fn from_flag(visible: bool) -> Self {
        if visible {
            Self::SHOWN
        } else {
            Self::HIDDEN
        }
    }

    /// Cross-fade between two differing flags. The object stays logically
    /// visible; opacity follows `u` towards the target flag.
    fn fade(prev: bool, next: bool, u: f64) -> Self {
        if prev == next {
            return Self::from_flag(next);
        }
        let opacity = if next { u } else { 1.0 - u };
        Visibility {
            visible: true,
            opacity: opacity.clamp(0.0, 1.0),
            cast_shadow: next,
        }
    }
}

/// Absolute pose of one object
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPose {
    pub position: Vec3,
    /// Orientation as `[x, y, z, w]`
    pub orientation: DQuat,
    pub scale: Vec3,
    pub visibility: Visibility,
    pub source: PoseSource,
}

impl ObjectPose {
    /// Orientation as XYZ Euler angles (radians)
    pub fn rotation_euler(&self) -> Vec3 {
        quat_to_euler(self.orientation)
    }

    fn held(rest: &Transform, kf: &ObjectKeyframe) -> Self {
        let absolute = apply_offset(rest, &kf.transform);
        ObjectPose {
            position: absolute.position,
            orientation: euler_to_quat(absolute.rotation),
            scale: absolute.scale,
            visibility: Visibility::from_flag(kf.visible),
            source: PoseSource::Held,
        }
    }

    fn interpolated(rest: &Transform, prev: &ObjectKeyframe, next: &ObjectKeyframe, u: f64) -> Self {
        let a = apply_offset(rest, &prev.transform);
        let b = apply_offset(rest, &next.transform);
        ObjectPose {
            position: a.position.lerp(b.position, u),
            orientation: euler_to_quat(a.rotation).slerp(euler_to_quat(b.rotation), u),
            scale: a.scale.lerp(b.scale, u),
            visibility: Visibility::fade(prev.visible, next.visible, u),
            source: PoseSource::Interpolated,
        }
    }
}

/// Result of sampling one object track
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackSample {
    /// Before the first keyframe: leave the object at its rest pose
    Rest,
    Pose(ObjectPose),
}

/// Everything the renderer needs for one frame
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledFrame {
    /// Sampled time, in seconds
    pub time: f64,
    /// Poses of objects with an active keyframe, in track order
    pub object_poses: IndexMap<ObjectId, ObjectPose>,
    /// Tracked objects whose first keyframe is still ahead
    pub at_rest: Vec<ObjectId>,
    /// Camera placement, when the camera track has started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraPose>,
}

impl SampledFrame {
    /// Effective visibility of `id` including inherited fades.
    ///
    /// An object's own visibility track always wins; otherwise the nearest
    /// ancestor with a sampled pose decides. Fades are not multiplied down
    /// the hierarchy. `None` when neither the object nor any ancestor is
    /// animated at this instant.
    pub fn visibility_for(&self, id: &ObjectId) -> Option<Visibility> {
        let mut current = Some(id.clone());
        while let Some(candidate) = current {
            if let Some(pose) = self.object_poses.get(&candidate) {
                return Some(pose.visibility);
            }
            current = candidate.parent();
        }
        None
    }
}

/// Sample the whole document at time `t` (seconds).
///
/// A NaN time samples at 0; negative times fall before every keyframe and
/// times past the end hold the last keyframe.
pub fn sample(doc: &StepAnimation, rest_poses: &RestPoses, t: f64) -> SampledFrame {
    let t = if t.is_nan() { 0.0 } else { t };

    let mut tracks: IndexMap<&ObjectId, Track<'_, ObjectKeyframe>> = IndexMap::new();
    for kf in &doc.object_keyframes {
        tracks.entry(&kf.object_id).or_default().push(kf);
    }

    let mut frame = SampledFrame {
        time: t,
        ..Default::default()
    };
    for (id, mut track) in tracks {
        track.sort_by(|a, b| a.time.total_cmp(&b.time));
        let rest = rest_poses.get_or_identity(id);
        match sample_object_track(&track, &rest, t) {
            TrackSample::Pose(pose) => {
                frame.object_poses.insert(id.clone(), pose);
            }
            TrackSample::Rest => frame.at_rest.push(id.clone()),
        }
    }

    let mut camera_track: Track<'_, CameraKeyframe> = doc.camera_keyframes.iter().collect();
    camera_track.sort_by(|a, b| a.time.total_cmp(&b.time));
    frame.camera = sample_camera_track(&camera_track, t);

    frame
}

/// Sample one object track (sorted by time) at `t`
pub fn sample_object_track(track: &[&ObjectKeyframe], rest: &Transform, t: f64) -> TrackSample {
    match segment(track, t) {
        Segment::Before => TrackSample::Rest,
        Segment::Hold(kf) => TrackSample::Pose(ObjectPose::held(rest, kf)),
        Segment::Between(prev, next, u) => {
            TrackSample::Pose(ObjectPose::interpolated(rest, prev, next, u))
        }
    }
}

/// Sample the camera track (sorted by time) at `t`
pub fn sample_camera_track(track: &[&CameraKeyframe], t: f64) -> Option<CameraPose> {
    match segment(track, t) {
        Segment::Before => None,
        Segment::Hold(kf) => Some(kf.pose),
        Segment::Between(prev, next, u) => Some(CameraPose {
            position: prev.pose.position.lerp(next.pose.position, u),
            target: prev.pose.target.lerp(next.pose.target, u),
            zoom: lerp_opt(prev.pose.zoom, next.pose.zoom, u),
        }),
    }
}

enum Segment<'a, K> {
    Before,
    Hold(&'a K),
    /// prev, next, eased progress
    Between(&'a K, &'a K, f64),
}

/// Locate `t` on a sorted track and compute the eased progress
fn segment<'a, K: Timed>(track: &[&'a K], t: f64) -> Segment<'a, K> {
    let split = track.partition_point(|kf| kf.time() <= t);
    let Some(prev) = split.checked_sub(1).map(|i| track[i]) else {
        return Segment::Before;
    };
    let Some(next) = track.get(split).copied() else {
        return Segment::Hold(prev);
    };

    let elapsed = t - prev.time();
    let span = next.time() - prev.time();
    // Exactly on a keyframe, or a degenerate segment from duplicate times
    if elapsed <= 0.0 || !(span > 0.0) {
        return Segment::Hold(prev);
    }

    let u = ease(elapsed / span, next.easing());
    Segment::Between(prev, next, u)
}

/// Helper to interpolate optional values
fn lerp_opt(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + (b - a) * t),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
