//! Keyframe data model
//!
//! Object keyframes animate one tracked object; camera keyframes animate the
//! single camera track. Both are plain data that serialize straight into the
//! step animation wire format.

use crate::easing::Easing;
use crate::math::{Transform, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision of keyframe times: three decimals (milliseconds)
pub const TIME_SCALE: f64 = 1000.0;

/// Round a time to three decimal places
pub fn round_time(time: f64) -> f64 {
    (time * TIME_SCALE).round() / TIME_SCALE
}

/// Integer millisecond key of a time, used for exact-match lookups
pub fn time_key(time: f64) -> i64 {
    (time * TIME_SCALE).round() as i64
}

/// Whether two times land on the same rounded instant
pub fn same_time(a: f64, b: f64) -> bool {
    time_key(a) == time_key(b)
}

/// Stable, path-like identifier of an animated object.
///
/// Ids are built from the object's position in its model hierarchy
/// (`"gearbox/housing/bolt_03"`) or from an annotation id
/// (`"annotation:arrow-1"`), never from an in-memory handle, so saved
/// animations reattach to a freshly loaded model.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Separator between path segments
    pub const SEPARATOR: char = '/';
    /// Prefix of annotation object ids
    pub const ANNOTATION_PREFIX: &'static str = "annotation:";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an id from hierarchy segments, root first
    pub fn from_path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Id of an annotation instance
    pub fn annotation(annotation_id: &str) -> Self {
        Self(format!("{}{}", Self::ANNOTATION_PREFIX, annotation_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_annotation(&self) -> bool {
        self.0.starts_with(Self::ANNOTATION_PREFIX)
    }

    /// Id of the enclosing object, if any
    pub fn parent(&self) -> Option<ObjectId> {
        self.0
            .rfind(Self::SEPARATOR)
            .map(|idx| ObjectId(self.0[..idx].to_string()))
    }

    /// Whether `self` encloses `other` (strictly)
    pub fn is_ancestor_of(&self, other: &ObjectId) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0[self.0.len()..].starts_with(Self::SEPARATOR)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

fn default_visible() -> bool {
    true
}

/// A keyframe on an object track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectKeyframe {
    /// Time in seconds
    pub time: f64,
    pub object_id: ObjectId,
    /// Offset position/rotation plus absolute scale
    pub transform: Transform,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Easing to use when transitioning TO this keyframe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
}

impl ObjectKeyframe {
    pub fn new(time: f64, object_id: ObjectId, transform: Transform) -> Self {
        Self {
            time: round_time(time),
            object_id,
            transform,
            visible: true,
            easing: None,
        }
    }

    /// Builder: set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Builder: set easing
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }
}

/// Absolute camera placement
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl CameraPose {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            zoom: None,
        }
    }

    /// Builder: set zoom
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }
}

/// A keyframe on the camera track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraKeyframe {
    /// Time in seconds
    pub time: f64,
    #[serde(flatten)]
    pub pose: CameraPose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
}

impl CameraKeyframe {
    pub fn new(time: f64, pose: CameraPose) -> Self {
        Self {
            time: round_time(time),
            pose,
            easing: None,
        }
    }

    /// Builder: set easing
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }
}

/// Address of a track: one object, or the camera
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "objectId", rename_all = "lowercase")]
pub enum TrackRef {
    Object(ObjectId),
    Camera,
}

impl TrackRef {
    pub fn object(id: impl Into<ObjectId>) -> Self {
        TrackRef::Object(id.into())
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackRef::Object(id) => write!(f, "object track {}", id),
            TrackRef::Camera => f.write_str("camera track"),
        }
    }
}

/// The keyframe highlighted in the timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub track: TrackRef,
    pub time: f64,
}

/// Time and easing, the parts every keyframe kind shares
pub trait Timed {
    fn time(&self) -> f64;
    fn easing(&self) -> Option<Easing>;
}

impl Timed for ObjectKeyframe {
    fn time(&self) -> f64 {
        self.time
    }

    fn easing(&self) -> Option<Easing> {
        self.easing
    }
}

impl Timed for CameraKeyframe {
    fn time(&self) -> f64 {
        self.time
    }

    fn easing(&self) -> Option<Easing> {
        self.easing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_time() {
        assert_eq!(round_time(0.1 + 0.2), 0.3);
        assert_eq!(round_time(1.23456), 1.235);
        assert!(same_time(2.0004, 2.0));
        assert!(!same_time(2.001, 2.0));
    }

    #[test]
    fn test_object_id_paths() {
        let id = ObjectId::from_path(["gearbox", "housing", "bolt_03"]);
        assert_eq!(id.as_str(), "gearbox/housing/bolt_03");
        assert_eq!(id.parent(), Some(ObjectId::new("gearbox/housing")));

        let root = ObjectId::new("gearbox");
        assert!(root.is_ancestor_of(&id));
        assert!(!id.is_ancestor_of(&root));
        assert!(!ObjectId::new("gear").is_ancestor_of(&id));
        assert!(ObjectId::annotation("arrow-1").is_annotation());
    }

    #[test]
    fn test_object_keyframe_wire_shape() {
        let json = r#"{
            "time": 1.5,
            "objectId": "a/b",
            "transform": {
                "position": {"x": 1, "y": 0, "z": 0},
                "rotation": {"x": 0, "y": 0, "z": 0},
                "scale": {"x": 1, "y": 1, "z": 1}
            },
            "easing": "easeOutQuad"
        }"#;
        let kf: ObjectKeyframe = serde_json::from_str(json).unwrap();
        assert_eq!(kf.object_id, ObjectId::new("a/b"));
        assert!(kf.visible);
        assert_eq!(kf.easing, Some(Easing::EaseOutQuad));

        let value = serde_json::to_value(&kf).unwrap();
        assert_eq!(value["objectId"], "a/b");
        assert_eq!(value["easing"], "easeOutQuad");
    }

    #[test]
    fn test_camera_keyframe_is_flat_on_the_wire() {
        let kf = CameraKeyframe::new(
            2.0,
            CameraPose::new(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO).with_zoom(1.5),
        );
        let value = serde_json::to_value(&kf).unwrap();
        assert_eq!(value["position"]["y"], 5.0);
        assert_eq!(value["target"]["x"], 0.0);
        assert_eq!(value["zoom"], 1.5);
        assert!(value.get("easing").is_none());
    }
}
