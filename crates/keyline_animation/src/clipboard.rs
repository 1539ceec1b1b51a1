//! Copied keyframe payloads

use crate::easing::Easing;
use crate::keyframe::{CameraKeyframe, ObjectId, ObjectKeyframe, TrackRef};
use crate::math::{Transform, Vec3};
use serde::{Deserialize, Serialize};

/// A keyframe on the clipboard, tagged by the kind of track it came from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClipboardEntry {
    Object {
        #[serde(rename = "objectId")]
        object_id: ObjectId,
        transform: Transform,
        visible: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        easing: Option<Easing>,
    },
    Camera {
        position: Vec3,
        target: Vec3,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        zoom: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        easing: Option<Easing>,
    },
}

impl ClipboardEntry {
    /// Track a paste of this entry lands on
    pub fn track(&self) -> TrackRef {
        match self {
            ClipboardEntry::Object { object_id, .. } => TrackRef::Object(object_id.clone()),
            ClipboardEntry::Camera { .. } => TrackRef::Camera,
        }
    }
}

impl From<&ObjectKeyframe> for ClipboardEntry {
    fn from(kf: &ObjectKeyframe) -> Self {
        ClipboardEntry::Object {
            object_id: kf.object_id.clone(),
            transform: kf.transform,
            visible: kf.visible,
            easing: kf.easing,
        }
    }
}

impl From<&CameraKeyframe> for ClipboardEntry {
    fn from(kf: &CameraKeyframe) -> Self {
        ClipboardEntry::Camera {
            position: kf.pose.position,
            target: kf.pose.target,
            zoom: kf.pose.zoom,
            easing: kf.easing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::CameraPose;

    #[test]
    fn test_tagged_wire_shape() {
        let entry = ClipboardEntry::Object {
            object_id: ObjectId::new("arm"),
            transform: Transform::IDENTITY,
            visible: false,
            easing: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], "object");
        assert_eq!(value["objectId"], "arm");

        let keyframe = CameraKeyframe::new(
            1.0,
            CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO),
        )
        .with_easing(Easing::EaseInSine);
        let camera = ClipboardEntry::from(&keyframe);
        let value = serde_json::to_value(&camera).unwrap();
        assert_eq!(value["kind"], "camera");
        assert_eq!(value["position"]["z"], 3.0);
        let back: ClipboardEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, camera);
        assert_eq!(back.track(), TrackRef::Camera);
    }
}
