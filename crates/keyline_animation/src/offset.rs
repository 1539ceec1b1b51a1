//! Rest poses and offset normalization
//!
//! Keyframes store position and rotation relative to the object's authored
//! rest pose. Legacy documents (`isOffset: false`) hold absolute values and are
//! converted once, against the rest poses captured when the model attached.

use crate::document::StepAnimation;
use crate::keyframe::ObjectId;
use crate::math::Transform;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Rest pose of every attached object, keyed by object id
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestPoses {
    poses: FxHashMap<ObjectId, Transform>,
}

impl RestPoses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object_id: ObjectId, rest: Transform) -> Option<Transform> {
        self.poses.insert(object_id, rest)
    }

    pub fn remove(&mut self, object_id: &ObjectId) -> Option<Transform> {
        self.poses.remove(object_id)
    }

    pub fn get(&self, object_id: &ObjectId) -> Option<&Transform> {
        self.poses.get(object_id)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn clear(&mut self) {
        self.poses.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &Transform)> {
        self.poses.iter()
    }

    /// Rest pose of `object_id`, identity when unknown
    pub fn get_or_identity(&self, object_id: &ObjectId) -> Transform {
        self.poses
            .get(object_id)
            .copied()
            .unwrap_or(Transform::IDENTITY)
    }
}

impl FromIterator<(ObjectId, Transform)> for RestPoses {
    fn from_iter<I: IntoIterator<Item = (ObjectId, Transform)>>(iter: I) -> Self {
        Self {
            poses: iter.into_iter().collect(),
        }
    }
}

/// Absolute pose of an object given its rest pose and a keyframe transform
pub fn apply_offset(rest: &Transform, keyframe: &Transform) -> Transform {
    Transform {
        position: rest.position.add(keyframe.position),
        rotation: rest.rotation.add(keyframe.rotation),
        scale: keyframe.scale,
    }
}

/// Keyframe transform (offset form) of an absolute pose
pub fn offset_from(rest: &Transform, absolute: &Transform) -> Transform {
    Transform {
        position: absolute.position.sub(rest.position),
        rotation: absolute.rotation.sub(rest.rotation),
        scale: absolute.scale,
    }
}

/// Convert a legacy absolute-pose document to offset form.
///
/// No-op when the document is already offset-based or no rest poses are
/// known yet; calling it again on its own output changes nothing. Camera
/// keyframes are never touched.
pub fn normalize(doc: &StepAnimation, rest_poses: &RestPoses) -> StepAnimation {
    if doc.is_offset || rest_poses.is_empty() {
        return doc.clone();
    }

    let mut normalized = doc.clone();
    let mut missing = 0usize;
    for kf in &mut normalized.object_keyframes {
        match rest_poses.get(&kf.object_id) {
            Some(rest) => kf.transform = offset_from(rest, &kf.transform),
            None => missing += 1,
        }
    }
    if missing > 0 {
        tracing::warn!(
            "{} keyframe(s) reference objects without a rest pose; left unchanged",
            missing
        );
    }
    normalized.is_offset = true;

    tracing::debug!(
        "normalized {} object keyframe(s) to offsets",
        normalized.object_keyframes.len()
    );
    normalized
}
