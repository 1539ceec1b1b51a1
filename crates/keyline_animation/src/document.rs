//! Step animation document and its JSON wire format
//!
//! One document is authored per assembly step. Loading is deliberately
//! forgiving: missing arrays default to empty, entries that fail to decode are
//! dropped with a warning, and the rest of the document still loads.

use crate::error::DocumentError;
use crate::keyframe::{round_time, CameraKeyframe, ObjectId, ObjectKeyframe};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Duration given to documents that carry neither a duration nor keyframes
pub const DEFAULT_DURATION: f64 = 5.0;

/// An annotation placed in the step (arrow, label, ...).
///
/// Only `id` and `type` are interpreted; every other field is carried
/// through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationInstance {
    /// Object id under which this annotation's keyframes are stored
    pub fn object_id(&self) -> ObjectId {
        ObjectId::annotation(&self.id)
    }

    /// Accept only entries that carry a string `id` and `type`
    fn from_value(value: Value) -> Option<Self> {
        let has_keys = value.get("id").is_some_and(Value::is_string)
            && value.get("type").is_some_and(Value::is_string);
        if !has_keys {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

/// The animation of one step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAnimation {
    /// Length in seconds, always > 0
    pub duration: f64,
    /// `false` marks legacy documents whose keyframes hold absolute poses
    #[serde(default)]
    pub is_offset: bool,
    #[serde(default)]
    pub object_keyframes: Vec<ObjectKeyframe>,
    #[serde(default)]
    pub camera_keyframes: Vec<CameraKeyframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_instances: Option<Vec<AnnotationInstance>>,
}

impl Default for StepAnimation {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl StepAnimation {
    /// Create an empty, offset-form document
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            is_offset: true,
            object_keyframes: Vec::new(),
            camera_keyframes: Vec::new(),
            annotation_instances: None,
        }
    }

    /// Parse a document from JSON text.
    ///
    /// Only text that is not JSON at all, or whose top level is not an
    /// object, is an error.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a document from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(mut fields) = value else {
            return Err(DocumentError::NotAnObject);
        };

        let duration = fields.get("duration").and_then(Value::as_f64);
        let is_offset = fields
            .get("isOffset")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let object_keyframes = decode_entries::<ObjectKeyframe>(
            take_array(&mut fields, "objectKeyframes"),
            "object keyframe",
        )
        .into_iter()
        .filter(|kf| kf.time.is_finite())
        .map(|mut kf| {
            kf.time = round_time(kf.time.max(0.0));
            kf
        })
        .collect::<Vec<_>>();
        let camera_keyframes = decode_entries::<CameraKeyframe>(
            take_array(&mut fields, "cameraKeyframes"),
            "camera keyframe",
        )
        .into_iter()
        .filter(|kf| kf.time.is_finite())
        .map(|mut kf| {
            kf.time = round_time(kf.time.max(0.0));
            kf
        })
        .collect::<Vec<_>>();

        let annotation_instances =
            take_array(&mut fields, "annotationInstances").map(|entries| {
                let total = entries.len();
                let kept: Vec<AnnotationInstance> = entries
                    .into_iter()
                    .filter_map(AnnotationInstance::from_value)
                    .collect();
                if kept.len() < total {
                    tracing::warn!(
                        "dropped {} annotation instance(s) without id/type",
                        total - kept.len()
                    );
                }
                kept
            });

        let mut doc = Self {
            duration: 0.0,
            is_offset,
            object_keyframes,
            camera_keyframes,
            annotation_instances,
        };
        doc.duration = match duration {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => {
                let fallback = doc.last_keyframe_time().unwrap_or(0.0);
                let fallback = if fallback > 0.0 { fallback } else { DEFAULT_DURATION };
                tracing::warn!(
                    "animation duration missing or invalid ({:?}), using {}",
                    duration,
                    fallback
                );
                fallback
            }
        };
        doc.sort_tracks();

        Ok(doc)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Latest keyframe time across all tracks
    pub fn last_keyframe_time(&self) -> Option<f64> {
        self.object_keyframes
            .iter()
            .map(|kf| kf.time)
            .chain(self.camera_keyframes.iter().map(|kf| kf.time))
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
    }

    /// Object ids that own at least one keyframe, in first-seen order
    pub fn tracked_objects(&self) -> Vec<ObjectId> {
        let mut seen = indexmap::IndexSet::new();
        for kf in &self.object_keyframes {
            seen.insert(kf.object_id.clone());
        }
        seen.into_iter().collect()
    }

    /// Keyframes of one object, in time order
    pub fn object_track(&self, object_id: &ObjectId) -> Vec<&ObjectKeyframe> {
        let mut track: Vec<&ObjectKeyframe> = self
            .object_keyframes
            .iter()
            .filter(|kf| &kf.object_id == object_id)
            .collect();
        track.sort_by(|a, b| a.time.total_cmp(&b.time));
        track
    }

    /// Keep both keyframe lists in time order (stable within equal times)
    pub fn sort_tracks(&mut self) {
        self.object_keyframes
            .sort_by(|a, b| a.time.total_cmp(&b.time));
        self.camera_keyframes
            .sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Whether the document holds no keyframes at all
    pub fn is_empty(&self) -> bool {
        self.object_keyframes.is_empty() && self.camera_keyframes.is_empty()
    }
}

/// Remove an array field, treating any other JSON type as absent
fn take_array(fields: &mut Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    match fields.remove(key) {
        Some(Value::Array(entries)) => Some(entries),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::warn!("ignoring {}: expected an array, found {}", key, other);
            None
        }
    }
}

fn decode_entries<T: serde::de::DeserializeOwned>(
    entries: Option<Vec<Value>>,
    what: &str,
) -> Vec<T> {
    let Some(entries) = entries else {
        return Vec::new();
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<T>(entry) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!("dropping {} #{}: {}", what, index, err);
                None
            }
        })
        .collect()
}
