//! Keyframe store
//!
//! Owns the animation document and performs every timeline mutation on it:
//! recording, deleting, moving, duplicating, shifting and pasting keyframes.
//! After each mutation the keyframe lists are re-sorted and times are rounded
//! to milliseconds, so exact-time lookups stay reliable.

use crate::clipboard::ClipboardEntry;
use crate::collision::{resolve_slot, SlotResolution, PROBE_STEP};
use crate::document::StepAnimation;
use crate::easing::Easing;
use crate::error::{Result, StoreError};
use crate::keyframe::{
    round_time, same_time, CameraKeyframe, CameraPose, ObjectId, ObjectKeyframe, TrackRef,
};
use crate::math::Transform;
use smallvec::SmallVec;

type TrackIndices = SmallVec<[usize; 16]>;

/// Timeline mutations over one step animation
#[derive(Clone, Debug)]
pub struct KeyframeStore {
    doc: StepAnimation,
    probe_step: f64,
}

impl Default for KeyframeStore {
    fn default() -> Self {
        Self::new(StepAnimation::default())
    }
}

impl KeyframeStore {
    /// Wrap a document; keyframe lists are sorted on entry
    pub fn new(mut doc: StepAnimation) -> Self {
        doc.sort_tracks();
        Self {
            doc,
            probe_step: PROBE_STEP,
        }
    }

    /// Builder: set the collision probe step (seconds)
    pub fn with_probe_step(mut self, step: f64) -> Self {
        if step > 0.0 && step.is_finite() {
            self.probe_step = step;
        }
        self
    }

    pub fn document(&self) -> &StepAnimation {
        &self.doc
    }

    pub fn into_document(self) -> StepAnimation {
        self.doc
    }

    /// Swap in a whole new document (load, normalization)
    pub fn replace_document(&mut self, mut doc: StepAnimation) {
        doc.sort_tracks();
        self.doc = doc;
    }

    pub fn duration(&self) -> f64 {
        self.doc.duration
    }

    /// Set the duration, never cutting off existing keyframes.
    ///
    /// Returns the duration actually applied.
    pub fn set_duration(&mut self, duration: f64) -> Result<f64> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(StoreError::InvalidDuration(duration));
        }
        let floor = self.doc.last_keyframe_time().unwrap_or(0.0);
        self.doc.duration = round_time(duration.max(floor));
        Ok(self.doc.duration)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Times of all keyframes on a track, ascending
    pub fn track_times(&self, track: &TrackRef) -> Vec<f64> {
        self.track_indices(track)
            .into_iter()
            .map(|i| self.time_at(track, i))
            .collect()
    }

    /// Object ids that own at least one keyframe
    pub fn tracked_objects(&self) -> Vec<ObjectId> {
        self.doc.tracked_objects()
    }

    /// Object keyframe at a (rounded) time
    pub fn object_keyframe(&self, object_id: &ObjectId, time: f64) -> Option<&ObjectKeyframe> {
        self.doc
            .object_keyframes
            .iter()
            .find(|kf| &kf.object_id == object_id && same_time(kf.time, time))
    }

    /// Camera keyframe at a (rounded) time
    pub fn camera_keyframe(&self, time: f64) -> Option<&CameraKeyframe> {
        self.doc
            .camera_keyframes
            .iter()
            .find(|kf| same_time(kf.time, time))
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Record an object keyframe; an existing keyframe at the same instant is
    /// overwritten and keeps its easing.
    ///
    /// Returns the rounded time the keyframe was stored at.
    pub fn record_object_keyframe(
        &mut self,
        object_id: ObjectId,
        time: f64,
        transform: Transform,
        visible: bool,
    ) -> Result<f64> {
        let time = checked_time(time)?;
        if !transform.is_valid() {
            return Err(StoreError::InvalidTransform(object_id.to_string()));
        }

        if let Some(existing) = self
            .doc
            .object_keyframes
            .iter_mut()
            .find(|kf| kf.object_id == object_id && same_time(kf.time, time))
        {
            existing.transform = transform;
            existing.visible = visible;
            tracing::debug!("replaced keyframe of {} at {}s", object_id, time);
        } else {
            tracing::debug!("recorded keyframe of {} at {}s", object_id, time);
            self.doc.object_keyframes.push(
                ObjectKeyframe::new(time, object_id, transform).with_visible(visible),
            );
        }

        self.grow_duration_to(time);
        self.doc.sort_tracks();
        Ok(time)
    }

    /// Record a camera keyframe; last write wins at a given instant
    pub fn record_camera_keyframe(&mut self, time: f64, pose: CameraPose) -> Result<f64> {
        let time = checked_time(time)?;

        if let Some(existing) = self
            .doc
            .camera_keyframes
            .iter_mut()
            .find(|kf| same_time(kf.time, time))
        {
            existing.pose = pose;
            tracing::debug!("replaced camera keyframe at {}s", time);
        } else {
            tracing::debug!("recorded camera keyframe at {}s", time);
            self.doc
                .camera_keyframes
                .push(CameraKeyframe::new(time, pose));
        }

        self.grow_duration_to(time);
        self.doc.sort_tracks();
        Ok(time)
    }

    /// Set (or clear) the easing of the keyframe at `time`
    pub fn set_easing(
        &mut self,
        track: &TrackRef,
        time: f64,
        easing: Option<Easing>,
    ) -> Result<()> {
        let index = self.find(track, time).ok_or_else(|| not_found(track, time))?;
        match track {
            TrackRef::Object(_) => self.doc.object_keyframes[index].easing = easing,
            TrackRef::Camera => self.doc.camera_keyframes[index].easing = easing,
        }
        Ok(())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete the keyframe at `time`; returns whether one was removed
    pub fn delete_at(&mut self, track: &TrackRef, time: f64) -> bool {
        let Some(index) = self.find(track, time) else {
            return false;
        };
        match track {
            TrackRef::Object(_) => {
                self.doc.object_keyframes.remove(index);
            }
            TrackRef::Camera => {
                self.doc.camera_keyframes.remove(index);
            }
        }
        tracing::debug!("deleted keyframe at {}s on {}", time, track);
        true
    }

    /// Delete every keyframe of a track; returns how many were removed
    pub fn delete_all_for(&mut self, track: &TrackRef) -> usize {
        let removed = match track {
            TrackRef::Object(id) => {
                let before = self.doc.object_keyframes.len();
                self.doc.object_keyframes.retain(|kf| &kf.object_id != id);
                before - self.doc.object_keyframes.len()
            }
            TrackRef::Camera => {
                let removed = self.doc.camera_keyframes.len();
                self.doc.camera_keyframes.clear();
                removed
            }
        };
        tracing::debug!("cleared {} keyframe(s) from {}", removed, track);
        removed
    }

    // =========================================================================
    // Timeline edits with collision resolution
    // =========================================================================

    /// Move the keyframe at `old_time` to (near) `new_time`.
    ///
    /// The target is clamped to `[0, duration]`, then moved to the nearest
    /// free slot if another keyframe already occupies it.
    pub fn move_keyframe(
        &mut self,
        track: &TrackRef,
        old_time: f64,
        new_time: f64,
    ) -> Result<SlotResolution> {
        let new_time = checked_time(new_time)?;
        let index = self
            .find(track, old_time)
            .ok_or_else(|| not_found(track, old_time))?;

        let desired = new_time.min(self.doc.duration);
        let others: SmallVec<[f64; 16]> = self
            .track_indices(track)
            .into_iter()
            .filter(|i| *i != index)
            .map(|i| self.time_at(track, i))
            .collect();
        let resolution = resolve_slot(desired, self.doc.duration, self.probe_step, |t| {
            others.iter().any(|o| same_time(*o, t))
        });

        self.set_time_at(track, index, resolution.time);
        self.doc.sort_tracks();
        tracing::debug!(
            "moved keyframe on {} from {}s to {}s",
            track,
            old_time,
            resolution.time
        );
        Ok(resolution)
    }

    /// Copy the keyframe at `source_time` to (near) `new_time` on the same track
    pub fn duplicate_keyframe(
        &mut self,
        track: &TrackRef,
        source_time: f64,
        new_time: f64,
    ) -> Result<SlotResolution> {
        let entry = self
            .copy(track, source_time)
            .ok_or_else(|| not_found(track, source_time))?;
        self.paste(&entry, new_time)
    }

    /// Shift every keyframe by `delta` seconds, clamping at 0.
    ///
    /// The duration grows to fit keyframes pushed past the end; it never
    /// shrinks here.
    pub fn shift_all(&mut self, delta: f64) {
        if !delta.is_finite() || delta == 0.0 {
            return;
        }
        for kf in &mut self.doc.object_keyframes {
            kf.time = round_time((kf.time + delta).max(0.0));
        }
        for kf in &mut self.doc.camera_keyframes {
            kf.time = round_time((kf.time + delta).max(0.0));
        }
        if let Some(last) = self.doc.last_keyframe_time() {
            self.grow_duration_to(last);
        }
        self.doc.sort_tracks();
        tracing::debug!("shifted all keyframes by {}s", delta);
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Copy the keyframe at `time`
    pub fn copy(&self, track: &TrackRef, time: f64) -> Option<ClipboardEntry> {
        let index = self.find(track, time)?;
        Some(match track {
            TrackRef::Object(_) => ClipboardEntry::from(&self.doc.object_keyframes[index]),
            TrackRef::Camera => ClipboardEntry::from(&self.doc.camera_keyframes[index]),
        })
    }

    /// Paste a copied keyframe at (near) `time` on its own track
    pub fn paste(&mut self, entry: &ClipboardEntry, time: f64) -> Result<SlotResolution> {
        let time = checked_time(time)?;
        let track = entry.track();
        let desired = time.min(self.doc.duration);
        let occupied = self.track_times(&track);
        let resolution = resolve_slot(desired, self.doc.duration, self.probe_step, |t| {
            occupied.iter().any(|o| same_time(*o, t))
        });

        match entry {
            ClipboardEntry::Object {
                object_id,
                transform,
                visible,
                easing,
            } => {
                let mut kf = ObjectKeyframe::new(resolution.time, object_id.clone(), *transform)
                    .with_visible(*visible);
                kf.easing = *easing;
                self.doc.object_keyframes.push(kf);
            }
            ClipboardEntry::Camera {
                position,
                target,
                zoom,
                easing,
            } => {
                let pose = CameraPose {
                    position: *position,
                    target: *target,
                    zoom: *zoom,
                };
                let mut kf = CameraKeyframe::new(resolution.time, pose);
                kf.easing = *easing;
                self.doc.camera_keyframes.push(kf);
            }
        }

        self.doc.sort_tracks();
        tracing::debug!("pasted keyframe on {} at {}s", track, resolution.time);
        Ok(resolution)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn track_indices(&self, track: &TrackRef) -> TrackIndices {
        match track {
            TrackRef::Object(id) => self
                .doc
                .object_keyframes
                .iter()
                .enumerate()
                .filter(|(_, kf)| &kf.object_id == id)
                .map(|(i, _)| i)
                .collect(),
            TrackRef::Camera => (0..self.doc.camera_keyframes.len()).collect(),
        }
    }

    fn time_at(&self, track: &TrackRef, index: usize) -> f64 {
        match track {
            TrackRef::Object(_) => self.doc.object_keyframes[index].time,
            TrackRef::Camera => self.doc.camera_keyframes[index].time,
        }
    }

    fn set_time_at(&mut self, track: &TrackRef, index: usize, time: f64) {
        match track {
            TrackRef::Object(_) => self.doc.object_keyframes[index].time = time,
            TrackRef::Camera => self.doc.camera_keyframes[index].time = time,
        }
    }

    fn find(&self, track: &TrackRef, time: f64) -> Option<usize> {
        self.track_indices(track)
            .into_iter()
            .find(|i| same_time(self.time_at(track, *i), time))
    }

    fn grow_duration_to(&mut self, time: f64) {
        if time > self.doc.duration {
            self.doc.duration = round_time(time);
        }
    }
}

fn checked_time(time: f64) -> Result<f64> {
    if !time.is_finite() {
        return Err(StoreError::InvalidTime(time));
    }
    Ok(round_time(time.max(0.0)))
}

fn not_found(track: &TrackRef, time: f64) -> StoreError {
    StoreError::KeyframeNotFound {
        track: track.clone(),
        time,
    }
}
