//! Authoring session
//!
//! The single entry point an editor drives. A session owns the keyframe
//! store of the step being edited together with everything around it: the
//! undo history, the registry of attached scene objects and their rest poses,
//! the clipboard, the keyframe selection and the playback engine.
//!
//! Every mutating action captures an [`EditorSnapshot`] before touching the
//! store; the snapshot is committed to history only when the action actually
//! changed something.

use crate::clipboard::ClipboardEntry;
use crate::clock::AudioClock;
use crate::collision::SlotResolution;
use crate::config::EngineConfig;
use crate::document::StepAnimation;
use crate::easing::Easing;
use crate::error::Result;
use crate::history::{EditorSnapshot, HistoryManager};
use crate::keyframe::{round_time, CameraPose, ObjectId, Selection, TrackRef};
use crate::math::Transform;
use crate::offset::{normalize, offset_from};
use crate::persistence::{self, AnimationRepository, StepKey};
use crate::playback::{CameraController, PlaybackEngine, SceneTarget};
use crate::registry::{ObjectKey, ObjectRegistry};
use crate::resolver::{sample, SampledFrame};
use crate::store::KeyframeStore;

/// Editing state of one step animation
#[derive(Debug)]
pub struct AuthoringSession {
    store: KeyframeStore,
    history: HistoryManager<EditorSnapshot>,
    registry: ObjectRegistry,
    clipboard: Option<ClipboardEntry>,
    selection: Option<Selection>,
    playback: PlaybackEngine,
}

impl Default for AuthoringSession {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl AuthoringSession {
    pub fn new(config: &EngineConfig) -> Self {
        let store = KeyframeStore::default().with_probe_step(config.timeline.probe_step);
        let clock = config.playback_clock(store.duration());
        Self {
            store,
            history: HistoryManager::new(config.history.capacity),
            registry: ObjectRegistry::new(),
            clipboard: None,
            selection: None,
            playback: PlaybackEngine::new(clock),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn document(&self) -> &StepAnimation {
        self.store.document()
    }

    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager<EditorSnapshot> {
        &self.history
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn playback(&self) -> &PlaybackEngine {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.playback
    }

    pub fn clipboard(&self) -> Option<&ClipboardEntry> {
        self.clipboard.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.playback.clock().current_time()
    }

    /// Move the playhead (clamped to the step)
    pub fn set_current_time(&mut self, time: f64) {
        self.playback.clock_mut().seek(time);
    }

    /// Select the keyframe at `time` on `track`, if there is one
    pub fn select(&mut self, track: TrackRef, time: f64) -> bool {
        if self.store.track_times(&track).is_empty() {
            return false;
        }
        let found = match &track {
            TrackRef::Object(id) => self.store.object_keyframe(id, time).is_some(),
            TrackRef::Camera => self.store.camera_keyframe(time).is_some(),
        };
        if found {
            self.selection = Some(Selection {
                track,
                time: round_time(time),
            });
        }
        found
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // =========================================================================
    // Loading and scene attachment
    // =========================================================================

    /// Start editing `doc`, dropping history, selection and playhead.
    ///
    /// Legacy absolute-pose documents are converted right away when rest
    /// poses are already known; otherwise conversion waits for
    /// [`attach_objects`](Self::attach_objects).
    pub fn load(&mut self, doc: StepAnimation) {
        let doc = normalize(&doc, self.registry.rest_poses());
        self.store.replace_document(doc);
        self.history.clear();
        self.selection = None;
        self.sync_clock();
        self.playback.clock_mut().reset();
        tracing::debug!(
            "loaded step animation: {} object keyframe(s), {} camera keyframe(s)",
            self.document().object_keyframes.len(),
            self.document().camera_keyframes.len()
        );
    }

    /// Load the stored animation of `key`, or start an empty one
    pub fn load_from(
        &mut self,
        repo: &dyn AnimationRepository,
        key: &StepKey,
    ) -> persistence::Result<bool> {
        match repo.load(key)? {
            Some(doc) => {
                self.load(doc);
                Ok(true)
            }
            None => {
                self.load(StepAnimation::default());
                Ok(false)
            }
        }
    }

    /// Persist the current document; the in-memory state is untouched
    pub fn save_to(
        &self,
        repo: &mut dyn AnimationRepository,
        key: &StepKey,
    ) -> persistence::Result<()> {
        repo.save(key, self.store.document())
    }

    /// Attach one scene object with its rest pose.
    ///
    /// Call [`ensure_normalized`](Self::ensure_normalized) once the whole
    /// model is attached.
    pub fn attach_object(&mut self, id: ObjectId, rest: Transform) -> ObjectKey {
        self.registry.attach(id, rest)
    }

    /// Attach a whole model, then convert a legacy document to offsets
    pub fn attach_objects<I>(&mut self, objects: I) -> Vec<ObjectKey>
    where
        I: IntoIterator<Item = (ObjectId, Transform)>,
    {
        let keys = objects
            .into_iter()
            .map(|(id, rest)| self.registry.attach(id, rest))
            .collect();
        self.ensure_normalized();
        keys
    }

    /// Detach an object and everything nested under it
    pub fn detach_object(&mut self, id: &ObjectId) -> usize {
        self.registry.detach_subtree(id)
    }

    /// Convert a legacy document against the attached rest poses.
    ///
    /// Returns whether a conversion happened. Not recorded in history.
    pub fn ensure_normalized(&mut self) -> bool {
        let doc = self.store.document();
        if doc.is_offset || self.registry.is_empty() {
            return false;
        }
        let normalized = normalize(doc, self.registry.rest_poses());
        self.store.replace_document(normalized);
        true
    }

    // =========================================================================
    // Edits (each undoable)
    // =========================================================================

    /// Record an object keyframe from an offset transform
    pub fn record_object_keyframe(
        &mut self,
        object_id: ObjectId,
        time: f64,
        transform: Transform,
        visible: bool,
    ) -> Result<f64> {
        let time = self.edit(|store| {
            store
                .record_object_keyframe(object_id.clone(), time, transform, visible)
                .map(Some)
        })?;
        let time = time.unwrap_or_default();
        self.selection = Some(Selection {
            track: TrackRef::Object(object_id),
            time,
        });
        Ok(time)
    }

    /// Record an object keyframe from the object's absolute scene pose
    pub fn record_object_pose(
        &mut self,
        object_id: ObjectId,
        time: f64,
        absolute: Transform,
        visible: bool,
    ) -> Result<f64> {
        let rest = self.registry.rest_poses().get_or_identity(&object_id);
        self.record_object_keyframe(object_id, time, offset_from(&rest, &absolute), visible)
    }

    /// Record a camera keyframe
    pub fn record_camera_keyframe(&mut self, time: f64, pose: CameraPose) -> Result<f64> {
        let time = self
            .edit(|store| store.record_camera_keyframe(time, pose).map(Some))?
            .unwrap_or_default();
        self.selection = Some(Selection {
            track: TrackRef::Camera,
            time,
        });
        Ok(time)
    }

    /// Record the camera's current placement at the playhead
    pub fn record_camera_from(&mut self, camera: &dyn CameraController) -> Result<f64> {
        let time = self.current_time();
        self.record_camera_keyframe(time, camera.camera_pose())
    }

    pub fn set_easing(&mut self, track: &TrackRef, time: f64, easing: Option<Easing>) -> Result<()> {
        self.edit(|store| store.set_easing(track, time, easing).map(Some))?;
        Ok(())
    }

    /// Delete one keyframe; returns whether one was removed
    pub fn delete_keyframe(&mut self, track: &TrackRef, time: f64) -> bool {
        let removed = self
            .edit(|store| Ok(store.delete_at(track, time).then_some(())))
            .ok()
            .flatten()
            .is_some();
        if removed && self.selection_is(track, time) {
            self.selection = None;
        }
        removed
    }

    /// Delete the selected keyframe
    pub fn delete_selected(&mut self) -> bool {
        match self.selection.clone() {
            Some(sel) => self.delete_keyframe(&sel.track, sel.time),
            None => false,
        }
    }

    /// Delete a whole track
    pub fn delete_track(&mut self, track: &TrackRef) -> usize {
        let removed = self
            .edit(|store| {
                let n = store.delete_all_for(track);
                Ok((n > 0).then_some(n))
            })
            .ok()
            .flatten()
            .unwrap_or(0);
        if removed > 0 && self.selection.as_ref().is_some_and(|s| &s.track == track) {
            self.selection = None;
        }
        removed
    }

    /// Move a keyframe; the selection follows it
    pub fn move_keyframe(
        &mut self,
        track: &TrackRef,
        old_time: f64,
        new_time: f64,
    ) -> Result<SlotResolution> {
        let resolution = self
            .edit(|store| store.move_keyframe(track, old_time, new_time).map(Some))?
            .unwrap_or_else(|| SlotResolution::free(old_time));
        if self.selection_is(track, old_time) {
            self.selection = Some(Selection {
                track: track.clone(),
                time: resolution.time,
            });
        }
        Ok(resolution)
    }

    /// Duplicate a keyframe onto the same track and select the copy
    pub fn duplicate_keyframe(
        &mut self,
        track: &TrackRef,
        source_time: f64,
        new_time: f64,
    ) -> Result<SlotResolution> {
        let resolution = self
            .edit(|store| store.duplicate_keyframe(track, source_time, new_time).map(Some))?
            .unwrap_or_else(|| SlotResolution::free(source_time));
        self.selection = Some(Selection {
            track: track.clone(),
            time: resolution.time,
        });
        Ok(resolution)
    }

    /// Shift every keyframe by `delta` seconds
    pub fn shift_all(&mut self, delta: f64) {
        let changed = self.edit(|store| {
            if !delta.is_finite() || delta == 0.0 || store.document().is_empty() {
                return Ok(None);
            }
            store.shift_all(delta);
            Ok(Some(()))
        });
        if let (Ok(Some(())), Some(sel)) = (changed, self.selection.as_mut()) {
            sel.time = round_time((sel.time + delta).max(0.0));
        }
    }

    /// Change the step duration (never below the last keyframe)
    pub fn set_duration(&mut self, duration: f64) -> Result<f64> {
        let current = self.store.duration();
        let applied = self
            .edit(|store| {
                let applied = store.set_duration(duration)?;
                Ok((applied != current).then_some(applied))
            })?
            .unwrap_or(current);
        Ok(applied)
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Copy a keyframe to the clipboard
    pub fn copy(&mut self, track: &TrackRef, time: f64) -> bool {
        match self.store.copy(track, time) {
            Some(entry) => {
                self.clipboard = Some(entry);
                true
            }
            None => false,
        }
    }

    /// Copy the selected keyframe
    pub fn copy_selected(&mut self) -> bool {
        match self.selection.clone() {
            Some(sel) => self.copy(&sel.track, sel.time),
            None => false,
        }
    }

    /// Paste the clipboard at `time`; `Ok(None)` when the clipboard is empty
    pub fn paste(&mut self, time: f64) -> Result<Option<SlotResolution>> {
        let Some(entry) = self.clipboard.clone() else {
            return Ok(None);
        };
        let resolution = self.edit(|store| store.paste(&entry, time).map(Some))?;
        if let Some(resolution) = resolution {
            self.selection = Some(Selection {
                track: entry.track(),
                time: resolution.time,
            });
        }
        Ok(resolution)
    }

    /// Paste the clipboard at the playhead
    pub fn paste_at_playhead(&mut self) -> Result<Option<SlotResolution>> {
        self.paste(self.current_time())
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.restore(previous);
        self.history.finish_restore();
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.restore(next);
        self.history.finish_restore();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Sample the document at the playhead without touching the scene
    pub fn sample_current(&self) -> SampledFrame {
        sample(
            self.store.document(),
            self.registry.rest_poses(),
            self.current_time(),
        )
    }

    /// Advance the clock and push the new frame into the scene
    pub fn tick(
        &mut self,
        dt: f64,
        audio: Option<&dyn AudioClock>,
        scene: &mut dyn SceneTarget,
        camera: Option<&mut dyn CameraController>,
    ) -> &SampledFrame {
        self.playback.step(
            dt,
            audio,
            self.store.document(),
            self.registry.rest_poses(),
            scene,
            camera,
        )
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Current state as a history snapshot
    fn snapshot(&self) -> EditorSnapshot {
        let doc = self.store.document();
        EditorSnapshot {
            object_keyframes: doc.object_keyframes.clone(),
            camera_keyframes: doc.camera_keyframes.clone(),
            duration: doc.duration,
            selection: self.selection.clone(),
            current_time: self.current_time(),
        }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        let mut doc = self.store.document().clone();
        doc.object_keyframes = snapshot.object_keyframes;
        doc.camera_keyframes = snapshot.camera_keyframes;
        doc.duration = snapshot.duration;
        self.store.replace_document(doc);

        self.selection = snapshot.selection;
        self.sync_clock();
        self.playback.clock_mut().seek(snapshot.current_time);
    }

    /// Run a store mutation, committing the prior state to history when
    /// the mutation reports a change (`Ok(Some(_))`)
    fn edit<T>(
        &mut self,
        op: impl FnOnce(&mut KeyframeStore) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let before = self.snapshot();
        let outcome = op(&mut self.store)?;
        if outcome.is_some() {
            self.history.begin_edit(before);
            self.sync_clock();
        }
        Ok(outcome)
    }

    fn sync_clock(&mut self) {
        let duration = self.store.duration();
        self.playback.clock_mut().set_duration(duration);
    }

    fn selection_is(&self, track: &TrackRef, time: f64) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|s| &s.track == track && crate::keyframe::same_time(s.time, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn arm() -> ObjectId {
        ObjectId::new("model/arm")
    }

    fn at(x: f64) -> Transform {
        Transform::IDENTITY.with_position(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_record_then_undo_redo() {
        let mut session = AuthoringSession::default();
        session.record_object_keyframe(arm(), 1.0, at(1.0), true).unwrap();
        session.record_object_keyframe(arm(), 2.0, at(2.0), true).unwrap();
        assert_eq!(session.document().object_keyframes.len(), 2);

        assert!(session.undo());
        assert_eq!(session.document().object_keyframes.len(), 1);
        assert!(session.undo());
        assert!(session.document().object_keyframes.is_empty());
        assert!(!session.undo());

        assert!(session.redo());
        assert!(session.redo());
        assert_eq!(session.document().object_keyframes.len(), 2);
        assert!(!session.redo());
    }

    #[test]
    fn test_failed_edit_leaves_no_history() {
        let mut session = AuthoringSession::default();
        assert!(session
            .record_object_keyframe(arm(), f64::NAN, at(0.0), true)
            .is_err());
        assert!(!session.delete_keyframe(&TrackRef::Camera, 1.0));
        session.shift_all(0.5);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_selection_follows_move() {
        let mut session = AuthoringSession::default();
        session.record_object_keyframe(arm(), 1.0, at(0.0), true).unwrap();
        let track = TrackRef::Object(arm());

        let resolution = session.move_keyframe(&track, 1.0, 2.5).unwrap();
        assert_eq!(resolution.time, 2.5);
        assert_eq!(session.selection().unwrap().time, 2.5);
    }

    #[test]
    fn test_copy_paste_selects_copy() {
        let mut session = AuthoringSession::default();
        session.record_object_keyframe(arm(), 1.0, at(3.0), false).unwrap();
        assert!(session.copy_selected());

        let resolution = session.paste(1.0).unwrap().unwrap();
        assert_eq!(resolution.time, 1.01);
        assert_eq!(session.selection().unwrap().time, 1.01);
        let pasted = session.store().object_keyframe(&arm(), 1.01).unwrap();
        assert!(!pasted.visible);
        assert_eq!(pasted.transform.position.x, 3.0);
    }

    #[test]
    fn test_paste_with_empty_clipboard() {
        let mut session = AuthoringSession::default();
        assert_eq!(session.paste(0.0).unwrap(), None);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_legacy_document_normalized_on_attach() {
        let mut legacy = StepAnimation::new(2.0);
        legacy.is_offset = false;
        legacy
            .object_keyframes
            .push(crate::keyframe::ObjectKeyframe::new(0.0, arm(), at(5.0)));

        let mut session = AuthoringSession::default();
        session.load(legacy);
        assert!(!session.document().is_offset);

        session.attach_objects([(arm(), at(4.0))]);
        assert!(session.document().is_offset);
        assert_eq!(session.document().object_keyframes[0].transform.position.x, 1.0);
        assert!(!session.ensure_normalized());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_record_pose_stores_offset() {
        let mut session = AuthoringSession::default();
        session.attach_objects([(arm(), at(10.0))]);
        session.record_object_pose(arm(), 0.5, at(12.0), true).unwrap();
        let kf = session.store().object_keyframe(&arm(), 0.5).unwrap();
        assert_eq!(kf.transform.position.x, 2.0);

        session.set_current_time(0.5);
        let frame = session.sample_current();
        assert_eq!(frame.object_poses[&arm()].position.x, 12.0);
    }

    #[test]
    fn test_undo_restores_playhead_and_duration() {
        let mut session = AuthoringSession::default();
        session.set_current_time(1.0);
        session.record_object_keyframe(arm(), 1.0, at(0.0), true).unwrap();
        session.record_object_keyframe(arm(), 8.0, at(0.0), true).unwrap();
        assert_eq!(session.document().duration, 8.0);

        session.set_current_time(7.0);
        assert!(session.undo());
        assert_eq!(session.document().duration, 5.0);
        assert_eq!(session.current_time(), 1.0);
    }

    #[test]
    fn test_undo_redo_restores_selection() {
        let mut session = AuthoringSession::default();
        session.set_current_time(0.5);
        session.record_object_keyframe(arm(), 1.0, at(0.0), true).unwrap();
        let selected = session.selection().cloned();
        assert_eq!(
            selected,
            Some(Selection {
                track: TrackRef::Object(arm()),
                time: 1.0,
            })
        );

        assert!(session.undo());
        assert_eq!(session.selection(), None);
        assert!(session.redo());
        assert_eq!(session.selection().cloned(), selected);
        assert_eq!(session.current_time(), 0.5);
    }

    #[test]
    fn test_undo_keeps_selected_track() {
        let mut session = AuthoringSession::default();
        let pose = CameraPose::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        session.record_camera_keyframe(2.0, pose).unwrap();
        session.record_object_keyframe(arm(), 2.0, at(1.0), true).unwrap();
        session.record_camera_keyframe(1.0, pose).unwrap();

        assert!(session.undo());
        assert_eq!(
            session.selection(),
            Some(&Selection {
                track: TrackRef::Object(arm()),
                time: 2.0,
            })
        );

        assert!(session.delete_selected());
        assert!(session.store().object_keyframe(&arm(), 2.0).is_none());
        assert_eq!(session.store().track_times(&TrackRef::Camera), vec![2.0]);
    }

    #[test]
    fn test_unchanged_duration_leaves_no_history() {
        let mut session = AuthoringSession::default();
        let duration = session.document().duration;
        assert_eq!(session.set_duration(duration).unwrap(), duration);
        assert!(!session.can_undo());

        assert_eq!(session.set_duration(duration + 3.0).unwrap(), duration + 3.0);
        assert!(session.can_undo());
        assert!(session.undo());
        assert_eq!(session.document().duration, duration);
    }
}
