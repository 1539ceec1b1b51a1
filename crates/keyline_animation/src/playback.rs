//! Playback engine
//!
//! Connects a [`PlaybackClock`] to the renderer: every frame the clock is
//! advanced from its active source, the document is sampled at the new time
//! and the resulting poses are pushed into a [`SceneTarget`] and, when one is
//! attached, a [`CameraController`].

use crate::clock::{AudioClock, ClockSource, PlaybackClock};
use crate::document::StepAnimation;
use crate::keyframe::{CameraPose, ObjectId};
use crate::math::Transform;
use crate::offset::RestPoses;
use crate::resolver::{sample, ObjectPose, SampledFrame};

/// The viewer camera
pub trait CameraController {
    /// Current placement, used when recording camera keyframes
    fn camera_pose(&self) -> CameraPose;

    /// Move the camera
    fn apply_camera_pose(&mut self, pose: &CameraPose);
}

/// Scene objects driven by the animation
pub trait SceneTarget {
    /// Place an animated object
    fn apply_pose(&mut self, object_id: &ObjectId, pose: &ObjectPose);

    /// Put an object whose track has not started back at its rest pose
    fn reset_to_rest(&mut self, object_id: &ObjectId, rest: &Transform);
}

/// Clock-driven sampler feeding a scene
#[derive(Debug, Default)]
pub struct PlaybackEngine {
    clock: PlaybackClock,
    last_frame: Option<SampledFrame>,
}

impl PlaybackEngine {
    pub fn new(clock: PlaybackClock) -> Self {
        Self {
            clock,
            last_frame: None,
        }
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// Most recently rendered frame
    pub fn last_frame(&self) -> Option<&SampledFrame> {
        self.last_frame.as_ref()
    }

    /// Advance the clock from its active source and return the new time.
    ///
    /// With the internal source `dt` is used; with the audio source the
    /// audio position is read instead and `dt` is ignored.
    pub fn advance(&mut self, dt: f64, audio: Option<&dyn AudioClock>) -> f64 {
        match self.clock.source() {
            ClockSource::Internal => {
                self.clock.tick(dt);
            }
            ClockSource::Audio => {
                if let Some(audio) = audio {
                    self.clock.sync_audio(audio);
                }
            }
        }
        self.clock.current_time()
    }

    /// Sample `doc` at the clock's time and apply the frame.
    ///
    /// Each call supersedes the previous frame.
    pub fn render(
        &mut self,
        doc: &StepAnimation,
        rest_poses: &RestPoses,
        scene: &mut dyn SceneTarget,
        camera: Option<&mut dyn CameraController>,
    ) -> &SampledFrame {
        let frame = sample(doc, rest_poses, self.clock.current_time());

        for (id, pose) in &frame.object_poses {
            scene.apply_pose(id, pose);
        }
        for id in &frame.at_rest {
            scene.reset_to_rest(id, &rest_poses.get_or_identity(id));
        }
        if let (Some(camera), Some(pose)) = (camera, frame.camera.as_ref()) {
            camera.apply_camera_pose(pose);
        }

        self.last_frame.insert(frame)
    }

    /// `advance` followed by `render`
    pub fn step(
        &mut self,
        dt: f64,
        audio: Option<&dyn AudioClock>,
        doc: &StepAnimation,
        rest_poses: &RestPoses,
        scene: &mut dyn SceneTarget,
        camera: Option<&mut dyn CameraController>,
    ) -> &SampledFrame {
        self.advance(dt, audio);
        self.render(doc, rest_poses, scene, camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::{CameraKeyframe, ObjectKeyframe};
    use crate::math::Vec3;
    use rustc_hash::FxHashMap;

    #[derive(Default)]
    struct RecordingScene {
        poses: FxHashMap<ObjectId, ObjectPose>,
        resets: Vec<ObjectId>,
    }

    impl SceneTarget for RecordingScene {
        fn apply_pose(&mut self, object_id: &ObjectId, pose: &ObjectPose) {
            self.poses.insert(object_id.clone(), *pose);
        }

        fn reset_to_rest(&mut self, object_id: &ObjectId, _rest: &Transform) {
            self.resets.push(object_id.clone());
        }
    }

    #[derive(Default)]
    struct TestCamera(CameraPose);

    impl CameraController for TestCamera {
        fn camera_pose(&self) -> CameraPose {
            self.0
        }

        fn apply_camera_pose(&mut self, pose: &CameraPose) {
            self.0 = *pose;
        }
    }

    struct Audio(f64);

    impl AudioClock for Audio {
        fn position(&self) -> Option<f64> {
            Some(self.0)
        }
    }

    fn doc() -> StepAnimation {
        let mut doc = StepAnimation::new(2.0);
        doc.object_keyframes.push(ObjectKeyframe::new(
            0.0,
            ObjectId::new("lid"),
            Transform::IDENTITY,
        ));
        doc.object_keyframes.push(ObjectKeyframe::new(
            2.0,
            ObjectId::new("lid"),
            Transform::IDENTITY.with_position(Vec3::new(0.0, 4.0, 0.0)),
        ));
        doc.object_keyframes.push(ObjectKeyframe::new(
            1.5,
            ObjectId::new("screw"),
            Transform::IDENTITY,
        ));
        doc.camera_keyframes.push(CameraKeyframe::new(
            0.0,
            CameraPose::new(Vec3::new(0.0, 0.0, 8.0), Vec3::ZERO),
        ));
        doc
    }

    #[test]
    fn test_step_applies_frame_to_scene() {
        let mut engine = PlaybackEngine::new(PlaybackClock::new(2.0));
        engine.clock_mut().play();
        let mut scene = RecordingScene::default();
        let mut camera = TestCamera::default();

        let frame = engine.step(
            1.0,
            None,
            &doc(),
            &RestPoses::new(),
            &mut scene,
            Some(&mut camera),
        );
        assert_eq!(frame.time, 1.0);

        assert_eq!(scene.poses[&ObjectId::new("lid")].position.y, 2.0);
        assert_eq!(scene.resets, vec![ObjectId::new("screw")]);
        assert_eq!(camera.camera_pose().position.z, 8.0);
        assert!(engine.last_frame().is_some());
    }

    #[test]
    fn test_audio_source_drives_time() {
        let mut clock = PlaybackClock::new(2.0);
        clock.play();
        clock.set_source(ClockSource::Audio);
        let mut engine = PlaybackEngine::new(clock);

        assert_eq!(engine.advance(0.1, Some(&Audio(1.75))), 1.75);
        // dt is ignored while audio drives the clock
        assert_eq!(engine.advance(0.5, None), 1.75);
    }
}
