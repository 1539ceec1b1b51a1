//! Keyline Animation Engine
//!
//! Keyframe animation for assembly-instruction steps: timed transform and
//! camera tracks, playback sampling, and undoable timeline editing.
//!
//! # Features
//!
//! - **Easing**: 31 named curves plus preview polylines for curve pickers
//! - **Offset poses**: keyframes store offsets from each object's rest pose;
//!   legacy absolute documents are normalized once
//! - **Sampling**: position lerp, quaternion slerp, visibility cross-fades
//! - **Timeline edits**: move, duplicate, shift and paste with collision
//!   resolution
//! - **History**: bounded snapshot undo/redo
//! - **Playback**: internal 60 Hz clock or an external audio clock
//!
//! # Example
//!
//! ```
//! use keyline_animation::{AuthoringSession, ObjectId, Transform, Vec3};
//!
//! let mut session = AuthoringSession::default();
//! let lid = ObjectId::new("gearbox/lid");
//! session.record_object_keyframe(lid.clone(), 0.0, Transform::IDENTITY, true).unwrap();
//! session
//!     .record_object_keyframe(
//!         lid.clone(),
//!         1.0,
//!         Transform::IDENTITY.with_position(Vec3::new(0.0, 2.0, 0.0)),
//!         true,
//!     )
//!     .unwrap();
//!
//! session.set_current_time(0.5);
//! let frame = session.sample_current();
//! assert_eq!(frame.object_poses[&lid].position.y, 1.0);
//! ```

pub mod clipboard;
pub mod clock;
pub mod collision;
pub mod config;
pub mod document;
pub mod easing;
pub mod error;
pub mod history;
pub mod keyframe;
pub mod math;
pub mod offset;
pub mod persistence;
pub mod playback;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod store;

pub use clipboard::ClipboardEntry;
pub use clock::{AudioClock, ClockSource, PlaybackClock};
pub use collision::{resolve_slot, SlotResolution};
pub use config::EngineConfig;
pub use document::{AnnotationInstance, StepAnimation};
pub use easing::{ease, Easing, EasingCurve};
pub use error::{ConfigError, DocumentError, RepositoryError, StoreError};
pub use history::{EditorSnapshot, HistoryManager};
pub use keyframe::{
    round_time, CameraKeyframe, CameraPose, ObjectId, ObjectKeyframe, Selection, TrackRef,
};
pub use math::{Transform, Vec3};
pub use offset::{apply_offset, normalize, offset_from, RestPoses};
pub use persistence::{AnimationRepository, FileRepository, StepKey};
pub use playback::{CameraController, PlaybackEngine, SceneTarget};
pub use registry::{ObjectKey, ObjectRegistry};
pub use resolver::{sample, ObjectPose, PoseSource, SampledFrame, Visibility};
pub use session::AuthoringSession;
pub use store::KeyframeStore;
