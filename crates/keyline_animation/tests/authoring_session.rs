//! Integration tests for timeline editing through an authoring session
//!
//! These tests verify that:
//! - Shifting, moving and pasting keep tracks free of time collisions
//! - Undo followed by redo returns to the same document, selection and
//!   playhead
//! - Legacy documents are converted once and survive a save/load cycle

use keyline_animation::{
    AnimationRepository, AuthoringSession, CameraPose, EngineConfig, FileRepository, ObjectId,
    ObjectKeyframe, Selection, StepAnimation, StepKey, TrackRef, Transform, Vec3,
};

type EditorState = (StepAnimation, Option<Selection>, f64);

fn state(session: &AuthoringSession) -> EditorState {
    (
        session.document().clone(),
        session.selection().cloned(),
        session.current_time(),
    )
}

fn part() -> ObjectId {
    ObjectId::new("gearbox/gear")
}

fn offset_x(x: f64) -> Transform {
    Transform::IDENTITY.with_position(Vec3::new(x, 0.0, 0.0))
}

fn assert_no_collisions(session: &AuthoringSession, track: &TrackRef) {
    let times = session.store().track_times(track);
    for pair in times.windows(2) {
        assert!(
            pair[1] - pair[0] >= 0.001 - 1e-9,
            "collision on {}: {:?}",
            track,
            times
        );
    }
}

/// Test the shift worked example: {0,1,2} + 0.25 -> {0.25,1.25,2.25}
#[test]
fn test_shift_all_example() {
    let mut doc = StepAnimation::new(2.0);
    for t in [0.0, 1.0, 2.0] {
        doc.object_keyframes
            .push(ObjectKeyframe::new(t, part(), offset_x(t)));
    }
    let mut session = AuthoringSession::default();
    session.load(doc);

    session.shift_all(0.25);
    assert_eq!(
        session.store().track_times(&TrackRef::Object(part())),
        vec![0.25, 1.25, 2.25]
    );
    assert_eq!(session.document().duration, 2.25);

    assert!(session.undo());
    assert_eq!(
        session.store().track_times(&TrackRef::Object(part())),
        vec![0.0, 1.0, 2.0]
    );
    assert_eq!(session.document().duration, 2.0);
}

/// Test that repeated moves and pastes onto the same instant never collide
#[test]
fn test_edits_stay_collision_free() {
    let mut session = AuthoringSession::default();
    let track = TrackRef::Object(part());
    for t in [0.0, 0.5, 1.0, 1.5] {
        session
            .record_object_keyframe(part(), t, offset_x(t), true)
            .unwrap();
    }

    // Pile everything onto t = 1.0
    for t in [0.0, 0.5, 1.5] {
        let resolution = session.move_keyframe(&track, t, 1.0).unwrap();
        assert!(!resolution.collided);
        assert_no_collisions(&session, &track);
    }

    assert!(session.copy(&track, 1.0));
    for _ in 0..5 {
        session.paste(1.0).unwrap();
        assert_no_collisions(&session, &track);
    }
    assert_eq!(session.store().track_times(&track).len(), 9);

    // Camera track is independent
    session
        .record_camera_keyframe(1.0, CameraPose::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO))
        .unwrap();
    assert_eq!(session.store().track_times(&TrackRef::Camera), vec![1.0]);
}

/// Test that every undo is reversed by the matching redo, including the
/// selection and playhead
#[test]
fn test_undo_redo_symmetry() {
    let mut session = AuthoringSession::default();
    let track = TrackRef::Object(part());
    let camera = CameraPose::new(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO);

    let mut states = Vec::new();
    let mut checkpoint = |session: &mut AuthoringSession, playhead: f64| {
        session.set_current_time(playhead);
        states.push(state(session));
    };

    checkpoint(&mut session, 0.0);
    session.record_object_keyframe(part(), 0.0, offset_x(0.0), true).unwrap();
    checkpoint(&mut session, 0.4);
    session.record_camera_keyframe(2.0, camera).unwrap();
    checkpoint(&mut session, 1.1);
    session.record_object_keyframe(part(), 2.0, offset_x(3.0), false).unwrap();
    checkpoint(&mut session, 1.6);
    session.duplicate_keyframe(&track, 2.0, 2.0).unwrap();
    checkpoint(&mut session, 0.2);
    session.move_keyframe(&track, 0.0, 0.75).unwrap();
    checkpoint(&mut session, 2.0);
    session
        .set_easing(&track, 0.75, Some(keyline_animation::Easing::EaseInCubic))
        .unwrap();
    checkpoint(&mut session, 0.9);
    session.delete_keyframe(&track, 2.0);
    checkpoint(&mut session, 3.0);
    session.shift_all(0.5);
    states.push(state(&session));

    for expected in states.iter().rev().skip(1) {
        assert!(session.undo());
        assert_eq!(&state(&session), expected);
    }
    assert!(!session.can_undo());

    for expected in states.iter().skip(1) {
        assert!(session.redo());
        assert_eq!(&state(&session), expected);
    }
    assert!(!session.can_redo());
}

/// Test that history is bounded by the configured capacity
#[test]
fn test_history_capacity() {
    let mut config = EngineConfig::default();
    config.history.capacity = 3;
    let mut session = AuthoringSession::new(&config);
    for i in 0..6 {
        session
            .record_object_keyframe(part(), i as f64 * 0.1, offset_x(0.0), true)
            .unwrap();
    }

    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(session.document().object_keyframes.len(), 3);
}

/// Test that a legacy step is normalized against the attached model and
/// persisted in offset form
#[test]
fn test_legacy_step_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = FileRepository::new(dir.path());
    let key = StepKey::new("gearbox", "step-2").unwrap();

    let legacy = r#"{
        "duration": 3,
        "objectKeyframes": [
            {"time": 0, "objectId": "gearbox/gear", "transform": {"position": {"x": 4, "y": 1, "z": 0}, "scale": {"x": 2, "y": 2, "z": 2}}}
        ]
    }"#;
    std::fs::create_dir_all(dir.path().join("gearbox")).unwrap();
    std::fs::write(repo.path_for(&key), legacy).unwrap();

    let mut session = AuthoringSession::default();
    assert!(session.load_from(&repo, &key).unwrap());
    assert!(!session.document().is_offset);

    session.attach_objects([(part(), Transform::IDENTITY.with_position(Vec3::new(3.0, 1.0, 0.0)))]);
    assert!(session.document().is_offset);
    session.save_to(&mut repo, &key).unwrap();

    let stored = repo.load(&key).unwrap().unwrap();
    assert!(stored.is_offset);
    let kf = &stored.object_keyframes[0];
    assert_eq!(kf.transform.position, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(kf.transform.scale, Vec3::new(2.0, 2.0, 2.0));

    // Sampling still places the object where the legacy data had it
    let frame = session.sample_current();
    assert_eq!(frame.object_poses[&part()].position, Vec3::new(4.0, 1.0, 0.0));
}

/// Test that loading an unknown step starts an empty document
#[test]
fn test_load_missing_step() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileRepository::new(dir.path());
    let mut session = AuthoringSession::default();
    session
        .record_object_keyframe(part(), 1.0, offset_x(0.0), true)
        .unwrap();

    let key = StepKey::new("gearbox", "step-9").unwrap();
    assert!(!session.load_from(&repo, &key).unwrap());
    assert!(session.document().is_empty());
    assert!(!session.can_undo());
}
