//! Timeline collision resolution
//!
//! A track may hold at most one keyframe per (rounded) instant. When a move,
//! duplicate or paste lands on an occupied time, the nearest free slot is
//! found by probing outwards in fixed steps, forward first.

use crate::keyframe::round_time;

/// Distance between probed slots, in seconds
pub const PROBE_STEP: f64 = 0.01;

/// Where a keyframe ended up after collision resolution
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotResolution {
    /// Final (rounded) time
    pub time: f64,
    /// True when every probed slot was taken and `time` still collides
    pub collided: bool,
}

impl SlotResolution {
    /// A slot that needed no probing
    pub fn free(time: f64) -> Self {
        Self {
            time,
            collided: false,
        }
    }
}

/// Find a free time slot near `desired` within `[0, duration]`.
///
/// `is_occupied` must already exclude the keyframe being moved. Probing runs
/// for `duration / step` iterations; if nothing is free the candidate is
/// returned anyway with `collided` set, so the caller's action never fails.
pub fn resolve_slot(
    desired: f64,
    duration: f64,
    step: f64,
    is_occupied: impl Fn(f64) -> bool,
) -> SlotResolution {
    let desired = round_time(desired);
    if !is_occupied(desired) {
        return SlotResolution::free(desired);
    }

    let step = if step > 0.0 { step } else { PROBE_STEP };
    let iterations = if duration > 0.0 {
        (duration / step).round() as usize
    } else {
        0
    };

    for i in 1..=iterations {
        let distance = i as f64 * step;

        let forward = round_time(desired + distance);
        if forward <= duration && !is_occupied(forward) {
            return SlotResolution::free(forward);
        }

        let backward = round_time(desired - distance);
        if backward >= 0.0 && !is_occupied(backward) {
            return SlotResolution::free(backward);
        }
    }

    tracing::warn!(
        "no free slot near {}s within {}s, keeping colliding time",
        desired,
        duration
    );
    SlotResolution {
        time: desired,
        collided: true,
    }
}
