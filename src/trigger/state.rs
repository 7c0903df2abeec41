//! Per-video reveal state for the overlay groups.
//!
//! Each group is a small state machine over [`GroupPhase`]. `Latched` is absorbing: it is checked
//! before any threshold comparison, so a latched group stays fully visible for the rest of the run
//! no matter how later comparisons come out.

use crate::foundation::core::{FrameIndex, Point};
use crate::record::model::{AnnotationRecord, StrideGroup, Triggers, slots};

/// Visibility phase of one overlay group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GroupPhase {
    /// Nothing drawn.
    #[default]
    Hidden,
    /// The first `n` points are drawn; recomputed every frame.
    Revealed(usize),
    /// Everything drawn, permanently.
    Latched,
}

impl GroupPhase {
    /// `true` for the absorbing [`GroupPhase::Latched`] phase.
    pub fn is_latched(self) -> bool {
        matches!(self, Self::Latched)
    }
}

/// Mutable latch state carried frame to frame within one video.
///
/// Starts all-hidden; a group only ever moves towards `Latched`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerState {
    stride: GroupPhase,
    jump: GroupPhase,
    angle: GroupPhase,
}

impl TriggerState {
    /// Fresh state for frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stride phase.
    pub fn stride(&self) -> GroupPhase {
        self.stride
    }

    /// Current takeoff/landing phase.
    pub fn jump(&self) -> GroupPhase {
        self.jump
    }

    /// Current angle phase.
    pub fn angle(&self) -> GroupPhase {
        self.angle
    }

    /// Whether the stride group has latched.
    pub fn stride_latched(&self) -> bool {
        self.stride.is_latched()
    }

    /// Whether the takeoff/landing group has latched.
    pub fn jump_latched(&self) -> bool {
        self.jump.is_latched()
    }

    /// Whether the angle group has latched.
    pub fn angle_latched(&self) -> bool {
        self.angle.is_latched()
    }

    /// Advance to `frame` and return what to draw on it. See [`step`].
    pub fn step<'a>(&mut self, frame: FrameIndex, record: &'a AnnotationRecord) -> OverlayPlan<'a> {
        step(frame, record, self)
    }
}

/// What to draw on one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayPlan<'a> {
    /// Scale reference, drawn on every frame.
    pub scale: [Point; 2],
    /// Visible prefix of the stride points.
    pub stride_markers: &'a [Point],
    /// Takeoff/landing endpoints when the jump group is visible.
    pub jump: Option<[Point; 2]>,
    /// Angle reference endpoints when the angle group is visible.
    pub angle: Option<[Point; 2]>,
}

impl OverlayPlan<'_> {
    /// Whether the takeoff/landing line and markers are drawn.
    pub fn jump_line(&self) -> bool {
        self.jump.is_some()
    }

    /// Whether the angle line and markers are drawn.
    pub fn angle_line(&self) -> bool {
        self.angle.is_some()
    }
}

/// Advance `state` to `frame` and decide what is visible on it.
///
/// Frames must be fed in strictly increasing order; the latches make the result depend on history.
pub fn step<'a>(
    frame: FrameIndex,
    record: &'a AnnotationRecord,
    state: &mut TriggerState,
) -> OverlayPlan<'a> {
    let triggers = &record.triggers;

    let stride = advance_stride(state.stride, &record.stride, triggers, frame);
    if stride.is_latched() && !state.stride.is_latched() {
        tracing::debug!(frame = frame.0, key = %record.key, "stride group latched");
    }
    state.stride = stride;

    let jump = advance_pair(state.jump, triggers, [slots::TAKEOFF, slots::LAND], frame);
    if jump.is_latched() && !state.jump.is_latched() {
        tracing::debug!(frame = frame.0, key = %record.key, "jump group latched");
    }
    state.jump = jump;

    let angle = advance_pair(
        state.angle,
        triggers,
        [slots::ANGLE_FIRST, slots::ANGLE_SECOND],
        frame,
    );
    if angle.is_latched() && !state.angle.is_latched() {
        tracing::debug!(frame = frame.0, key = %record.key, "angle group latched");
    }
    state.angle = angle;

    let points = record.stride.points();
    let stride_markers = match stride {
        GroupPhase::Hidden => &points[..0],
        GroupPhase::Revealed(n) => &points[..n.min(points.len())],
        GroupPhase::Latched => points,
    };

    OverlayPlan {
        scale: record.scale,
        stride_markers,
        jump: jump.is_latched().then_some(record.jump),
        angle: angle.is_latched().then_some(record.angle),
    }
}

fn advance_stride(
    phase: GroupPhase,
    group: &StrideGroup,
    triggers: &Triggers,
    frame: FrameIndex,
) -> GroupPhase {
    if phase.is_latched() {
        return GroupPhase::Latched;
    }
    let stages = group.stages();
    let Some(&(final_slot, _)) = stages.last() else {
        return GroupPhase::Hidden;
    };
    if triggers.reached(final_slot, frame) {
        return GroupPhase::Latched;
    }
    // Thresholds are checked independently; the largest reached stage wins.
    stages
        .iter()
        .filter(|(slot, _)| triggers.reached(*slot, frame))
        .map(|&(_, count)| count)
        .max()
        .map_or(GroupPhase::Hidden, GroupPhase::Revealed)
}

fn advance_pair(
    phase: GroupPhase,
    triggers: &Triggers,
    pair: [usize; 2],
    frame: FrameIndex,
) -> GroupPhase {
    if phase.is_latched() || pair.iter().all(|&slot| triggers.reached(slot, frame)) {
        GroupPhase::Latched
    } else {
        GroupPhase::Hidden
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trigger/state.rs"]
mod tests;
