use crate::foundation::core::{FrameIndex, Point};
use crate::foundation::error::ParseError;

/// Number of trigger frame indices carried by every record.
pub const TRIGGER_COUNT: usize = 9;

/// Text stored in a stride field whose point was not measured.
pub const ABSENT_SENTINEL: &str = "Default Value";

/// Column layout of a metadata row.
pub mod fields {
    /// Video key.
    pub const KEY: usize = 0;
    /// First and second scale reference points.
    pub const SCALE: [usize; 2] = [1, 2];
    /// Up to three stride points, in reveal order.
    pub const STRIDE: [usize; 3] = [3, 4, 5];
    /// Takeoff point.
    pub const TAKEOFF: usize = 6;
    /// Landing point.
    pub const LAND: usize = 7;
    /// Angle reference points.
    pub const ANGLE: [usize; 2] = [9, 10];
    /// Nine-element trigger list.
    pub const TRIGGERS: usize = 20;
    /// Minimum row length for the operator tag (last field) to be distinct from the triggers.
    pub const OPERATOR_MIN_LEN: usize = TRIGGERS + 2;
    /// Row length produced by [`crate::AnnotationRecord::to_row`].
    pub const ROW_LEN: usize = OPERATOR_MIN_LEN;
}

/// Roles of the trigger slots consulted by the state machine.
///
/// Slots 0 and 1 are carried but never consulted.
pub mod slots {
    /// Reveal the first of three stride points.
    pub const STRIDE_FIRST_OF_THREE: usize = 2;
    /// Reveal the second stride point (or the first when there are only two).
    pub const STRIDE_SECOND: usize = 3;
    /// Reveal every stride point and latch the group.
    pub const STRIDE_FINAL: usize = 4;
    /// Takeoff ready.
    pub const TAKEOFF: usize = 5;
    /// Landing ready.
    pub const LAND: usize = 6;
    /// First angle point ready.
    pub const ANGLE_FIRST: usize = 7;
    /// Second angle point ready.
    pub const ANGLE_SECOND: usize = 8;
}

/// The nine frame-index triggers of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Triggers([u64; TRIGGER_COUNT]);

impl Triggers {
    /// Wrap an exact array of trigger frame indices.
    pub const fn new(frames: [u64; TRIGGER_COUNT]) -> Self {
        Self(frames)
    }

    /// Validate a decoded list; anything but nine entries is rejected.
    pub fn from_slice(frames: &[u64]) -> Result<Self, ParseError> {
        let arr: [u64; TRIGGER_COUNT] =
            frames
                .try_into()
                .map_err(|_| ParseError::TriggerCountMismatch {
                    found: frames.len(),
                })?;
        Ok(Self(arr))
    }

    /// Frame index stored in trigger slot `slot` (0..9).
    pub fn get(&self, slot: usize) -> Option<FrameIndex> {
        self.0.get(slot).copied().map(FrameIndex)
    }

    /// `true` once `frame` has reached the threshold stored in `slot`.
    ///
    /// Slots outside 0..9 are never reached.
    pub fn reached(&self, slot: usize, frame: FrameIndex) -> bool {
        self.get(slot).is_some_and(|t| frame >= t)
    }

    /// All nine frame indices.
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

/// Stride points, classified once by cardinality.
///
/// Each variant owns its reveal schedule: a list of `(trigger slot, visible point count)` stages.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StrideGroup {
    /// Two strides: first point at slot 3, both at slot 4.
    TwoPoint([Point; 2]),
    /// Three strides: one point at slot 2, two at slot 3, all at slot 4.
    ThreePoint([Point; 3]),
    /// Any other count; never drawn.
    Unsupported(Vec<Point>),
}

const TWO_POINT_STAGES: &[(usize, usize)] =
    &[(slots::STRIDE_SECOND, 1), (slots::STRIDE_FINAL, 2)];
const THREE_POINT_STAGES: &[(usize, usize)] = &[
    (slots::STRIDE_FIRST_OF_THREE, 1),
    (slots::STRIDE_SECOND, 2),
    (slots::STRIDE_FINAL, 3),
];

impl StrideGroup {
    /// Classify the present stride points (absent fields already removed).
    pub fn from_points(points: Vec<Point>) -> Self {
        match points.as_slice() {
            [a, b] => Self::TwoPoint([*a, *b]),
            [a, b, c] => Self::ThreePoint([*a, *b, *c]),
            _ => Self::Unsupported(points),
        }
    }

    /// Every stride point in reveal order.
    pub fn points(&self) -> &[Point] {
        match self {
            Self::TwoPoint(p) => p,
            Self::ThreePoint(p) => p,
            Self::Unsupported(p) => p,
        }
    }

    /// Reveal schedule, last stage latches. Empty for [`StrideGroup::Unsupported`].
    pub fn stages(&self) -> &'static [(usize, usize)] {
        match self {
            Self::TwoPoint(_) => TWO_POINT_STAGES,
            Self::ThreePoint(_) => THREE_POINT_STAGES,
            Self::Unsupported(_) => &[],
        }
    }

    /// Whether this group is ever rendered.
    pub fn is_renderable(&self) -> bool {
        !self.stages().is_empty()
    }
}

/// Annotation metadata for one video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationRecord {
    /// Video key the row is filed under.
    pub key: String,
    /// Horizontal scale reference endpoints.
    pub scale: [Point; 2],
    /// Stride points.
    pub stride: StrideGroup,
    /// Takeoff and landing points.
    pub jump: [Point; 2],
    /// Angle reference points.
    pub angle: [Point; 2],
    /// Reveal thresholds.
    pub triggers: Triggers,
    /// Operator/name tag from the last field, not rendered.
    pub operator: String,
}
