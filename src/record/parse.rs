use crate::foundation::core::Point;
use crate::foundation::error::ParseError;
use crate::record::literal::parse_literal;
use crate::record::model::{ABSENT_SENTINEL, AnnotationRecord, StrideGroup, Triggers, fields};

const STRIDE_NAMES: [&str; 3] = ["stride_1", "stride_2", "stride_3"];

/// Decode one metadata row into an [`AnnotationRecord`].
///
/// Pure function of `row`. A stride field holding the absent sentinel (or nothing) is dropped,
/// which is how a record ends up with two strides instead of three.
pub fn parse_row<S: AsRef<str>>(row: &[S]) -> Result<AnnotationRecord, ParseError> {
    let key = field(row, fields::KEY, "key")?.trim().to_owned();

    let scale = [
        point_field(row, fields::SCALE[0], "scale_1")?,
        point_field(row, fields::SCALE[1], "scale_2")?,
    ];

    let mut stride_points = Vec::with_capacity(3);
    for (idx, name) in fields::STRIDE.into_iter().zip(STRIDE_NAMES) {
        let raw = field(row, idx, name)?.trim();
        if is_absent(raw) {
            continue;
        }
        stride_points.push(parse_point(raw, name)?);
    }

    let jump = [
        point_field(row, fields::TAKEOFF, "takeoff")?,
        point_field(row, fields::LAND, "land")?,
    ];
    let angle = [
        point_field(row, fields::ANGLE[0], "angle_1")?,
        point_field(row, fields::ANGLE[1], "angle_2")?,
    ];

    let raw = field(row, fields::TRIGGERS, "triggers")?;
    let frames = parse_literal(raw)
        .map_err(|e| ParseError::malformed("triggers", e.to_string()))?
        .as_frame_list()
        .map_err(|e| ParseError::malformed("triggers", e))?;
    let triggers = Triggers::from_slice(&frames)?;

    let operator = if row.len() >= fields::OPERATOR_MIN_LEN {
        row.last()
            .map(|s| s.as_ref().trim().to_owned())
            .unwrap_or_default()
    } else {
        String::new()
    };

    Ok(AnnotationRecord {
        key,
        scale,
        stride: StrideGroup::from_points(stride_points),
        jump,
        angle,
        triggers,
        operator,
    })
}

impl AnnotationRecord {
    /// Serialize back into the row layout read by [`parse_row`].
    ///
    /// Absent stride slots are written as leading sentinels; unused columns are left empty.
    /// Records the row cannot carry losslessly are rejected: more than three stride points, or a
    /// key or operator with surrounding whitespace (which [`parse_row`] trims).
    pub fn to_row(&self) -> Result<Vec<String>, ParseError> {
        let points = self.stride.points();
        if points.len() > fields::STRIDE.len() {
            return Err(ParseError::malformed(
                "stride",
                format!(
                    "{} points do not fit the {} stride columns",
                    points.len(),
                    fields::STRIDE.len()
                ),
            ));
        }
        for (name, value) in [("key", &self.key), ("operator", &self.operator)] {
            if value.trim() != value.as_str() {
                return Err(ParseError::malformed(
                    name,
                    "surrounding whitespace is not preserved",
                ));
            }
        }

        let mut row = vec![String::new(); fields::ROW_LEN];
        row[fields::KEY] = self.key.clone();
        row[fields::SCALE[0]] = format_point(self.scale[0]);
        row[fields::SCALE[1]] = format_point(self.scale[1]);

        let absent = fields::STRIDE.len().saturating_sub(points.len());
        for (slot, idx) in fields::STRIDE.into_iter().enumerate() {
            row[idx] = match slot.checked_sub(absent).and_then(|i| points.get(i)) {
                Some(p) => format_point(*p),
                None => ABSENT_SENTINEL.to_owned(),
            };
        }

        row[fields::TAKEOFF] = format_point(self.jump[0]);
        row[fields::LAND] = format_point(self.jump[1]);
        row[fields::ANGLE[0]] = format_point(self.angle[0]);
        row[fields::ANGLE[1]] = format_point(self.angle[1]);

        let frames: Vec<String> = self
            .triggers
            .as_slice()
            .iter()
            .map(u64::to_string)
            .collect();
        row[fields::TRIGGERS] = format!("[{}]", frames.join(", "));
        row[fields::ROW_LEN - 1] = self.operator.clone();
        Ok(row)
    }
}

fn field<'a, S: AsRef<str>>(
    row: &'a [S],
    index: usize,
    name: &'static str,
) -> Result<&'a str, ParseError> {
    row.get(index)
        .map(AsRef::as_ref)
        .ok_or(ParseError::MissingField { field: name, index })
}

fn is_absent(raw: &str) -> bool {
    raw.is_empty() || raw == ABSENT_SENTINEL
}

fn point_field<S: AsRef<str>>(
    row: &[S],
    index: usize,
    name: &'static str,
) -> Result<Point, ParseError> {
    parse_point(field(row, index, name)?, name)
}

fn parse_point(raw: &str, name: &'static str) -> Result<Point, ParseError> {
    parse_literal(raw)
        .map_err(|e| ParseError::malformed(name, e.to_string()))?
        .as_point()
        .map_err(|e| ParseError::malformed(name, e))
}

fn format_point(p: Point) -> String {
    format!("({}, {})", p.x, p.y)
}

#[cfg(test)]
#[path = "../../tests/unit/record/parse.rs"]
mod tests;
