//! YOLO TXT record codec.
//!
//! One line per box: `<class> <cx> <cy> <w> <h>`, space separated, with the
//! four geometric fields normalized by the image size. Parsing is all or
//! nothing: a single bad line rejects the whole file.

use crate::format::error::FormatError;
use crate::geometry::NormalizedRecord;

/// Number of whitespace-separated fields in a record line.
const FIELDS_PER_LINE: usize = 5;

/// Parse a complete annotation file.
///
/// Every line must hold exactly five fields, an integer class id followed by
/// four finite numbers; a blank line has none and fails like any other short
/// line. The newline ending the last record does not start a new line.
pub fn parse_records(content: &str) -> Result<Vec<NormalizedRecord>, FormatError> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| parse_line(line, idx + 1))
        .collect()
}

/// Parse a single record line. `line_no` is used for error reporting.
pub fn parse_line(line: &str, line_no: usize) -> Result<NormalizedRecord, FormatError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != FIELDS_PER_LINE {
        return Err(FormatError::malformed(
            line_no,
            format!("expected {} fields, found {}", FIELDS_PER_LINE, parts.len()),
        ));
    }

    let class_id: u32 = parts[0].parse().map_err(|_| {
        FormatError::malformed(line_no, format!("invalid class id '{}'", parts[0]))
    })?;

    let mut values = [0.0f64; 4];
    for (slot, token) in values.iter_mut().zip(&parts[1..]) {
        *slot = parse_number(token).ok_or_else(|| {
            FormatError::malformed(line_no, format!("invalid number '{}'", token))
        })?;
    }

    let [cx, cy, w, h] = values;
    Ok(NormalizedRecord::new(class_id, cx, cy, w, h))
}

fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a record as a single line without the trailing newline.
pub fn format_record(record: &NormalizedRecord) -> String {
    format!(
        "{} {} {} {} {}",
        record.class_id,
        format_float(record.cx),
        format_float(record.cy),
        format_float(record.w),
        format_float(record.h)
    )
}

/// Serialize records into file content, one newline-terminated line each.
pub fn format_records(records: &[NormalizedRecord]) -> String {
    let mut content = String::new();
    for record in records {
        content.push_str(&format_record(record));
        content.push('\n');
    }
    content
}

/// Shortest text that reads back as the same value, always with a decimal
/// point so integral values stay recognizable as floats (`0.0`, not `0`).
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains(['.', 'e', 'E']) || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}
