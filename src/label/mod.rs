//! YOLO-style label file parsing and validation.
//!
//! A label file holds one bounding box per line, `class_id cx cy w h`, with
//! the geometric fields normalized to the image dimensions. Validation is
//! fail-closed at file granularity: a single bad line (including a blank one)
//! invalidates the whole file, and an empty file is invalid too.

use std::fs;
use std::path::Path;

use thiserror::Error;

/// One parsed bounding-box row in normalized center/size form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRow {
    pub class_id: usize,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// Why a label file failed validation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("label file is empty")]
    EmptyFile,

    #[error("label file could not be read: {message}")]
    Unreadable { message: String },

    #[error("line {line}: expected 5 tokens, found {found}")]
    TokenCount { line: usize, found: usize },

    #[error("line {line}: invalid {field} '{value}'")]
    FieldParse {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: {message}")]
    OutOfBounds { line: usize, message: String },
}

/// Parse one label line into a row without range checking.
pub fn parse_label_row(line: &str, line_num: usize) -> Result<LabelRow, LabelError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 5 {
        return Err(LabelError::TokenCount {
            line: line_num,
            found: tokens.len(),
        });
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| LabelError::FieldParse {
            line: line_num,
            field: "class_id",
            value: tokens[0].to_string(),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", line_num)?;
    let w = parse_f64_token(tokens[3], "width", line_num)?;
    let h = parse_f64_token(tokens[4], "height", line_num)?;

    Ok(LabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
    })
}

/// Check the normalized-coordinate invariants for one row.
///
/// Centers must lie in `[0, 1]`, sizes in `(0, 1]`, and the derived corner
/// box must fit inside `[0, 1]` on both axes with min strictly below max.
pub fn validate_row(row: &LabelRow, line_num: usize) -> Result<(), LabelError> {
    if !(0.0..=1.0).contains(&row.cx) || !(0.0..=1.0).contains(&row.cy) {
        return Err(LabelError::OutOfBounds {
            line: line_num,
            message: format!("center ({}, {}) outside [0, 1]", row.cx, row.cy),
        });
    }

    if !(row.w > 0.0 && row.w <= 1.0) || !(row.h > 0.0 && row.h <= 1.0) {
        return Err(LabelError::OutOfBounds {
            line: line_num,
            message: format!("size ({}, {}) outside (0, 1]", row.w, row.h),
        });
    }

    let x_min = row.cx - row.w / 2.0;
    let x_max = row.cx + row.w / 2.0;
    let y_min = row.cy - row.h / 2.0;
    let y_max = row.cy + row.h / 2.0;

    if !(0.0 <= x_min && x_min < x_max && x_max <= 1.0)
        || !(0.0 <= y_min && y_min < y_max && y_max <= 1.0)
    {
        return Err(LabelError::OutOfBounds {
            line: line_num,
            message: format!(
                "derived box ({x_min}, {y_min}, {x_max}, {y_max}) leaves the image"
            ),
        });
    }

    Ok(())
}

/// Parse and validate every line of a label file's text.
pub fn parse_label_text(text: &str) -> Result<Vec<LabelRow>, LabelError> {
    let mut rows = Vec::new();

    for (line_idx, line) in text.lines().enumerate() {
        let line_num = line_idx + 1;
        let row = parse_label_row(line, line_num)?;
        validate_row(&row, line_num)?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(LabelError::EmptyFile);
    }

    Ok(rows)
}

/// Read a label file and validate all of its rows.
pub fn validate_label_file(path: &Path) -> Result<Vec<LabelRow>, LabelError> {
    let text = fs::read_to_string(path).map_err(|err| LabelError::Unreadable {
        message: err.to_string(),
    })?;
    parse_label_text(&text)
}

fn parse_f64_token(raw: &str, field: &'static str, line_num: usize) -> Result<f64, LabelError> {
    raw.parse::<f64>().map_err(|_| LabelError::FieldParse {
        line: line_num,
        field,
        value: raw.to_string(),
    })
}
