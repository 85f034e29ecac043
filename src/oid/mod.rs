//! Open Images CSV to YOLO label conversion.
//!
//! Takes the Open Images `class-descriptions-boxable.csv` and a box
//! annotations CSV export, and writes one YOLO label file per downloaded
//! image containing the requested class, next to the image itself.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::discover;
use crate::error::DetprepError;

/// One row of the Open Images box annotations CSV, restricted to the columns
/// this conversion needs. Coordinates stay as text so that a malformed row
/// can be skipped instead of aborting the whole stream.
#[derive(Debug, Deserialize)]
struct BoxRow {
    #[serde(rename = "ImageID")]
    image_id: String,
    #[serde(rename = "LabelName")]
    label_name: String,
    #[serde(rename = "XMin")]
    x_min: String,
    #[serde(rename = "XMax")]
    x_max: String,
    #[serde(rename = "YMin")]
    y_min: String,
    #[serde(rename = "YMax")]
    y_max: String,
}

/// Counts returned by one label-generation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LabelGenSummary {
    /// Number of images that received a label file.
    pub images: usize,
    /// Total number of boxes written across all label files.
    pub boxes: usize,
}

impl fmt::Display for LabelGenSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generated labels for {} images, total {} boxes.",
            self.images, self.boxes
        )
    }
}

/// Find the Open Images label id for a class display name.
///
/// The class-descriptions CSV is headerless, `label_id,display_name` per row.
/// Matching is case-insensitive.
pub fn lookup_class_id(classes_csv: &Path, class_name: &str) -> Result<String, DetprepError> {
    if !classes_csv.is_file() {
        return Err(DetprepError::InputFileNotFound {
            path: classes_csv.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(classes_csv)
        .map_err(|source| DetprepError::CsvRead {
            path: classes_csv.to_path_buf(),
            source,
        })?;

    for record in reader.records() {
        let record = record.map_err(|source| DetprepError::CsvRead {
            path: classes_csv.to_path_buf(),
            source,
        })?;
        if record.len() >= 2 && record[1].eq_ignore_ascii_case(class_name) {
            return Ok(record[0].to_string());
        }
    }

    Err(DetprepError::ClassNotFound {
        class_name: class_name.to_string(),
        path: classes_csv.to_path_buf(),
    })
}

/// Generate single-class YOLO label files beside the images in `images_dir`.
///
/// Only annotation rows matching `label_id` and a downloaded `.jpg` stem are
/// used; rows with unparsable coordinates or a center outside `[0, 1]` are
/// skipped. Any pre-existing `.txt` labels in the directory are cleared
/// first so the run starts from a clean slate.
pub fn generate_labels(
    annotations_csv: &Path,
    label_id: &str,
    images_dir: &Path,
) -> Result<LabelGenSummary, DetprepError> {
    if !annotations_csv.is_file() {
        return Err(DetprepError::InputFileNotFound {
            path: annotations_csv.to_path_buf(),
        });
    }
    if !images_dir.is_dir() {
        return Err(DetprepError::SourceDirNotFound {
            path: images_dir.to_path_buf(),
        });
    }

    let stems: HashSet<String> = discover::collect_files(images_dir, &["jpg"])?
        .iter()
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    if stems.is_empty() {
        return Err(DetprepError::EmptyDataset {
            path: images_dir.to_path_buf(),
        });
    }

    for stale in discover::collect_files(images_dir, &["txt"])? {
        fs::remove_file(&stale)?;
    }

    let mut reader =
        csv::Reader::from_path(annotations_csv).map_err(|source| DetprepError::CsvRead {
            path: annotations_csv.to_path_buf(),
            source,
        })?;

    let mut summary = LabelGenSummary::default();
    let mut started: HashSet<String> = HashSet::new();

    for row in reader.deserialize::<BoxRow>() {
        let row = row.map_err(|source| DetprepError::CsvRead {
            path: annotations_csv.to_path_buf(),
            source,
        })?;

        if row.label_name != label_id || !stems.contains(&row.image_id) {
            continue;
        }
        let Some((cx, cy, w, h)) = center_box(&row) else {
            continue;
        };

        let label_path = images_dir.join(format!("{}.txt", row.image_id));
        let mut file = if started.insert(row.image_id.clone()) {
            summary.images += 1;
            File::create(&label_path)?
        } else {
            OpenOptions::new().append(true).open(&label_path)?
        };

        writeln!(file, "0 {cx:.6} {cy:.6} {w:.6} {h:.6}")?;
        summary.boxes += 1;
    }

    info!("{summary}");
    Ok(summary)
}

/// Convert a corner-coordinate row to center/size form, or `None` when the
/// coordinates fail to parse or the center leaves the unit square.
fn center_box(row: &BoxRow) -> Option<(f64, f64, f64, f64)> {
    let x_min: f64 = row.x_min.trim().parse().ok()?;
    let x_max: f64 = row.x_max.trim().parse().ok()?;
    let y_min: f64 = row.y_min.trim().parse().ok()?;
    let y_max: f64 = row.y_max.trim().parse().ok()?;

    let cx = (x_min + x_max) / 2.0;
    let cy = (y_min + y_max) / 2.0;
    if !(0.0..=1.0).contains(&cx) || !(0.0..=1.0).contains(&cy) {
        return None;
    }

    Some((cx, cy, x_max - x_min, y_max - y_min))
}
