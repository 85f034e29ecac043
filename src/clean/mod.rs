//! Dataset cleaning pipeline.
//!
//! Reads a flat directory of images with same-stem `.txt` labels, runs a
//! fixed sequence of accept/reject checks per image, and copies accepted
//! pairs (optionally re-encoded through the enhancement pass) into the output
//! directory. The source directory is never modified.

mod stats;

pub use stats::CleanStats;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::discover;
use crate::error::DetprepError;
use crate::imgproc::{self, EnhanceOptions};
use crate::label;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const LABEL_EXTENSION: &str = "txt";

/// Brightness acceptance window and the optional enhancement pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanOptions {
    /// Reject images whose mean luminance falls below this (0-255 scale).
    pub min_brightness: f64,
    /// Reject images whose mean luminance rises above this (0-255 scale).
    pub max_brightness: f64,
    /// When set, accepted images are rewritten through the enhancement pass.
    pub enhance: Option<EnhanceOptions>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            min_brightness: 30.0,
            max_brightness: 220.0,
            enhance: None,
        }
    }
}

/// How a single image was classified. The first matching rule wins, so every
/// image lands in exactly one variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// No same-stem label file exists beside the image.
    NoLabel,
    /// The label file is empty, unreadable, or fails a bounding-box invariant.
    InvalidBbox,
    /// Byte-identical to an earlier image in this run.
    Duplicate { original: PathBuf },
    /// Mean luminance below the acceptance window.
    TooDark { brightness: f64 },
    /// Mean luminance above the acceptance window.
    TooBright { brightness: f64 },
    /// Passed every check.
    Kept,
}

/// Content-hash index mapping each digest to the first path seen with it.
#[derive(Debug, Default)]
struct DuplicateIndex {
    seen: HashMap<u64, PathBuf>,
}

impl DuplicateIndex {
    /// Record `path` under `hash`. Returns the first-seen path when the hash
    /// was already present, leaving the original owner in place.
    fn insert(&mut self, hash: u64, path: &Path) -> Option<PathBuf> {
        match self.seen.get(&hash) {
            Some(original) => Some(original.clone()),
            None => {
                self.seen.insert(hash, path.to_path_buf());
                None
            }
        }
    }
}

/// Clean `source_dir` into `output_dir`, returning the per-outcome counters.
///
/// Fails up front when the source directory does not exist; the output
/// directory (including parents) is created as needed.
pub fn clean_dataset(
    source_dir: &Path,
    output_dir: &Path,
    opts: &CleanOptions,
) -> Result<CleanStats, DetprepError> {
    if !source_dir.is_dir() {
        return Err(DetprepError::SourceDirNotFound {
            path: source_dir.to_path_buf(),
        });
    }
    fs::create_dir_all(output_dir)?;

    let images = discover::collect_files(source_dir, &IMAGE_EXTENSIONS)?;
    info!("found {} images in {}", images.len(), source_dir.display());

    let mut stats = CleanStats {
        total_images: images.len(),
        ..Default::default()
    };
    let mut duplicates = DuplicateIndex::default();

    for image_path in &images {
        let name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match classify_image(image_path, opts, &mut duplicates)? {
            Outcome::NoLabel => {
                stats.no_label += 1;
                info!("removing {name}: no label file");
            }
            Outcome::InvalidBbox => {
                stats.invalid_bbox += 1;
                info!("removing {name}: invalid bounding boxes");
            }
            Outcome::Duplicate { original } => {
                stats.duplicate += 1;
                info!("removing {name}: duplicate of {}", original.display());
            }
            Outcome::TooDark { brightness } => {
                stats.too_dark += 1;
                info!("removing {name}: too dark (brightness={brightness:.1})");
            }
            Outcome::TooBright { brightness } => {
                stats.too_bright += 1;
                info!("removing {name}: too bright (brightness={brightness:.1})");
            }
            Outcome::Kept => {
                let enhanced =
                    copy_accepted(image_path, output_dir, opts.enhance.as_ref())?;
                stats.kept += 1;
                if enhanced {
                    stats.enhanced += 1;
                }
                if stats.kept % 100 == 0 {
                    info!("processed {} images...", stats.kept);
                }
            }
        }
    }

    Ok(stats)
}

/// Run the fixed-order decision procedure for one image.
///
/// The order is load-bearing: an image missing its label is never charged
/// against the duplicate or brightness counters. The brightness check is
/// fail-open; an undecodable image passes it with a warning.
fn classify_image(
    image_path: &Path,
    opts: &CleanOptions,
    duplicates: &mut DuplicateIndex,
) -> Result<Outcome, DetprepError> {
    let label_path = image_path.with_extension(LABEL_EXTENSION);
    if !label_path.is_file() {
        return Ok(Outcome::NoLabel);
    }

    if label::validate_label_file(&label_path).is_err() {
        return Ok(Outcome::InvalidBbox);
    }

    let bytes = fs::read(image_path)?;
    let hash = seahash::hash(&bytes);
    if let Some(original) = duplicates.insert(hash, image_path) {
        return Ok(Outcome::Duplicate { original });
    }

    match imgproc::mean_luminance(image_path) {
        Ok(brightness) if brightness < opts.min_brightness => {
            return Ok(Outcome::TooDark { brightness })
        }
        Ok(brightness) if brightness > opts.max_brightness => {
            return Ok(Outcome::TooBright { brightness })
        }
        Ok(_) => {}
        Err(err) => {
            warn!(
                "could not check brightness for {}: {err}",
                image_path.display()
            );
        }
    }

    Ok(Outcome::Kept)
}

/// Copy an accepted image and its label into the output directory.
///
/// With enhancement enabled, a failed enhanced write falls back to a
/// byte-identical copy. Returns whether the enhanced write succeeded.
fn copy_accepted(
    image_path: &Path,
    output_dir: &Path,
    enhance: Option<&EnhanceOptions>,
) -> Result<bool, DetprepError> {
    let image_name = image_path.file_name().ok_or_else(|| {
        DetprepError::Io(std::io::Error::other(format!(
            "image path has no file name: {}",
            image_path.display()
        )))
    })?;
    let label_path = image_path.with_extension(LABEL_EXTENSION);
    let label_name = label_path.file_name().ok_or_else(|| {
        DetprepError::Io(std::io::Error::other(format!(
            "label path has no file name: {}",
            label_path.display()
        )))
    })?;

    let output_image = output_dir.join(image_name);
    let mut enhanced = false;

    if let Some(enhance_opts) = enhance {
        match imgproc::enhance_image(image_path, &output_image, enhance_opts) {
            Ok(()) => enhanced = true,
            Err(err) => {
                warn!(
                    "failed to enhance {}: {err}; copying unmodified",
                    image_path.display()
                );
                fs::copy(image_path, &output_image)?;
            }
        }
    } else {
        fs::copy(image_path, &output_image)?;
    }

    fs::copy(&label_path, output_dir.join(label_name))?;
    Ok(enhanced)
}
