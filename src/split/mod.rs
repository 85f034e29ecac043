//! Deterministic train/val/test splitting.
//!
//! Partitions a flat directory of image/label pairs into three disjoint
//! splits using a seeded shuffle, so the same source contents, ratios, and
//! seed always produce the same partition. Images without a same-stem label
//! are silently excluded here; hard rejection of those is the cleaning
//! pipeline's job.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::discover;
use crate::error::DetprepError;

const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];
const LABEL_EXTENSION: &str = "txt";

/// Default shuffle seed.
pub const DEFAULT_SEED: u64 = 42;

/// Names of the three output partitions, in slice order.
pub const SPLIT_NAMES: [&str; 3] = ["train", "val", "test"];

/// Split ratios, shuffle seed, and the class name recorded in `data.yaml`.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitOptions {
    /// Fraction of valid pairs assigned to the train split.
    pub train_ratio: f64,
    /// Fraction of valid pairs assigned to the val split; the remainder goes
    /// to test.
    pub val_ratio: f64,
    /// Seed for the deterministic shuffle.
    pub seed: u64,
    /// Single detection class name written to the dataset description file.
    pub class_name: String,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            val_ratio: 0.15,
            seed: DEFAULT_SEED,
            class_name: "laptop".to_string(),
        }
    }
}

/// Sizes of the three partitions produced by one split run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub n_train: usize,
    pub n_val: usize,
    pub n_test: usize,
}

impl SplitSummary {
    pub fn total(&self) -> usize {
        self.n_train + self.n_val + self.n_test
    }
}

impl fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total pairs: {}", self.total())?;
        writeln!(
            f,
            "Train: {}, Val: {}, Test: {}",
            self.n_train, self.n_val, self.n_test
        )
    }
}

/// Validate split ratios before any I/O happens.
pub fn validate_split_options(opts: &SplitOptions) -> Result<(), DetprepError> {
    if !(0.0 < opts.train_ratio && opts.train_ratio < 1.0) {
        return Err(DetprepError::InvalidSplitRatios {
            message: format!(
                "train_ratio must be in the interval (0, 1), got {}",
                opts.train_ratio
            ),
        });
    }
    if !(0.0 < opts.val_ratio && opts.val_ratio < 1.0) {
        return Err(DetprepError::InvalidSplitRatios {
            message: format!(
                "val_ratio must be in the interval (0, 1), got {}",
                opts.val_ratio
            ),
        });
    }
    if opts.train_ratio + opts.val_ratio >= 1.0 {
        return Err(DetprepError::InvalidSplitRatios {
            message: format!(
                "train_ratio + val_ratio must be less than 1, got {}",
                opts.train_ratio + opts.val_ratio
            ),
        });
    }
    Ok(())
}

/// Partition `source_dir` into `output_root/{train,val,test}/{images,labels}/`.
///
/// Copies are byte-identical and every valid pair lands in exactly one split.
pub fn split_dataset(
    source_dir: &Path,
    output_root: &Path,
    opts: &SplitOptions,
) -> Result<SplitSummary, DetprepError> {
    validate_split_options(opts)?;

    if !source_dir.is_dir() {
        return Err(DetprepError::SourceDirNotFound {
            path: source_dir.to_path_buf(),
        });
    }

    let mut pairs = collect_valid_pairs(source_dir)?;
    if pairs.is_empty() {
        return Err(DetprepError::EmptyDataset {
            path: source_dir.to_path_buf(),
        });
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    pairs.shuffle(&mut rng);

    let n_total = pairs.len();
    let n_train = (n_total as f64 * opts.train_ratio).floor() as usize;
    let n_val = (n_total as f64 * opts.val_ratio).floor() as usize;
    let n_test = n_total - n_train - n_val;

    copy_split(output_root, "train", &pairs[..n_train])?;
    copy_split(output_root, "val", &pairs[n_train..n_train + n_val])?;
    copy_split(output_root, "test", &pairs[n_train + n_val..])?;
    write_data_yaml(output_root, &opts.class_name)?;

    let summary = SplitSummary {
        n_train,
        n_val,
        n_test,
    };
    info!(
        "split {} pairs into {}/{}/{} under {}",
        n_total,
        n_train,
        n_val,
        n_test,
        output_root.display()
    );
    Ok(summary)
}

/// A matched image/label pair, with the file names cached for copying.
#[derive(Clone, Debug)]
struct Pair {
    image: PathBuf,
    label: PathBuf,
    image_name: String,
    label_name: String,
}

fn collect_valid_pairs(source_dir: &Path) -> Result<Vec<Pair>, DetprepError> {
    let images = discover::collect_files(source_dir, &IMAGE_EXTENSIONS)?;

    let mut pairs = Vec::new();
    for image in images {
        let label = image.with_extension(LABEL_EXTENSION);
        if !label.is_file() {
            continue;
        }
        let (Some(image_name), Some(label_name)) = (
            image.file_name().and_then(|n| n.to_str()),
            label.file_name().and_then(|n| n.to_str()),
        ) else {
            continue;
        };
        pairs.push(Pair {
            image_name: image_name.to_string(),
            label_name: label_name.to_string(),
            image,
            label,
        });
    }
    Ok(pairs)
}

fn copy_split(output_root: &Path, split_name: &str, pairs: &[Pair]) -> Result<(), DetprepError> {
    let images_dir = output_root.join(split_name).join("images");
    let labels_dir = output_root.join(split_name).join("labels");
    fs::create_dir_all(&images_dir)?;
    fs::create_dir_all(&labels_dir)?;

    for pair in pairs {
        fs::copy(&pair.image, images_dir.join(&pair.image_name))?;
        fs::copy(&pair.label, labels_dir.join(&pair.label_name))?;
    }
    Ok(())
}

/// Write the dataset description file a detector trainer consumes.
fn write_data_yaml(output_root: &Path, class_name: &str) -> Result<(), DetprepError> {
    let mut yaml = String::from("path: .\n");
    for split_name in SPLIT_NAMES {
        yaml.push_str(&format!("{split_name}: {split_name}/images\n"));
    }
    yaml.push_str("\nnc: 1\n");
    yaml.push_str(&format!(
        "names: ['{}']\n",
        class_name.replace('\'', "''")
    ));

    fs::write(output_root.join("data.yaml"), yaml).map_err(DetprepError::Io)
}
