//! Detprep: object-detection dataset preparation.
//!
//! Detprep takes a flat directory of images with YOLO-style sibling labels
//! and prepares it for detector training: cleaning (deduplication, label
//! validation, brightness filtering, optional enhancement), deterministic
//! train/val/test splitting, and label generation from an Open Images CSV
//! export.
//!
//! # Modules
//!
//! - [`clean`]: The dataset cleaning pipeline and its outcome counters
//! - [`split`]: The deterministic train/val/test splitter
//! - [`label`]: YOLO label file parsing and validation
//! - [`oid`]: Open Images CSV to YOLO label conversion
//! - [`imgproc`]: Brightness measurement and the enhancement pass
//! - [`error`]: Error types for detprep operations

pub mod clean;
pub mod error;
pub mod imgproc;
pub mod label;
pub mod oid;
pub mod split;

mod discover;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::clean::CleanOptions;
use crate::imgproc::EnhanceOptions;
use crate::split::SplitOptions;

pub use error::DetprepError;

/// The detprep CLI application.
#[derive(Parser)]
#[command(name = "detprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Clean a dataset directory into a deduplicated, validated copy.
    Clean(CleanArgs),
    /// Split a dataset directory into train/val/test partitions.
    Split(SplitArgs),
    /// Generate YOLO label files from an Open Images annotation export.
    Labels(LabelsArgs),
}

/// Arguments for the clean subcommand.
#[derive(clap::Args)]
struct CleanArgs {
    /// Source directory containing images and sibling .txt labels.
    #[arg(default_value = "OID/Dataset/train/Laptop")]
    source: PathBuf,

    /// Output directory for the cleaned dataset.
    #[arg(default_value = "OID/Dataset/train/Laptop_cleaned")]
    output: PathBuf,

    /// Apply brightness/contrast adjustment and sharpening to kept images.
    #[arg(long)]
    enhance: bool,

    /// Brightness factor (>1.0 = brighter).
    #[arg(long, default_value_t = 1.1)]
    brightness: f32,

    /// Contrast factor (>1.0 = more contrast).
    #[arg(long, default_value_t = 1.1)]
    contrast: f32,

    /// Disable sharpening (only applies with --enhance).
    #[arg(long)]
    no_sharpen: bool,

    /// Reject images with mean luminance below this value (0-255).
    #[arg(long, default_value_t = 30.0)]
    min_brightness: f64,

    /// Reject images with mean luminance above this value (0-255).
    #[arg(long, default_value_t = 220.0)]
    max_brightness: f64,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Source directory of images with sibling .txt labels.
    #[arg(default_value = "OID/Dataset/train/Laptop_cleaned")]
    source: PathBuf,

    /// Output root for the train/val/test directories.
    #[arg(default_value = "OID/Dataset/Laptop_cleaned_splits")]
    output: PathBuf,

    /// Fraction of pairs assigned to the train split.
    #[arg(long, default_value_t = 0.7)]
    train_ratio: f64,

    /// Fraction of pairs assigned to the val split.
    #[arg(long, default_value_t = 0.15)]
    val_ratio: f64,

    /// Shuffle seed; the same seed always yields the same split.
    #[arg(long, default_value_t = split::DEFAULT_SEED)]
    seed: u64,

    /// Class name recorded in the generated data.yaml.
    #[arg(long, default_value = "laptop")]
    class_name: String,
}

/// Arguments for the labels subcommand.
#[derive(clap::Args)]
struct LabelsArgs {
    /// Class descriptions CSV (label_id,display_name rows, no header).
    classes_csv: PathBuf,

    /// Box annotations CSV (ImageID/LabelName/XMin/XMax/YMin/YMax columns).
    annotations_csv: PathBuf,

    /// Directory of downloaded .jpg images; labels are written beside them.
    images_dir: PathBuf,

    /// Class display name to extract.
    #[arg(long, default_value = "Laptop")]
    class: String,
}

/// Run the detprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DetprepError> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Clean(args)) => run_clean(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Labels(args)) => run_labels(args),
        None => {
            println!("detprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Object-detection dataset preparation.");
            println!();
            println!("Run 'detprep --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the clean subcommand.
fn run_clean(args: CleanArgs) -> Result<(), DetprepError> {
    let opts = CleanOptions {
        min_brightness: args.min_brightness,
        max_brightness: args.max_brightness,
        enhance: args.enhance.then_some(EnhanceOptions {
            brightness_factor: args.brightness,
            contrast_factor: args.contrast,
            sharpen: !args.no_sharpen,
        }),
    };

    let stats = clean::clean_dataset(&args.source, &args.output, &opts)?;
    print!("{stats}");
    println!("Cleaned dataset saved to: {}", args.output.display());
    Ok(())
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), DetprepError> {
    let opts = SplitOptions {
        train_ratio: args.train_ratio,
        val_ratio: args.val_ratio,
        seed: args.seed,
        class_name: args.class_name,
    };

    let summary = split::split_dataset(&args.source, &args.output, &opts)?;
    print!("{summary}");
    println!("Split completed under: {}", args.output.display());
    Ok(())
}

/// Execute the labels subcommand.
fn run_labels(args: LabelsArgs) -> Result<(), DetprepError> {
    let label_id = oid::lookup_class_id(&args.classes_csv, &args.class)?;
    println!("{} label id: {}", args.class, label_id);

    let summary = oid::generate_labels(&args.annotations_csv, &label_id, &args.images_dir)?;
    println!("{summary}");
    Ok(())
}
