#![allow(dead_code)]

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

/// A label line that passes every bounding-box invariant.
pub const VALID_LABEL: &str = "0 0.5 0.5 0.4 0.4\n";

/// Write a solid-gray image; `level` is the mean luminance of the result.
pub fn write_image(path: &Path, width: u32, height: u32, level: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_pixel(width, height, Rgb([level, level, level]))
        .save(path)
        .expect("write test image");
}

pub fn write_label(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write label file");
}

/// Write `count` distinct valid image/label pairs (`pair_00.jpg` ...) into `dir`.
pub fn write_pairs(dir: &Path, count: usize) {
    for i in 0..count {
        // Vary the gray level so the pairs are not byte-identical.
        let level = 100 + (i as u8 % 40);
        write_image(&dir.join(format!("pair_{i:02}.jpg")), 8, 8, level);
        write_label(&dir.join(format!("pair_{i:02}.txt")), VALID_LABEL);
    }
}

/// Sorted file names directly inside `dir`, or empty if it does not exist.
pub fn file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
