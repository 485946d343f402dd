use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::types::ImageSize;

/// Read the pixel dimensions of an image from its header
pub fn read_image_size(path: &Path) -> Result<ImageSize> {
    let size = imagesize::size(path).map_err(|e| ConvertError::ImageSize {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(ImageSize {
        width: size.width as u32,
        height: size.height as u32,
    })
}

/// Sanitized file stem of a path, used to name output label files
pub fn sanitized_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    sanitize_filename::sanitize(stem)
}

/// Sanitized file name of a path, used to name copied images
pub fn sanitized_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    sanitize_filename::sanitize(name)
}

/// File name of a copied image renamed to `output_stem`, keeping its extension
pub fn output_image_name(image_path: &Path, output_stem: &str) -> String {
    match image_path.extension() {
        Some(ext) => format!(
            "{}.{}",
            output_stem,
            sanitize_filename::sanitize(ext.to_string_lossy())
        ),
        None => output_stem.to_string(),
    }
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Safely create output directories and return their paths
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).and_then(|_| fs::create_dir_all(path))?;
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

#[doc(hidden)]
pub mod test_support {
    use std::fs;
    use std::path::Path;

    /// Write a minimal 24-bit BMP so header-based size lookup works.
    pub fn write_dummy_bmp(path: &Path, width: u32, height: u32) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let row_stride = (width * 3).div_ceil(4) * 4;
        let pixel_array_size = row_stride * height;
        let file_size = 54 + pixel_array_size;

        let mut bytes = Vec::with_capacity(file_size as usize);
        bytes.extend_from_slice(b"BM");
        bytes.extend_from_slice(&file_size.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&(width as i32).to_le_bytes());
        bytes.extend_from_slice(&(height as i32).to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
        bytes.extend_from_slice(&2835u32.to_le_bytes());
        bytes.extend_from_slice(&2835u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.resize(file_size as usize, 0);

        fs::write(path, bytes)
    }
}
