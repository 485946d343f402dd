use indicatif::ProgressBar;
use log::{debug, error, warn};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs::{copy, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::annotation::read_document;
use crate::config::{ConversionConfig, Format, Target};
use crate::error::Result;
use crate::geometry::{bounding_box, normalize, to_center_format};
use crate::types::{Document, ImageSize, Pair, Polygon, ProcessingStats};
use crate::utils::{output_image_name, read_image_size, sanitized_stem};

/// Minimum number of points for a polygon to describe a region
pub const MIN_POLYGON_POINTS: usize = 3;

/// Text of one YOLO label file plus how many regions went in or were skipped
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YoloLabel {
    pub content: String,
    pub regions_written: usize,
    pub regions_skipped: usize,
}

/// Polygons of the regions selected by `target`, in document order
pub fn target_regions(document: &Document, target: Target) -> Vec<&Polygon> {
    match target {
        Target::Cell => document.cells().map(|cell| &cell.points).collect(),
        Target::Table => document.tables.iter().map(|table| &table.points).collect(),
    }
}

/// Convert a document to YOLO label text (polygon or bounding box)
///
/// Regions without enough points are left out. Lines are joined with `\n`
/// and the text has no trailing newline.
pub fn convert_to_yolo_format(
    document: &Document,
    image_size: ImageSize,
    config: &ConversionConfig,
) -> Result<YoloLabel> {
    let width = image_size.width as f64;
    let height = image_size.height as f64;

    let mut lines = Vec::new();
    let mut regions_skipped = 0;
    for polygon in target_regions(document, config.target) {
        if polygon.len() < MIN_POLYGON_POINTS {
            if !polygon.is_empty() {
                debug!(
                    "Skipping region with {} points in {}",
                    polygon.len(),
                    document.filename
                );
            }
            regions_skipped += 1;
            continue;
        }

        let normalized = normalize(polygon, width, height)?;
        let line = match config.format {
            Format::Polygon => format_polygon_line(config.class_id, &normalized),
            Format::Bbox => format_bbox_line(config.class_id, &normalized)?,
        };
        lines.push(line);
    }

    Ok(YoloLabel {
        regions_written: lines.len(),
        content: lines.join("\n"),
        regions_skipped,
    })
}

/// `<class_id> x1 y1 ... xn yn` with six decimals per coordinate
pub fn format_polygon_line(class_id: u32, normalized: &[(f64, f64)]) -> String {
    let mut line = String::with_capacity(8 + normalized.len() * 18);
    line.push_str(&class_id.to_string());
    for &(x, y) in normalized {
        line.push_str(&format!(" {:.6} {:.6}", x, y));
    }
    line
}

/// `<class_id> x_center y_center width height` with six decimals per value
pub fn format_bbox_line(class_id: u32, normalized: &[(f64, f64)]) -> Result<String> {
    let (x_min, y_min, x_max, y_max) = bounding_box(normalized)?;
    let (x_center, y_center, width, height) = to_center_format(x_min, y_min, x_max, y_max);
    Ok(format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_id, x_center, y_center, width, height
    ))
}

/// Pairs sharing one image, written to a single label file named `output_stem`
#[derive(Debug)]
pub struct ImageGroup<'a> {
    pub image_path: &'a Path,
    pub output_stem: String,
    pub pairs: Vec<&'a Pair>,
}

/// Group pairs by image, in first-seen order.
///
/// Every XML matched to the same image ends up in one label file. Distinct
/// images whose sanitized stems collide get a numeric suffix so no two groups
/// write the same output name.
pub fn group_pairs_by_image(pairs: &[Pair]) -> Vec<ImageGroup<'_>> {
    let mut groups: Vec<ImageGroup> = Vec::new();
    let mut group_index: HashMap<&Path, usize> = HashMap::new();
    let mut used_stems: HashSet<String> = HashSet::new();

    for pair in pairs {
        if let Some(&index) = group_index.get(pair.image_path.as_path()) {
            groups[index].pairs.push(pair);
            continue;
        }

        let stem = sanitized_stem(&pair.image_path);
        let mut output_stem = stem.clone();
        let mut suffix = 1;
        while !used_stems.insert(output_stem.clone()) {
            output_stem = format!("{}_{}", stem, suffix);
            suffix += 1;
        }
        if output_stem != stem {
            warn!(
                "{} collides with another image named {}, writing it as {}",
                pair.image_path.display(),
                stem,
                output_stem
            );
        }

        group_index.insert(pair.image_path.as_path(), groups.len());
        groups.push(ImageGroup {
            image_path: pair.image_path.as_path(),
            output_stem,
            pairs: vec![pair],
        });
    }
    groups
}

/// Process a batch of pairs in parallel and tally the outcome
pub fn process_pairs_in_parallel(
    pairs: &[Pair],
    labels_dir: &Path,
    images_dir: &Path,
    config: &ConversionConfig,
    pb: &ProgressBar,
) -> ProcessingStats {
    let groups = group_pairs_by_image(pairs);
    let results: Vec<Result<Vec<Result<YoloLabel>>>> = groups
        .par_iter()
        .map(|group| {
            let result = process_image_group(group, labels_dir, images_dir, config);
            pb.inc(group.pairs.len() as u64);
            result
        })
        .collect();

    let mut stats = ProcessingStats::new();
    for (group, result) in groups.iter().zip(results) {
        match result {
            Ok(labels) => {
                for (pair, label) in group.pairs.iter().zip(labels) {
                    match label {
                        Ok(label) => {
                            stats.record_success(label.regions_written, label.regions_skipped)
                        }
                        Err(e) => {
                            error!(
                                "Failed to process {} ({}): {}",
                                pair.label_path.display(),
                                pair.image_path.display(),
                                e
                            );
                            stats.record_failure();
                        }
                    }
                }
            }
            Err(e) => {
                error!("Failed to process {}: {}", group.image_path.display(), e);
                for _ in &group.pairs {
                    stats.record_failure();
                }
            }
        }
    }
    stats
}

/// Convert every XML of one image, then write the merged label file and copy
/// the image.
///
/// The outer error fails the whole group (unreadable image, write failure);
/// the inner results are per pair, in `group.pairs` order. Nothing is written
/// when no pair converts.
pub fn process_image_group(
    group: &ImageGroup,
    labels_dir: &Path,
    images_dir: &Path,
    config: &ConversionConfig,
) -> Result<Vec<Result<YoloLabel>>> {
    let image_size = read_image_size(group.image_path)?;
    let labels: Vec<Result<YoloLabel>> = group
        .pairs
        .iter()
        .map(|pair| -> Result<YoloLabel> {
            let document = read_document(&pair.label_path)?;
            convert_to_yolo_format(&document, image_size, config)
        })
        .collect();

    let contents: Vec<&str> = labels
        .iter()
        .filter_map(|label| label.as_ref().ok())
        .map(|label| label.content.as_str())
        .collect();
    if contents.is_empty() {
        return Ok(labels);
    }
    let content = contents
        .into_iter()
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    // Label files are named after the image so trainers can find them
    let label_output_path = labels_dir.join(format!("{}.txt", group.output_stem));
    let mut writer = BufWriter::new(File::create(&label_output_path)?);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;

    let image_output_path =
        images_dir.join(output_image_name(group.image_path, &group.output_stem));
    copy(group.image_path, &image_output_path)?;

    debug!(
        "{} -> {} ({} XML files)",
        group.image_path.display(),
        label_output_path.display(),
        group.pairs.len()
    );
    Ok(labels)
}
