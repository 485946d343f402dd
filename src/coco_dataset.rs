//! COCO dataset processing module
//!
//! Drives image/XML pairs through parsing, image copying and COCO document
//! assembly, writing one `instances_<split>.json` per split.

use indicatif::ProgressBar;
use log::{error, info};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::annotation::read_document;
use crate::coco::{CocoFile, CocoWriter};
use crate::config::{Args, ConversionConfig};
use crate::dataset::split_pairs;
use crate::error::{ConvertError, Result};
use crate::types::{Document, ImageSize, Pair, ProcessingStats};
use crate::utils::{
    create_output_directory, create_progress_bar, read_image_size, sanitized_file_name,
};

/// Struct to hold the paths to the output directories for COCO dataset
#[derive(Debug)]
pub struct CocoOutputDirs {
    pub annotations_dir: PathBuf,
    pub train_images_dir: PathBuf,
    pub val_images_dir: PathBuf,
    pub test_images_dir: Option<PathBuf>,
}

// Everything the COCO writer needs from one pair, produced in parallel
#[derive(Debug)]
struct PreparedImage {
    file_name: String,
    image_size: ImageSize,
    document: Document,
}

/// Set up the directory structure for COCO dataset output
pub fn setup_coco_output_directories(
    args: &Args,
    output_dir: &Path,
) -> std::io::Result<CocoOutputDirs> {
    let base_dir = output_dir.join("COCODataset");
    let annotations_dir = create_output_directory(&base_dir.join("annotations"))?;
    let images_dir = create_output_directory(&base_dir.join("images"))?;

    let train_images_dir = create_output_directory(&images_dir.join("train"))?;
    let val_images_dir = create_output_directory(&images_dir.join("val"))?;

    let test_images_dir = if args.test_size > 0.0 {
        Some(create_output_directory(&images_dir.join("test"))?)
    } else {
        None
    };

    Ok(CocoOutputDirs {
        annotations_dir,
        train_images_dir,
        val_images_dir,
        test_images_dir,
    })
}

/// Main COCO dataset processing pipeline
pub fn process_coco_dataset(
    pairs: Vec<Pair>,
    output_dirs: &CocoOutputDirs,
    args: &Args,
) -> Result<ProcessingStats> {
    info!("Converting {} image/XML pairs to COCO.", pairs.len());
    let config = args.to_conversion_config();
    let split_data = split_pairs(pairs, args.val_size, args.test_size, args.seed);

    let mut splits = vec![
        ("train", &split_data.train_pairs, &output_dirs.train_images_dir),
        ("val", &split_data.val_pairs, &output_dirs.val_images_dir),
    ];
    if let Some(test_images_dir) = &output_dirs.test_images_dir {
        splits.push(("test", &split_data.test_pairs, test_images_dir));
    }

    let mut stats = ProcessingStats::new();
    for (split, pairs, images_dir) in splits {
        let pb = create_progress_bar(pairs.len() as u64, split);
        let (coco_file, split_stats) = build_split(pairs, images_dir, &config, &pb);
        pb.finish_with_message(format!("{} processing complete", split));

        let json_path = output_dirs
            .annotations_dir
            .join(format!("instances_{}.json", split));
        write_coco_file(&json_path, &coco_file)?;
        info!(
            "Wrote {} ({} images, {} annotations)",
            json_path.display(),
            coco_file.images.len(),
            coco_file.annotations.len()
        );
        stats.merge(&split_stats);
    }

    Ok(stats)
}

/// Build the COCO document of one split.
///
/// Pairs are read and copied in parallel; ids are then assigned in pair order,
/// so the output does not depend on thread scheduling. An image shared by
/// several XML files is copied once and gets one image entry per XML.
pub fn build_split(
    pairs: &[Pair],
    images_dir: &Path,
    config: &ConversionConfig,
    pb: &ProgressBar,
) -> (CocoFile, ProcessingStats) {
    let prepared: Vec<Result<PreparedImage>> = pairs
        .par_iter()
        .map(|pair| {
            let result = prepare_pair(pair);
            pb.inc(1);
            result
        })
        .collect();

    let mut seen = HashSet::new();
    let mut to_copy: Vec<&Path> = Vec::new();
    for (pair, result) in pairs.iter().zip(&prepared) {
        if result.is_ok() && seen.insert(pair.image_path.as_path()) {
            to_copy.push(pair.image_path.as_path());
        }
    }
    let copy_failures: HashMap<&Path, io::Error> = to_copy
        .par_iter()
        .filter_map(|&image_path| {
            fs::copy(image_path, images_dir.join(sanitized_file_name(image_path)))
                .err()
                .map(|e| (image_path, e))
        })
        .collect();

    let mut writer = CocoWriter::new(config.clone());
    let mut stats = ProcessingStats::new();
    for (pair, result) in pairs.iter().zip(prepared) {
        let added = result.and_then(|image| {
            if let Some(e) = copy_failures.get(pair.image_path.as_path()) {
                return Err(ConvertError::Io(io::Error::new(e.kind(), e.to_string())));
            }
            writer.add_document(image.file_name, image.image_size, &image.document)
        });
        match added {
            Ok(added) => stats.record_success(added.regions_written, added.regions_skipped),
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

    (writer.build(), stats)
}

/// Serialize a COCO document to disk
pub fn write_coco_file(path: &Path, coco_file: &CocoFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, coco_file)?;
    writer.flush()?;
    Ok(())
}

fn prepare_pair(pair: &Pair) -> Result<PreparedImage> {
    let image_size = read_image_size(&pair.image_path)?;
    let document = read_document(&pair.label_path)?;

    Ok(PreparedImage {
        file_name: sanitized_file_name(&pair.image_path),
        image_size,
        document,
    })
}
