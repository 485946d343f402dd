//! ICDAR table annotation converter
//!
//! This library converts ICDAR 2019 cTDaR table ground truth (XML polygons for
//! tables and cells) to YOLO segmentation/detection labels and COCO JSON for
//! training table cell detectors.

pub mod annotation;
pub mod coco;
pub mod coco_dataset;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod io;
pub mod types;
pub mod utils;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use annotation::{parse_document, read_document};
pub use config::{Args, ConversionConfig, Format, Target};
pub use error::{ConvertError, Result};
pub use io::{associate_pairs, collect_pairs, find_files, setup_output_directories};
pub use types::{Cell, Document, ImageSize, OutputDirs, Pair, ProcessingStats, SplitData, Table};
pub use yolo_dataset::process_dataset;

// COCO-specific exports
pub use coco::{CocoFile, CocoWriter};
pub use coco_dataset::{process_coco_dataset, setup_coco_output_directories};
