//! COCO format data structures and utilities
//!
//! This module turns parsed table annotations into COCO instance-segmentation
//! documents, one per split.

use chrono::Datelike;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ConversionConfig;
use crate::conversion::{target_regions, MIN_POLYGON_POINTS};
use crate::error::Result;
use crate::geometry::{bounding_box, flatten, polygon_area};
use crate::types::{Document, ImageSize};

pub const SUPERCATEGORY: &str = "table";

/// COCO dataset information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub year: i32,
    pub version: String,
    pub description: String,
    pub contributor: String,
    pub url: String,
    pub date_created: String,
}

impl Default for Info {
    fn default() -> Self {
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            version: "1.0".to_string(),
            description: "Table Cell Detection Dataset".to_string(),
            contributor: "icdar2coco".to_string(),
            url: String::new(),
            date_created: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// COCO license information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub id: u32,
    pub name: String,
    pub url: String,
}

impl Default for License {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Unknown".to_string(),
            url: String::new(),
        }
    }
}

/// COCO category information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

/// COCO image information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u32,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub license: u32,
}

/// COCO annotation information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u32,
    pub image_id: u32,
    pub category_id: u32,
    pub segmentation: Vec<Vec<f64>>,
    pub area: f64,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub iscrowd: u32,
}

/// Complete COCO dataset structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoFile {
    pub info: Info,
    pub licenses: Vec<License>,
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

/// Outcome of adding one document to a [`CocoWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedImage {
    pub image_id: u32,
    pub regions_written: usize,
    pub regions_skipped: usize,
}

/// Builds the COCO document of a single split.
///
/// Image and annotation ids start at 1 for every writer, so each split is a
/// self-contained document. Annotations are only created together with their
/// image, which keeps every `image_id` pointing at an existing image.
pub struct CocoWriter {
    config: ConversionConfig,
    next_image_id: u32,
    next_annotation_id: u32,
    images: Vec<Image>,
    annotations: Vec<Annotation>,
}

impl CocoWriter {
    /// Create a new COCO writer with the given configuration
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            next_image_id: 1,
            next_annotation_id: 1,
            images: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Add an image and one annotation per region of the configured target
    pub fn add_document(
        &mut self,
        file_name: String,
        image_size: ImageSize,
        document: &Document,
    ) -> Result<AddedImage> {
        // Build the annotations first so a failing region leaves no orphan image
        let mut pending = Vec::new();
        let mut regions_skipped = 0;
        for polygon in target_regions(document, self.config.target) {
            if polygon.len() < MIN_POLYGON_POINTS {
                regions_skipped += 1;
                continue;
            }
            pending.push(self.region_annotation(polygon)?);
        }

        let image_id = self.add_image(file_name, image_size);
        let regions_written = pending.len();
        for mut annotation in pending {
            annotation.id = self.next_annotation_id;
            annotation.image_id = image_id;
            self.next_annotation_id += 1;
            self.annotations.push(annotation);
        }

        debug!(
            "COCO image {} with {} annotations",
            image_id, regions_written
        );
        Ok(AddedImage {
            image_id,
            regions_written,
            regions_skipped,
        })
    }

    /// Build the complete COCO dataset structure
    pub fn build(self) -> CocoFile {
        CocoFile {
            info: Info::default(),
            licenses: vec![License::default()],
            categories: vec![category_for(&self.config)],
            images: self.images,
            annotations: self.annotations,
        }
    }

    fn add_image(&mut self, file_name: String, image_size: ImageSize) -> u32 {
        let image_id = self.next_image_id;
        self.next_image_id += 1;
        self.images.push(Image {
            id: image_id,
            file_name,
            width: image_size.width,
            height: image_size.height,
            license: 1,
        });
        image_id
    }

    fn region_annotation(&self, polygon: &[(f64, f64)]) -> Result<Annotation> {
        Ok(Annotation {
            id: 0,
            image_id: 0,
            category_id: self.config.category_id(),
            segmentation: vec![flatten(polygon)],
            area: polygon_area(polygon),
            bbox: coco_bbox(polygon)?,
            iscrowd: 0,
        })
    }
}

/// The single category a conversion run produces
pub fn category_for(config: &ConversionConfig) -> Category {
    Category {
        id: config.category_id(),
        name: config.class_label.clone(),
        supercategory: SUPERCATEGORY.to_string(),
    }
}

/// Pixel-space `[x_min, y_min, width, height]`
pub fn coco_bbox(polygon: &[(f64, f64)]) -> Result<[f64; 4]> {
    let (x_min, y_min, x_max, y_max) = bounding_box(polygon)?;
    Ok([x_min, y_min, x_max - x_min, y_max - y_min])
}
