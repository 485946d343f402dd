use std::path::PathBuf;

// Supported image formats
pub const IMG_FORMATS: &[&str] = &[
    "bmp", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

// Supported annotation formats
pub const LABEL_FORMATS: &[&str] = &["xml"];

/// Ordered pixel-space points describing a region boundary, implicitly closed.
pub type Polygon = Vec<(f64, f64)>;

/// Row/column span of a cell inside its table grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: Option<String>,
    pub points: Polygon,
    pub grid: Option<GridPosition>,
}

// A table region together with its cells
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: Option<String>,
    pub points: Polygon,
    pub cells: Vec<Cell>,
}

/// Parsed contents of one ground-truth XML file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub filename: String,
    pub tables: Vec<Table>,
}

impl Document {
    /// Iterate over every cell of every table, in document order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.tables.iter().flat_map(|table| table.cells.iter())
    }
}

/// Pixel dimensions of a raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// An image file and the annotation file that describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

impl Pair {
    pub fn new(image_path: impl Into<PathBuf>, label_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            label_path: label_path.into(),
        }
    }
}

// Struct to hold the paths to the output directories for train/val/test splits
#[derive(Debug)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub train_labels_dir: PathBuf,
    pub val_labels_dir: PathBuf,
    pub train_images_dir: PathBuf,
    pub val_images_dir: PathBuf,
    pub test_labels_dir: Option<PathBuf>,
    pub test_images_dir: Option<PathBuf>,
}

// Struct to hold the split pairs for training, validation, and testing
#[derive(Debug, Default)]
pub struct SplitData {
    pub train_pairs: Vec<Pair>,
    pub val_pairs: Vec<Pair>,
    pub test_pairs: Vec<Pair>,
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_pairs_processed: usize,
    pub successful_conversions: usize,
    pub failed_conversions: usize,
    pub regions_written: usize,
    pub regions_skipped: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, regions_written: usize, regions_skipped: usize) {
        self.total_pairs_processed += 1;
        self.successful_conversions += 1;
        self.regions_written += regions_written;
        self.regions_skipped += regions_skipped;
    }

    pub fn record_failure(&mut self) {
        self.total_pairs_processed += 1;
        self.failed_conversions += 1;
    }

    pub fn merge(&mut self, other: &ProcessingStats) {
        self.total_pairs_processed += other.total_pairs_processed;
        self.successful_conversions += other.successful_conversions;
        self.failed_conversions += other.failed_conversions;
        self.regions_written += other.regions_written;
        self.regions_skipped += other.regions_skipped;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total pairs processed: {}", self.total_pairs_processed);
        log::info!("Successful conversions: {}", self.successful_conversions);
        log::info!("Regions written: {}", self.regions_written);

        if self.regions_skipped > 0 {
            log::info!(
                "Regions skipped (fewer than 3 points): {}",
                self.regions_skipped
            );
        }
        if self.failed_conversions > 0 {
            log::warn!("Failed conversions: {}", self.failed_conversions);
        }
    }
}
