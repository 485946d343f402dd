use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// Command-line arguments for converting ICDAR table annotations to YOLO or COCO format.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Directory containing the images (and the XML files unless --labels_dir is given)
    #[arg(short = 'd', long = "input_dir")]
    pub input_dir: String,

    /// Directory containing the XML ground-truth files, if separate from the images
    #[arg(long = "labels_dir")]
    pub labels_dir: Option<String>,

    /// Directory that receives the YOLODataset/COCODataset folder (defaults to input_dir)
    #[arg(short = 'o', long = "output_dir")]
    pub output_dir: Option<String>,

    /// Proportion of the dataset to use for validation
    #[arg(long = "val_size", default_value_t = 0.2, value_parser = validate_size)]
    pub val_size: f32,

    /// Proportion of the dataset to use for testing
    #[arg(long = "test_size", default_value_t = 0.0, value_parser = validate_size)]
    pub test_size: f32,

    /// Seed for random shuffling
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Class id written for every region
    #[arg(
        long = "class_id",
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(..u32::MAX as i64)
    )]
    pub class_id: u32,

    /// Class label written to dataset.yaml and the COCO categories
    #[arg(long = "class_label", default_value = "cell")]
    pub class_label: String,

    /// Which regions to export: table cells or whole tables
    #[arg(long = "target", value_enum, default_value = "cell")]
    pub target: Target,

    /// Output format for YOLO annotations: 'polygon' or 'bbox'
    #[arg(
        long = "output_format",
        visible_alias = "format",
        value_enum,
        default_value = "polygon"
    )]
    pub output_format: Format,

    /// Fail when an image or XML file has no partner instead of skipping it
    #[arg(long = "strict")]
    pub strict: bool,
}

impl Args {
    pub fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.input_dir)
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.labels_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.input_dir())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.input_dir())
    }

    pub fn to_conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            class_id: self.class_id,
            class_label: self.class_label.clone(),
            target: self.target,
            format: self.output_format,
        }
    }
}

// Enumeration for the YOLO output format
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum Format {
    #[default]
    Polygon,
    Bbox,
}

impl Format {
    /// Ultralytics task name matching the label layout
    pub fn task(self) -> &'static str {
        match self {
            Format::Polygon => "segment",
            Format::Bbox => "detect",
        }
    }
}

// Which annotated regions become training samples
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum Target {
    #[default]
    Cell,
    Table,
}

/// Per-run conversion settings passed into every emitter call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    pub class_id: u32,
    pub class_label: String,
    pub target: Target,
    pub format: Format,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            class_id: 0,
            class_label: "cell".to_string(),
            target: Target::Cell,
            format: Format::Polygon,
        }
    }
}

impl ConversionConfig {
    /// COCO category ids are 1-based
    pub fn category_id(&self) -> u32 {
        self.class_id.saturating_add(1)
    }
}

// Validate that the size is between 0.0 and 1.0
fn validate_size(s: &str) -> Result<f32, String> {
    match f32::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("SIZE must be between 0.0 and 1.0".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_size() {
        assert!(validate_size("0.5").is_ok());
        assert!(validate_size("1.0").is_ok());
        assert!(validate_size("0.0").is_ok());
        assert!(validate_size("-0.1").is_err());
        assert!(validate_size("1.1").is_err());
        assert!(validate_size("abc").is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["icdar2yolo", "-d", "TRACKB1"]);
        assert_eq!(args.val_size, 0.2);
        assert_eq!(args.test_size, 0.0);
        assert_eq!(args.seed, 42);
        assert_eq!(args.output_format, Format::Polygon);
        assert_eq!(args.labels_dir(), PathBuf::from("TRACKB1"));
        assert_eq!(args.output_dir(), PathBuf::from("TRACKB1"));
        assert!(!args.strict);
        assert_eq!(args.to_conversion_config(), ConversionConfig::default());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "icdar2yolo",
            "-d",
            "images",
            "--labels_dir",
            "gt",
            "-o",
            "out",
            "--format",
            "bbox",
            "--target",
            "table",
            "--class_id",
            "2",
            "--class_label",
            "table",
        ]);
        let config = args.to_conversion_config();
        assert_eq!(args.labels_dir(), PathBuf::from("gt"));
        assert_eq!(args.output_dir(), PathBuf::from("out"));
        assert_eq!(config.format, Format::Bbox);
        assert_eq!(config.target, Target::Table);
        assert_eq!(config.class_id, 2);
        assert_eq!(config.category_id(), 3);
        assert_eq!(config.format.task(), "detect");
    }

    #[test]
    fn test_class_id_range() {
        let max = (u32::MAX - 1).to_string();
        let args = Args::parse_from(["icdar2yolo", "-d", "gt", "--class_id", max.as_str()]);
        assert_eq!(args.to_conversion_config().category_id(), u32::MAX);

        for bad in ["4294967295", "4294967296", "-1"] {
            assert!(
                Args::try_parse_from(["icdar2yolo", "-d", "gt", "--class_id", bad]).is_err(),
                "{bad}"
            );
        }
    }
}
