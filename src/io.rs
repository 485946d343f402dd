use glob::{glob_with, MatchOptions, Pattern};
use log::warn;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{Args, ConversionConfig};
use crate::error::{ConvertError, Result};
use crate::types::{OutputDirs, Pair, IMG_FORMATS, LABEL_FORMATS};
use crate::utils::create_output_directory;

/// Find the files directly inside `dir` whose extension is in `extensions`.
///
/// Extensions match case-insensitively. With `sort` the result is ordered by
/// path, which makes pairing and splitting reproducible.
pub fn find_files(dir: &Path, extensions: &[&str], sort: bool) -> Vec<PathBuf> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let escaped_dir = Pattern::escape(&dir.to_string_lossy());

    let mut files: Vec<PathBuf> = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/*.{}", escaped_dir, Pattern::escape(ext));
        match glob_with(&pattern, options) {
            Ok(paths) => files.extend(
                paths
                    .filter_map(|entry| entry.ok())
                    .filter(|path| path.is_file()),
            ),
            Err(e) => warn!("Invalid glob pattern {}: {}", pattern, e),
        }
    }

    if sort {
        files.sort();
        files.dedup();
    } else {
        let mut seen = HashSet::new();
        files.retain(|path| seen.insert(path.clone()));
    }
    files
}

fn base_name(path: &Path) -> Option<&std::ffi::OsStr> {
    path.file_stem()
}

/// Pair every image with each label sharing its base name (case-sensitive).
///
/// Files without a partner are dropped. The output follows the image order.
pub fn associate_pairs(images: &[PathBuf], labels: &[PathBuf]) -> Vec<Pair> {
    images
        .iter()
        .flat_map(|image| {
            let stem = base_name(image);
            labels
                .iter()
                .filter(move |label| stem.is_some() && base_name(label) == stem)
                .map(move |label| Pair::new(image, label))
        })
        .collect()
}

/// Files from either side that have no partner on the other side
pub fn unmatched_files(images: &[PathBuf], labels: &[PathBuf]) -> Vec<PathBuf> {
    let image_stems: HashSet<_> = images.iter().filter_map(|p| base_name(p)).collect();
    let label_stems: HashSet<_> = labels.iter().filter_map(|p| base_name(p)).collect();

    let lonely_images = images
        .iter()
        .filter(|p| base_name(p).map_or(true, |stem| !label_stems.contains(stem)));
    let lonely_labels = labels
        .iter()
        .filter(|p| base_name(p).map_or(true, |stem| !image_stems.contains(stem)));

    lonely_images.chain(lonely_labels).cloned().collect()
}

/// Discover images and XML files and pair them.
///
/// In strict mode the first unmatched file is returned as an error; otherwise
/// unmatched files are only reported through the log.
pub fn collect_pairs(images_dir: &Path, labels_dir: &Path, strict: bool) -> Result<Vec<Pair>> {
    let images = find_files(images_dir, IMG_FORMATS, true);
    let labels = find_files(labels_dir, LABEL_FORMATS, true);
    log::info!("Found {} images and {} XML files.", images.len(), labels.len());

    let unmatched = unmatched_files(&images, &labels);
    if let Some(first) = unmatched.first() {
        if strict {
            return Err(ConvertError::UnmatchedPair {
                path: first.clone(),
            });
        }
        warn!(
            "{} files have no image/XML partner and will be skipped",
            unmatched.len()
        );
        for path in &unmatched {
            log::debug!("Unmatched file: {}", path.display());
        }
    }

    Ok(associate_pairs(&images, &labels))
}

/// Set up the directory structure for YOLO dataset output
pub fn setup_output_directories(args: &Args, output_dir: &Path) -> std::io::Result<OutputDirs> {
    let root = output_dir.join("YOLODataset");
    let labels_dir = create_output_directory(&root.join("labels"))?;
    let images_dir = create_output_directory(&root.join("images"))?;

    let train_labels_dir = create_output_directory(&labels_dir.join("train"))?;
    let val_labels_dir = create_output_directory(&labels_dir.join("val"))?;
    let train_images_dir = create_output_directory(&images_dir.join("train"))?;
    let val_images_dir = create_output_directory(&images_dir.join("val"))?;

    let (test_labels_dir, test_images_dir) = if args.test_size > 0.0 {
        (
            Some(create_output_directory(&labels_dir.join("test"))?),
            Some(create_output_directory(&images_dir.join("test"))?),
        )
    } else {
        (None, None)
    };

    Ok(OutputDirs {
        root,
        train_labels_dir,
        val_labels_dir,
        train_images_dir,
        val_images_dir,
        test_labels_dir,
        test_images_dir,
    })
}

/// Create the dataset.yaml file for YOLO training
pub fn create_dataset_yaml(
    dataset_root: &Path,
    has_test_split: bool,
    config: &ConversionConfig,
) -> std::io::Result<PathBuf> {
    let dataset_yaml_path = dataset_root.join("dataset.yaml");
    let mut dataset_yaml = BufWriter::new(File::create(&dataset_yaml_path)?);
    let absolute_path = fs::canonicalize(dataset_root)?;
    let mut yaml_content = format!(
        "path: {}\ntrain: images/train\nval: images/val\n",
        absolute_path.to_string_lossy()
    );
    if has_test_split {
        yaml_content.push_str("test: images/test\n");
    } else {
        yaml_content.push_str("test:\n");
    }
    yaml_content.push_str(&format!("task: {}\n", config.format.task()));
    yaml_content.push_str("\nnames:\n");
    yaml_content.push_str(&format!("    {}: {}\n", config.class_id, config.class_label));

    dataset_yaml.write_all(yaml_content.as_bytes())?;
    dataset_yaml.flush()?;
    Ok(dataset_yaml_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_associate_pairs_by_base_name() {
        let pairs = associate_pairs(&paths(&["a.jpg", "b.png"]), &paths(&["a.xml", "c.xml"]));
        assert_eq!(pairs, vec![Pair::new("a.jpg", "a.xml")]);
    }

    #[test]
    fn test_associate_pairs_ignores_directories() {
        let pairs = associate_pairs(
            &paths(&["images/page_1.TIFF"]),
            &paths(&["gt/page_1.xml", "gt/Page_1.xml"]),
        );
        assert_eq!(pairs, vec![Pair::new("images/page_1.TIFF", "gt/page_1.xml")]);
    }

    #[test]
    fn test_associate_pairs_one_to_many() {
        let pairs = associate_pairs(
            &paths(&["x/a.jpg", "x/b.jpg"]),
            &paths(&["y/a.xml", "z/a.xml", "y/b.xml"]),
        );
        assert_eq!(
            pairs,
            vec![
                Pair::new("x/a.jpg", "y/a.xml"),
                Pair::new("x/a.jpg", "z/a.xml"),
                Pair::new("x/b.jpg", "y/b.xml"),
            ]
        );
    }

    #[test]
    fn test_unmatched_files() {
        let unmatched = unmatched_files(&paths(&["a.jpg", "b.png"]), &paths(&["a.xml", "c.xml"]));
        assert_eq!(unmatched, paths(&["b.png", "c.xml"]));
    }

    #[test]
    fn test_find_files_is_case_insensitive_and_sorted() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["b.TIFF", "a.jpg", "c.xml", "d.txt"] {
            fs::write(temp.path().join(name), b"").unwrap();
        }
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/e.jpg"), b"").unwrap();

        let images = find_files(temp.path(), IMG_FORMATS, true);
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.TIFF"]);

        let labels = find_files(temp.path(), LABEL_FORMATS, true);
        assert_eq!(labels, vec![temp.path().join("c.xml")]);
    }

    #[test]
    fn test_collect_pairs_strict_mode() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.jpg"), b"").unwrap();
        fs::write(temp.path().join("a.xml"), b"").unwrap();
        fs::write(temp.path().join("b.xml"), b"").unwrap();

        let pairs = collect_pairs(temp.path(), temp.path(), false).unwrap();
        assert_eq!(pairs.len(), 1);

        let err = collect_pairs(temp.path(), temp.path(), true).unwrap_err();
        match err {
            ConvertError::UnmatchedPair { path } => assert_eq!(path, temp.path().join("b.xml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_dataset_yaml() {
        let temp = tempfile::tempdir().unwrap();
        let config = ConversionConfig::default();

        let path = create_dataset_yaml(temp.path(), true, &config).unwrap();
        let yaml_content = fs::read_to_string(path).unwrap();

        assert!(yaml_content.contains("path:"));
        assert!(yaml_content.contains("train: images/train"));
        assert!(yaml_content.contains("val: images/val"));
        assert!(yaml_content.contains("test: images/test"));
        assert!(yaml_content.contains("task: segment"));
        assert!(yaml_content.contains("names:"));
        assert!(yaml_content.contains("0: cell"));
    }

    #[test]
    fn test_create_dataset_yaml_detect_without_test() {
        let temp = tempfile::tempdir().unwrap();
        let config = ConversionConfig {
            class_id: 1,
            class_label: "table".to_string(),
            format: Format::Bbox,
            ..ConversionConfig::default()
        };

        let path = create_dataset_yaml(temp.path(), false, &config).unwrap();
        let yaml_content = fs::read_to_string(path).unwrap();

        assert!(yaml_content.contains("test:\n"));
        assert!(yaml_content.contains("task: detect"));
        assert!(yaml_content.contains("1: table"));
    }
}
