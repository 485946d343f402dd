use log::info;

use crate::config::Args;
use crate::conversion::process_pairs_in_parallel;
use crate::dataset::split_pairs;
use crate::error::Result;
use crate::io::create_dataset_yaml;
use crate::types::{OutputDirs, Pair, ProcessingStats};
use crate::utils::create_progress_bar;

/// Main YOLO dataset processing pipeline
///
/// Splits the pairs, converts every split into `labels/<split>` and
/// `images/<split>`, then writes `dataset.yaml`. Failing pairs are logged and
/// counted in the returned statistics instead of stopping the run.
pub fn process_dataset(
    pairs: Vec<Pair>,
    output_dirs: &OutputDirs,
    args: &Args,
) -> Result<ProcessingStats> {
    info!("Converting {} image/XML pairs to YOLO.", pairs.len());
    let config = args.to_conversion_config();
    let split_data = split_pairs(pairs, args.val_size, args.test_size, args.seed);

    let mut splits = vec![
        (
            "Train",
            &split_data.train_pairs,
            &output_dirs.train_labels_dir,
            &output_dirs.train_images_dir,
        ),
        (
            "Val",
            &split_data.val_pairs,
            &output_dirs.val_labels_dir,
            &output_dirs.val_images_dir,
        ),
    ];
    // Process test split if available
    if let (Some(test_labels_dir), Some(test_images_dir)) =
        (&output_dirs.test_labels_dir, &output_dirs.test_images_dir)
    {
        splits.push(("Test", &split_data.test_pairs, test_labels_dir, test_images_dir));
    }

    let mut stats = ProcessingStats::new();
    for (label, pairs, labels_dir, images_dir) in splits {
        if pairs.is_empty() {
            continue;
        }
        let pb = create_progress_bar(pairs.len() as u64, label);
        let split_stats = process_pairs_in_parallel(pairs, labels_dir, images_dir, &config, &pb);
        pb.finish_with_message(format!("{} processing complete", label));
        stats.merge(&split_stats);
    }

    info!("Creating dataset.yaml file...");
    let has_test_split = output_dirs.test_labels_dir.is_some();
    let yaml_path = create_dataset_yaml(&output_dirs.root, has_test_split, &config)?;
    info!("Wrote {}", yaml_path.display());

    Ok(stats)
}
