use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use icdar2yolo::{collect_pairs, process_coco_dataset, setup_coco_output_directories, Args};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let input_dir = args.input_dir();
    if !input_dir.exists() {
        error!("The specified input_dir does not exist: {}", args.input_dir);
        return ExitCode::FAILURE;
    }

    info!("Starting ICDAR to COCO conversion process...");

    let pairs = match collect_pairs(&input_dir, &args.labels_dir(), args.strict) {
        Ok(pairs) => pairs,
        Err(e) => {
            error!("Failed to pair images with annotations: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match setup_coco_output_directories(&args, &args.output_dir()) {
        Ok(output_dirs) => match process_coco_dataset(pairs, &output_dirs, &args) {
            Ok(stats) => {
                stats.print_summary();
                info!("COCO conversion process completed.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to process dataset: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("Failed to set up output directories: {}", e);
            ExitCode::FAILURE
        }
    }
}
